use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SimError;
use crate::reference::ClassSpecPair;
use crate::report::{CanonicalSimulationReport, Character, Difficulty};
use crate::service::SharedService;

#[derive(Deserialize)]
pub struct IngestRequest {
    /// Full report URL or bare report id.
    pub reference: String,
}

/// List view of a stored report, without the raw payload or item lists.
#[derive(Serialize)]
pub struct ReportSummary {
    pub id: String,
    pub character: Character,
    pub specialization: ClassSpecPair,
    pub raid_difficulty: Difficulty,
    pub generated_at: DateTime<Utc>,
    pub upgrade_count: usize,
}

impl From<&CanonicalSimulationReport> for ReportSummary {
    fn from(report: &CanonicalSimulationReport) -> Self {
        ReportSummary {
            id: report.id.clone(),
            character: report.character.clone(),
            specialization: report.specialization,
            raid_difficulty: report.raid_difficulty,
            generated_at: report.generated_at,
            upgrade_count: report.upgrades.len(),
        }
    }
}

pub async fn ingest_report(
    State(service): State<SharedService>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<CanonicalSimulationReport>, SimError> {
    info!("Ingest requested for {}", body.reference);

    match service.ingest_report_from_reference(&body.reference).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!("Ingest of {} failed ({}): {}", body.reference, e.category(), e);
            Err(e)
        }
    }
}

pub async fn list_reports(
    State(service): State<SharedService>,
) -> Result<Json<Vec<ReportSummary>>, SimError> {
    let reports = service.latest_reports_for_roster()?;
    Ok(Json(reports.iter().map(ReportSummary::from).collect()))
}

pub async fn get_report(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> Result<Response, SimError> {
    match service.report(&id)? {
        Some(report) => Ok(Json(report).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("No report with id {}", id) })),
        )
            .into_response()),
    }
}
