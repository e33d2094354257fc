use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::SimError;
use crate::service::SharedService;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub reports: i64,
    pub rostered: usize,
}

pub async fn health(State(service): State<SharedService>) -> Result<Json<HealthResponse>, SimError> {
    let reports = service.db().report_count()?;
    let rostered = service.roster()?.len();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        reports,
        rostered,
    }))
}
