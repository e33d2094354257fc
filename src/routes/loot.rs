use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::SimError;
use crate::loot::{ItemId, LootCandidate};
use crate::report::Difficulty;
use crate::service::SharedService;

#[derive(Deserialize)]
pub struct LootParams {
    pub difficulty: Option<String>,
}

/// Who on the roster gains the most from `item_id`, best first.
pub async fn upgrade_candidates(
    State(service): State<SharedService>,
    Path(item_id): Path<ItemId>,
    Query(params): Query<LootParams>,
) -> Result<Json<Vec<LootCandidate>>, SimError> {
    let difficulty = params
        .difficulty
        .as_deref()
        .map(|d| {
            d.parse::<Difficulty>()
                .map_err(|reason| SimError::validation("difficulty", reason))
        })
        .transpose()?;

    Ok(Json(service.project_upgrade_candidates(item_id, difficulty)?))
}
