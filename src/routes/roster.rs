use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::SimError;
use crate::report::Character;
use crate::service::SharedService;

#[derive(Deserialize)]
pub struct RosterRequest {
    pub name: String,
    pub realm: String,
}

pub async fn list_roster(
    State(service): State<SharedService>,
) -> Result<Json<Vec<Character>>, SimError> {
    Ok(Json(service.roster()?))
}

pub async fn add_character(
    State(service): State<SharedService>,
    Json(body): Json<RosterRequest>,
) -> Result<impl IntoResponse, SimError> {
    let character = Character::new(body.name, body.realm);
    let added = service.add_to_roster(&character)?;
    if added {
        info!("Added {} to the roster", character);
    }

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(serde_json::json!({
            "added": added,
            "character": character,
        })),
    ))
}

pub async fn remove_character(
    State(service): State<SharedService>,
    Path((realm, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, SimError> {
    let key = Character::new(name, realm).key();
    if service.remove_from_roster(&key)? {
        info!("Removed {}-{} from the roster", key.name, key.realm);
        Ok((StatusCode::OK, Json(serde_json::json!({ "removed": true }))))
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "removed": false })),
        ))
    }
}
