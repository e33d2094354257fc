use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::SharedService;

pub fn build_router(service: SharedService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(crate::routes::health::health))
        // Reports
        .route(
            "/reports/ingest",
            post(crate::routes::reports::ingest_report),
        )
        .route("/reports", get(crate::routes::reports::list_reports))
        .route("/reports/{id}", get(crate::routes::reports::get_report))
        // Roster
        .route(
            "/roster",
            get(crate::routes::roster::list_roster).post(crate::routes::roster::add_character),
        )
        .route(
            "/roster/{realm}/{name}",
            delete(crate::routes::roster::remove_character),
        )
        // Loot
        .route(
            "/loot/{item_id}",
            get(crate::routes::loot::upgrade_candidates),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}
