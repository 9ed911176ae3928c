// ABOUTME: HTTP handlers for the tech radar and health endpoints
// ABOUTME: Read-only views built from the catalog as a whole

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use compass_storage::DbState;

use crate::response::ApiResult;

pub fn router() -> Router<DbState> {
    Router::new()
        .route("/radar", get(get_radar))
        .route("/health", get(health))
}

async fn get_radar(State(state): State<DbState>) -> ApiResult<impl IntoResponse> {
    let radar = state.solution_storage.tech_radar().await?;
    Ok(Json(radar))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
