// ABOUTME: HTTP handlers for tag endpoints
// ABOUTME: CRUD with the transactional rename cascade exposed through PUT

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use compass_core::{TagCreateInput, TagUpdateInput};
use compass_storage::DbState;

use crate::auth::Actor;
use crate::pagination::PageQuery;
use crate::response::{not_found, ApiResult, ListResponse};

pub fn router() -> Router<DbState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{name}", get(get_tag).put(update_tag).delete(delete_tag))
}

async fn create_tag(
    State(state): State<DbState>,
    actor: Actor,
    Json(input): Json<TagCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let tag = state.tag_storage.create(input, &actor.0).await?;
    info!("Created tag: {}", tag.name);
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn list_tags(
    State(state): State<DbState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (items, total) = state
        .tag_storage
        .list(page.skip(), page.limit(), page.sort("name"))
        .await?;

    Ok(Json(ListResponse {
        items,
        total,
        skip: page.skip(),
        limit: page.limit(),
    }))
}

async fn get_tag(
    State(state): State<DbState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_storage
        .get_by_name(&name)
        .await?
        .ok_or(not_found("Tag"))?;
    Ok(Json(tag))
}

async fn update_tag(
    State(state): State<DbState>,
    Path(name): Path<String>,
    actor: Actor,
    Json(input): Json<TagUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let tag = state.tag_storage.update_by_name(&name, input, &actor.0).await?;
    info!("Updated tag: {}", tag.name);
    Ok(Json(tag))
}

async fn delete_tag(
    State(state): State<DbState>,
    Path(name): Path<String>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    if !state.tag_storage.delete_by_name(&name).await? {
        return Err(not_found("Tag"));
    }
    info!("Deleted tag: {} (by {})", name, actor.0);
    Ok(StatusCode::NO_CONTENT)
}
