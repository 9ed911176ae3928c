// ABOUTME: HTTP handlers for category endpoints
// ABOUTME: CRUD with the rename cascade exposed through PUT

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use compass_core::{CategoryCreateInput, CategoryUpdateInput};
use compass_storage::DbState;

use crate::auth::Actor;
use crate::pagination::PageQuery;
use crate::response::{not_found, ApiResult, ListResponse};

pub fn router() -> Router<DbState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{name}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn create_category(
    State(state): State<DbState>,
    actor: Actor,
    Json(input): Json<CategoryCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let category = state.category_storage.create(input, &actor.0).await?;
    info!("Created category: {}", category.name);
    Ok((StatusCode::CREATED, Json(category)))
}

async fn list_categories(
    State(state): State<DbState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (items, total) = state
        .category_storage
        .list(page.skip(), page.limit(), page.sort("name"))
        .await?;

    Ok(Json(ListResponse {
        items,
        total,
        skip: page.skip(),
        limit: page.limit(),
    }))
}

async fn get_category(
    State(state): State<DbState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let category = state
        .category_storage
        .get_by_name(&name)
        .await?
        .ok_or(not_found("Category"))?;
    Ok(Json(category))
}

async fn update_category(
    State(state): State<DbState>,
    Path(name): Path<String>,
    actor: Actor,
    Json(input): Json<CategoryUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let category = state
        .category_storage
        .update_by_name(&name, input, &actor.0)
        .await?;
    info!("Updated category: {}", category.name);
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<DbState>,
    Path(name): Path<String>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    if !state.category_storage.delete_by_name(&name).await? {
        return Err(not_found("Category"));
    }
    info!("Deleted category: {} (by {})", name, actor.0);
    Ok(StatusCode::NO_CONTENT)
}
