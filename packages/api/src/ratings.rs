// ABOUTME: HTTP handlers for rating endpoints
// ABOUTME: Per-user upsert, listings, and aggregate summaries

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use compass_core::RatingInput;
use compass_storage::DbState;

use crate::auth::Actor;
use crate::pagination::PageQuery;
use crate::response::{not_found, ApiResult, ListResponse};

pub fn router() -> Router<DbState> {
    Router::new()
        .route("/", get(list_ratings))
        .route(
            "/solution/{slug}",
            get(list_solution_ratings).put(rate_solution),
        )
        .route(
            "/solution/{slug}/me",
            get(get_my_rating).delete(delete_my_rating),
        )
        .route("/solution/{slug}/summary", get(get_rating_summary))
}

async fn list_ratings(
    State(state): State<DbState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (items, total) = state
        .rating_storage
        .list(page.skip(), page.limit(), page.sort("-created_at"))
        .await?;

    Ok(Json(ListResponse {
        items,
        total,
        skip: page.skip(),
        limit: page.limit(),
    }))
}

async fn list_solution_ratings(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ratings = state.rating_storage.list_for_solution(&slug).await?;
    Ok(Json(ratings))
}

async fn rate_solution(
    State(state): State<DbState>,
    Path(slug): Path<String>,
    actor: Actor,
    Json(input): Json<RatingInput>,
) -> ApiResult<impl IntoResponse> {
    let rating = state.rating_storage.upsert(&slug, &actor.0, input).await?;
    info!("Rated solution {} ({}) by {}", slug, rating.score, actor.0);
    Ok((StatusCode::CREATED, Json(rating)))
}

async fn get_my_rating(
    State(state): State<DbState>,
    Path(slug): Path<String>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    let rating = state
        .rating_storage
        .get(&slug, &actor.0)
        .await?
        .ok_or(not_found("Rating"))?;
    Ok(Json(rating))
}

async fn delete_my_rating(
    State(state): State<DbState>,
    Path(slug): Path<String>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    if !state.rating_storage.delete(&slug, &actor.0).await? {
        return Err(not_found("Rating"));
    }
    info!("Deleted rating of {} by {}", slug, actor.0);
    Ok(StatusCode::NO_CONTENT)
}

async fn get_rating_summary(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .solution_storage
        .get_by_slug(&slug)
        .await?
        .ok_or(not_found("Solution"))?;

    let summary = state.rating_storage.summary(&slug).await?;
    Ok(Json(summary))
}
