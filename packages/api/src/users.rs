// ABOUTME: HTTP handlers for user account endpoints
// ABOUTME: CRUD plus the verified password change flow

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use tracing::info;

use compass_core::{PasswordUpdateInput, User, UserCreateInput, UserUpdateInput};
use compass_storage::DbState;

use crate::auth::Actor;
use crate::pagination::PageQuery;
use crate::response::{not_found, ApiResult, ListResponse};

pub fn router() -> Router<DbState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{username}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{username}/password", put(change_password))
}

async fn create_user(
    State(state): State<DbState>,
    actor: Actor,
    Json(input): Json<UserCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let user = state.user_storage.create(input, &actor.0).await?;
    info!("Created user: {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    State(state): State<DbState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (items, total) = state
        .user_storage
        .list(page.skip(), page.limit(), page.sort("username"))
        .await?;

    Ok(Json(ListResponse {
        items,
        total,
        skip: page.skip(),
        limit: page.limit(),
    }))
}

async fn get_user(
    State(state): State<DbState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .user_storage
        .get_by_username(&username)
        .await?
        .ok_or(not_found("User"))?;
    Ok(Json(User::from(record)))
}

async fn update_user(
    State(state): State<DbState>,
    Path(username): Path<String>,
    actor: Actor,
    Json(input): Json<UserUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_storage
        .update_by_username(&username, input, &actor.0)
        .await?;
    info!("Updated user: {}", user.username);
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<DbState>,
    Path(username): Path<String>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    if !state.user_storage.delete_by_username(&username).await? {
        return Err(not_found("User"));
    }
    info!("Deleted user: {} (by {})", username, actor.0);
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(state): State<DbState>,
    Path(username): Path<String>,
    _actor: Actor,
    Json(input): Json<PasswordUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    state
        .user_storage
        .change_password(&username, &input.current_password, &input.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
