// ABOUTME: HTTP API for the Compass catalog
// ABOUTME: Assembles per-entity routers under /api against the shared DbState

pub mod auth;
pub mod categories;
pub mod pagination;
pub mod ratings;
pub mod response;
pub mod solutions;
pub mod system;
pub mod tags;
pub mod users;

pub use auth::{Actor, ACTOR_HEADER};
pub use pagination::PageQuery;
pub use response::{ApiError, ApiResult, ErrorBody, ListResponse};

use axum::Router;
use compass_storage::DbState;

/// Build the full application router
pub fn create_app(state: DbState) -> Router {
    Router::new()
        .nest("/api/solutions/", solutions::router())
        .nest("/api/categories/", categories::router())
        .nest("/api/tags/", tags::router())
        .nest("/api/ratings/", ratings::router())
        .nest("/api/users/", users::router())
        .merge(system_routes())
        .with_state(state)
}

fn system_routes() -> Router<DbState> {
    Router::new().nest("/api", system::router())
}
