// ABOUTME: Actor identity extraction for mutating endpoints
// ABOUTME: Reads the x-compass-actor header; absence rejects with 401

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::response::ApiError;

/// Header carrying the acting user's username
pub const ACTOR_HEADER: &str = "x-compass-actor";

/// The authenticated actor behind a mutating request.
///
/// Session handling lives outside this service; handlers only need the
/// username for audit fields, taken from the `x-compass-actor` header.
#[derive(Debug, Clone)]
pub struct Actor(pub String);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Actor(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
