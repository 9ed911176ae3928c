// ABOUTME: API error mapping and shared response envelopes
// ABOUTME: Converts storage errors to status codes with a {"detail": ...} body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use compass_storage::StorageError;

/// Error payload shape shared by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Paginated list envelope
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// API-level error, convertible from any storage error
#[derive(Debug)]
pub enum ApiError {
    Storage(StorageError),
    Unauthorized,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing actor identity".to_string(),
            ),
            ApiError::Storage(err) => match err {
                StorageError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                StorageError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                other => {
                    // Persistence details stay server-side
                    error!("Storage error: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// 404 helper for lookups that return Option
pub fn not_found(entity: &'static str) -> ApiError {
    ApiError::Storage(StorageError::NotFound(entity))
}

/// 400 helper for request-level validation failures
pub fn bad_request(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::Storage(StorageError::Validation(
        compass_core::ValidationError::new(field, message),
    ))
}
