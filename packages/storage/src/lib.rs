// ABOUTME: SQLite persistence layer for the Compass catalog
// ABOUTME: One storage struct per entity plus shared error taxonomy and pool state

use compass_core::ValidationError;
use thiserror::Error;

pub mod categories;
pub mod db;
pub mod ratings;
pub mod solutions;
pub mod tags;
pub mod users;

pub use categories::CategoryStorage;
pub use db::DbState;
pub use ratings::RatingStorage;
pub use solutions::{SolutionFilter, SolutionStorage};
pub use tags::TagStorage;
pub use users::UserStorage;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(ValidationError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Fail on the first validation error, if any
pub(crate) fn check_valid(errors: Vec<ValidationError>) -> StorageResult<()> {
    match errors.into_iter().next() {
        Some(error) => Err(StorageError::Validation(error)),
        None => Ok(()),
    }
}

/// Parse a sort parameter of the form `field` or `-field` against a
/// whitelist. Returns the field and whether the order is descending.
pub fn parse_sort<'a>(sort: &'a str, allowed: &[&str]) -> StorageResult<(&'a str, bool)> {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };

    if allowed.contains(&field) {
        Ok((field, descending))
    } else {
        Err(StorageError::Validation(ValidationError::new(
            "sort",
            format!(
                "Invalid sort field: {}. Valid fields are: {}",
                field,
                allowed.join(", ")
            ),
        )))
    }
}

pub(crate) fn order_clause(field: &str, descending: bool) -> String {
    format!(
        "ORDER BY {} {}",
        field,
        if descending { "DESC" } else { "ASC" }
    )
}
