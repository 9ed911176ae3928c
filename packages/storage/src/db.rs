// ABOUTME: Database connection management and storage initialization
// ABOUTME: Provides shared access to the SQLite pool and per-entity storage layers

use sqlx::sqlite::{SqlitePoolOptions, SqlitePool};
use sqlx::migrate::MigrateDatabase;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::categories::CategoryStorage;
use crate::ratings::RatingStorage;
use crate::solutions::SolutionStorage;
use crate::tags::TagStorage;
use crate::users::UserStorage;
use crate::StorageError;

/// Shared database state for API handlers
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub solution_storage: Arc<SolutionStorage>,
    pub category_storage: Arc<CategoryStorage>,
    pub tag_storage: Arc<TagStorage>,
    pub rating_storage: Arc<RatingStorage>,
    pub user_storage: Arc<UserStorage>,
}

impl DbState {
    /// Create new database state from a SQLite pool
    pub fn new(pool: SqlitePool) -> Self {
        let solution_storage = Arc::new(SolutionStorage::new(pool.clone()));
        let category_storage = Arc::new(CategoryStorage::new(pool.clone()));
        let tag_storage = Arc::new(TagStorage::new(pool.clone()));
        let rating_storage = Arc::new(RatingStorage::new(pool.clone()));
        let user_storage = Arc::new(UserStorage::new(pool.clone()));

        Self {
            pool,
            solution_storage,
            category_storage,
            tag_storage,
            rating_storage,
            user_storage,
        }
    }

    /// Initialize database state against a database file path
    pub async fn init(database_path: &Path) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = database_path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let database_url = format!("sqlite:{}", database_path.display());

        if !sqlx::Sqlite::database_exists(&database_url)
            .await
            .map_err(StorageError::Sqlx)?
        {
            debug!("Creating database at: {}", database_url);
            sqlx::Sqlite::create_database(&database_url)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        debug!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&database_url)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        info!("Database connection established");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StorageError::Migration)?;

        debug!("Database migrations completed");

        Ok(Self::new(pool))
    }

    /// Initialize state against an in-memory database, mainly for tests.
    ///
    /// The pool is capped at a single connection because every SQLite
    /// in-memory connection gets its own private database.
    pub async fn connect_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StorageError::Migration)?;

        Ok(Self::new(pool))
    }
}
