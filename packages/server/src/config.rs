// ABOUTME: Server configuration from environment variables
// ABOUTME: Port, CORS origin, database path, and default admin credentials

use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 4170;

/// Runtime configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origin: Option<String>,
    pub database_path: PathBuf,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    /// Build configuration from the environment.
    /// `COMPASS_PORT` wins over `PORT`; both fall back to the default.
    pub fn from_env() -> Self {
        let port = env::var("COMPASS_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty());

        let database_path = env::var("COMPASS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/compass.db"));

        let admin_username =
            env::var("COMPASS_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            env::var("COMPASS_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        Self {
            port,
            cors_origin,
            database_path,
            admin_username,
            admin_password,
        }
    }
}
