// ABOUTME: Compass catalog API server entry point
// ABOUTME: Wires config, database, default admin, CORS, and the axum app

mod config;

use anyhow::Context;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use compass_storage::DbState;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let state = DbState::init(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    state
        .user_storage
        .ensure_default_admin(&config.admin_username, &config.admin_password)
        .await
        .context("Failed to bootstrap admin user")?;

    let cors = match config.cors_origin {
        Some(ref origin) => {
            let origin: HeaderValue = origin
                .parse()
                .with_context(|| format!("Invalid CORS_ORIGIN: {}", origin))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => {
            warn!("CORS_ORIGIN not set, allowing any origin");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let app = compass_api::create_app(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Compass API listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
