//! JSON API for the browser front end.
//!
//! ```text
//! GET  /api/schema                    - artifacts and their declared parameters
//! POST /api/save_config               - store a parameter set, returns its id
//! POST /api/load_config               - fetch a stored parameter set by id
//! POST /api/generate_config_preview   - render one artifact
//! POST /api/download_configs_zip      - full bundle as application/zip
//! POST /api/setup_experiment          - disabled
//! POST /api/get_job_status            - disabled
//! ```
//!
//! Every failure is answered with `{"success": false, "error": ...}`.

mod handlers;
mod state;

pub use state::AppState;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tracing::info;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/schema", get(handlers::schema))
        .route("/api/save_config", post(handlers::save_config))
        .route("/api/load_config", post(handlers::load_config))
        .route(
            "/api/generate_config_preview",
            post(handlers::generate_config_preview),
        )
        .route(
            "/api/download_configs_zip",
            post(handlers::download_configs_zip),
        )
        .route("/api/setup_experiment", post(handlers::disabled))
        .route("/api/get_job_status", post(handlers::disabled))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, static_root = %state.layout.root.display(), "serving configuration API");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
