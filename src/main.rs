//! Video Library Server
//!
//! Scans configured directories for video files, gives every file a stable
//! content-derived identifier, and serves the files over HTTP with byte-range
//! support for seeking and resumable downloads.

mod auth;
mod catalog;
mod config;
mod config_file;
mod error;
mod favorites;
mod http;
mod identity;
#[cfg(test)]
mod integration;
mod metrics;
mod state;
mod stream;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::validate_roots;
use crate::config_file::{locate_config, ConfigFile};
use crate::error::{Result, ShelfError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "vidshelf";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = locate_config(std::env::args().nth(1))?;
    let config = ConfigFile::from_file(&config_path)?.into_server_config();

    // Initialize logging
    init_logging(&config.log_level, &config.log_format);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::info!(path = ?config_path, roots = config.roots.len(), "configuration loaded");

    validate_roots(&config.roots)?;
    for root in &config.roots {
        tracing::info!(root = %root.name, path = ?root.path, "library root");
    }

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), Some(config_path)));

    // Warm start from the snapshot, otherwise scan in the background
    if state.load_snapshot().await == 0 {
        let scanner = state.clone();
        tokio::spawn(async move {
            if let Err(e) = scanner.rescan().await {
                tracing::error!(error = %e, "initial scan failed");
            }
        });
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config.socket_addr().parse().map_err(|e| {
        ShelfError::Configuration(format!("invalid listen address {}: {}", config.socket_addr(), e))
    })?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Initialize logging with tracing
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}={},tower_http=info", APP_NAME, level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
    }
}
