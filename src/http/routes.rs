//! Axum router configuration

use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;

use super::handlers::{
    add_favorite, check_favorite, health_check, list_favorites, list_videos, reload_config,
    remove_favorite, scan_status, trigger_scan, version_check, video_info,
};
use super::middleware::{request_logger, require_auth};
use super::streams::{download_video, stream_video};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Players need to send Range and read back Content-Range from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            header::ACCEPT,
            header::RANGE,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::AUTHORIZATION,
        ])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
            header::CONTENT_DISPOSITION,
        ])
        .allow_private_network(true)
        .max_age(Duration::from_secs(3600));

    // Catalog, scan and favorites endpoints require a principal
    let gated = Router::new()
        .route("/api/videos", get(list_videos))
        .route("/api/scan", post(trigger_scan))
        .route("/api/scan-status", get(scan_status))
        .route("/api/video-info", get(video_info))
        .route("/api/config/reload", post(reload_config))
        .route("/api/favorites", get(list_favorites))
        .route("/api/favorite", post(add_favorite))
        .route("/api/favorite/{id}", delete(remove_favorite))
        .route("/api/favorite/check/{id}", get(check_favorite))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/metrics", get(metrics_handler))
        // Media
        .route("/api/stream/{id}", get(stream_video))
        .route("/api/download/{id}", get(download_video))
        .merge(gated)
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), request_logger))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_enabled {
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}
