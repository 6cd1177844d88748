//! HTTP request handlers
//!
//! JSON endpoints for the catalog, scans, identifier lookup and favorites.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::auth::Principal;
use crate::catalog::format_size;
use crate::error::ShelfError;
use crate::favorites::Favorite;
use crate::state::AppState;
use crate::stream::{prepare, TargetInfo};

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    NotFound(String),
    RangeNotSatisfiable { file_size: u64 },
    BadRequest(String),
    Unauthorized,
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            HttpError::RangeNotSatisfiable { .. } => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                "Requested range not satisfiable".to_string(),
            ),
            HttpError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            HttpError::InternalError(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let HttpError::RangeNotSatisfiable { file_size } = self {
            if let Ok(value) = HeaderValue::try_from(format!("bytes */{}", file_size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

impl From<ShelfError> for HttpError {
    fn from(err: ShelfError) -> Self {
        match err {
            ShelfError::NotFound(_) => HttpError::NotFound("Video not found".to_string()),
            ShelfError::ConfigMissing(root) => {
                HttpError::NotFound(format!("Root is no longer configured: {}", root))
            }
            ShelfError::RangeNotSatisfiable { file_size, .. } => {
                HttpError::RangeNotSatisfiable { file_size }
            }
            ShelfError::Configuration(m) => HttpError::BadRequest(m),
            _ => HttpError::InternalError(err.to_string()),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Version information endpoint
pub async fn version_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// One row of the catalog listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRow {
    pub id: String,
    pub name: String,
    pub relative_path: String,
    pub root_name: String,
    pub size_bytes: u64,
    pub size: String,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoList {
    pub videos: Vec<VideoRow>,
    pub video_count: usize,
    pub dir_count: usize,
}

/// GET /api/videos
pub async fn list_videos(State(state): State<Arc<AppState>>) -> Json<VideoList> {
    let catalog = state.catalog.snapshot();
    let videos = catalog
        .videos
        .iter()
        .map(|v| VideoRow {
            id: state.identity.identity_for(&v.root_name, &v.relative_path),
            name: v.name.clone(),
            relative_path: v.relative_path.clone(),
            root_name: v.root_name.clone(),
            size_bytes: v.size_bytes,
            size: format_size(v.size_bytes),
            modified_at: v.modified_at,
        })
        .collect();

    Json(VideoList {
        videos,
        video_count: catalog.len(),
        dir_count: catalog.root_count(),
    })
}

/// POST /api/scan
pub async fn trigger_scan(State(state): State<Arc<AppState>>) -> Response {
    match state.rescan().await {
        Ok(outcome) => Json(json!({
            "success": true,
            "count": outcome.count,
            "started": outcome.started,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "scan failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /api/scan-status
pub async fn scan_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.status())
}

#[derive(Debug, Deserialize)]
pub struct VideoInfoQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoInfo {
    pub id: String,
    #[serde(flatten)]
    pub target: TargetInfo,
}

/// GET /api/video-info?id=
pub async fn video_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoInfoQuery>,
) -> Result<Json<VideoInfo>, HttpError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| HttpError::BadRequest("Missing id parameter".to_string()))?;

    let roots = state.roots();
    let target = prepare(&state.identity, &roots, &id).await.map_err(|e| {
        state.metrics.record_not_found();
        HttpError::from(e)
    })?;

    Ok(Json(VideoInfo {
        target: TargetInfo::from(&target),
        id,
    }))
}

/// POST /api/config/reload
pub async fn reload_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let roots = state.reload_roots().map_err(|e| {
        tracing::warn!(error = %e, "configuration reload rejected");
        HttpError::from(e)
    })?;
    let names: Vec<&str> = roots.iter().map(|r| r.name.as_str()).collect();
    Ok(Json(json!({ "success": true, "roots": names })))
}

/// GET /api/favorites
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Json<serde_json::Value> {
    let favorites: Vec<Favorite> = state.favorites.list(&principal.user);
    Json(json!({ "favorites": favorites }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub root_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// POST /api/favorite
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<AddFavoriteRequest>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let video_id = body
        .video_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| HttpError::BadRequest("Missing videoId".to_string()))?;

    let added = state
        .favorites
        .add(&principal.user, &video_id, body.root_name, body.filename)
        .await?;
    Ok(Json(json!({ "success": added })))
}

/// DELETE /api/favorite/{id}
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let removed = state.favorites.remove(&principal.user, &video_id).await?;
    Ok(Json(json!({ "success": removed })))
}

/// GET /api/favorite/check/{id}
pub async fn check_favorite(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
) -> Json<serde_json::Value> {
    Json(json!({ "isFavorite": state.favorites.is_favorite(&principal.user, &video_id) }))
}
