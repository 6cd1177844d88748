//! Stream and download endpoints
//!
//! Not behind the access gate: the identifier acts as a bearer capability.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Response,
};
use std::sync::Arc;

use crate::error::ShelfError;
use crate::metrics::Metrics;
use crate::state::AppState;
use crate::stream::{self, prepare, Delivery};

use super::handlers::HttpError;

fn observe(metrics: &Metrics, id: &str, err: ShelfError) -> HttpError {
    match &err {
        ShelfError::NotFound(_) | ShelfError::ConfigMissing(_) => metrics.record_not_found(),
        ShelfError::RangeNotSatisfiable { header, file_size } => {
            metrics.record_range_rejected();
            tracing::debug!(id = %id, range = %header, file_size, "range not satisfiable");
        }
        _ => tracing::error!(id = %id, error = %err, "failed to start stream"),
    }
    HttpError::from(err)
}

/// GET /api/stream/{id}
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let roots = state.roots();
    let target = prepare(&state.identity, &roots, &id)
        .await
        .map_err(|e| observe(&state.metrics, &id, e))?;

    // A header that is not valid text cannot be a byte range.
    let range = headers
        .get(header::RANGE)
        .map(|v| v.to_str().unwrap_or_default());

    let (delivery, response) = stream::stream(&target, range, &state.config.stream)
        .await
        .map_err(|e| observe(&state.metrics, &id, e))?;
    state.metrics.record_stream(delivery == Delivery::Partial);
    Ok(response)
}

/// GET /api/download/{id}
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let roots = state.roots();
    let target = prepare(&state.identity, &roots, &id)
        .await
        .map_err(|e| observe(&state.metrics, &id, e))?;

    let (_, response) = stream::download(&target, &state.config.stream)
        .await
        .map_err(|e| observe(&state.metrics, &id, e))?;
    state.metrics.record_download();
    tracing::info!(id = %id, file = %target.filename, "download started");
    Ok(response)
}
