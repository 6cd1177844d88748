//! HTTP middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::credential_from;
use crate::state::AppState;

use super::handlers::HttpError;

/// Request logging middleware
pub async fn request_logger(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();
    state.metrics.record_request();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        info!(%method, %uri, status = status.as_u16(), ?duration, "request");
    } else {
        warn!(%method, %uri, status = status.as_u16(), ?duration, "request");
    }

    response
}

/// Reject requests the access gate does not accept. The principal is made
/// available to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let credential = credential_from(request.headers());
    let principal = state
        .gate
        .authorize(credential.as_deref())
        .filter(|p| state.gate.is_authorized(p));

    match principal {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => {
            tracing::debug!(uri = %request.uri(), "unauthorized request");
            HttpError::Unauthorized.into_response()
        }
    }
}
