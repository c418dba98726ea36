//! Request middleware: API-key check and request telemetry.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use super::handlers::error_response;
use super::state::AppState;
use crate::telemetry::Telemetry;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests without a known `X-API-Key` header.
pub async fn require_api_key(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if key.is_empty() {
        return error_response(StatusCode::UNAUTHORIZED, "API key is missing").into_response();
    }
    if !state.store.validate_api_key(key) {
        warn!(path = %request.uri().path(), "rejected invalid API key");
        return error_response(StatusCode::FORBIDDEN, "Invalid API key").into_response();
    }
    next.run(request).await
}

/// Count every request and its final status.
pub async fn track_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let endpoint = request.uri().path().to_string();
    let method = request.method().to_string();
    let response = next.run(request).await;
    state
        .telemetry
        .record_api_request(&endpoint, &method, response.status().as_u16());
    response
}
