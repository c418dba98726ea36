//! HTTP handlers for the server.

pub mod print;
pub mod printers;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::state::AppState;
use crate::telemetry::StatsSnapshot;

/// `(status, {"error": message})`
pub fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

/// GET /health - Liveness check, no API key required.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "labelstation" }))
}

/// GET /api/discover - Network discovery is not built in; always empty.
pub async fn discover() -> Json<Value> {
    Json(json!({ "discovered": [] }))
}

/// GET /api/stats - Print counters since startup.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.telemetry.snapshot())
}

/// Fallback for unknown routes.
pub async fn not_found() -> (StatusCode, Json<Value>) {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found")
}
