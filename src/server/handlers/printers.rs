//! Printer listing handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::super::state::AppState;
use super::error_response;

/// GET /api/printers - All configured printers.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "printers": state.store.printers() }))
}

/// GET /api/printers/:id - One printer, by id or display name.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let printer = state
        .store
        .get_printer(&id)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Printer not found"))?;
    Ok(Json(json!({ "printer": printer })))
}
