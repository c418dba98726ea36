//! Print job handler.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::super::state::AppState;
use super::error_response;
use crate::error::{ErrorKind, PrintError};
use crate::job::{PrintOptions, PrintResult};

/// Request body for POST /api/print.
///
/// Exactly one payload is used; `text` wins over `image_base64`, which wins
/// over `pdf_base64`.
#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    #[serde(default)]
    pub printer_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub pdf_base64: Option<String>,
    #[serde(default)]
    pub options: PrintOptions,
}

/// The job result echoed with the printer it ran on.
#[derive(Debug, Serialize)]
pub struct PrintResponse {
    #[serde(flatten)]
    pub result: PrintResult,
    pub printer_id: String,
}

enum Payload {
    Text(String),
    Image(String),
    Document(String),
}

impl PrintRequest {
    fn take_payload(&mut self) -> Option<Payload> {
        if let Some(text) = self.text.take() {
            Some(Payload::Text(text))
        } else if let Some(image) = self.image_base64.take() {
            Some(Payload::Image(image))
        } else {
            self.pdf_base64.take().map(Payload::Document)
        }
    }
}

/// POST /api/print - Render and print one label (or one per document page).
pub async fn print(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PrintRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PrintResponse>), (StatusCode, Json<Value>)> {
    let Json(mut req) = body.map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e.body_text()))
    })?;

    let printer_id = req
        .printer_id
        .take()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "printer_id is required"))?;

    let printer = state
        .store
        .get_printer(&printer_id)
        .cloned()
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Printer {} not found", printer_id)))?;

    let payload = req.take_payload().ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Either text, image_base64 or pdf_base64 is required",
        )
    })?;

    let options = req.options;
    options
        .validate()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?;

    // Printers cannot interleave raster streams: one job per device at a time.
    let lock = state.printer_lock(&printer.connection());
    let _guard = lock.lock().await;

    info!(printer_id = %printer.id, model = %printer.model, "print job accepted");

    let service = state.service.clone();
    let joined = tokio::task::spawn_blocking(move || match payload {
        Payload::Text(text) => service.print_text(&printer, &text, &options),
        Payload::Image(image) => service.print_image(&printer, &image, &options),
        Payload::Document(document) => service.print_document(&printer, &document, &options),
    })
    .await;

    let result = joined.unwrap_or_else(|e| {
        error!(error = %e, "print task failed");
        PrintResult::failed(PrintError::new(
            ErrorKind::UnclassifiedError,
            format!("Print task failed: {}", e),
        ))
    });

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(PrintResponse { result, printer_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_precedence() {
        let mut req: PrintRequest = serde_json::from_str(
            r#"{"printer_id": "office", "text": "hi", "image_base64": "AAAA"}"#,
        )
        .unwrap();
        assert!(matches!(req.take_payload(), Some(Payload::Text(t)) if t == "hi"));

        let mut req: PrintRequest =
            serde_json::from_str(r#"{"printer_id": "office", "pdf_base64": "JVBER"}"#).unwrap();
        assert!(matches!(req.take_payload(), Some(Payload::Document(_))));

        let mut req: PrintRequest = serde_json::from_str(r#"{"printer_id": "office"}"#).unwrap();
        assert!(req.take_payload().is_none());
        assert_eq!(req.options, PrintOptions::default());
    }

    #[test]
    fn test_response_flattens_result() {
        let response = PrintResponse {
            result: PrintResult::succeeded("Print job sent successfully via brother_ql"),
            printer_id: "office".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["printer_id"], "office");
        assert_eq!(json["message"], "Print job sent successfully via brother_ql");
    }
}
