//! # Error Types
//!
//! This module defines the error types used throughout labelstation.
//!
//! Every failure that can happen while printing is eventually folded into a
//! [`PrintError`], which pairs a stable [`ErrorKind`] tag (serialized as the
//! `error_type` field of a print result) with a human-readable message.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable classification of a print failure.
///
/// Serialized as snake_case so API callers can branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Base64 or image data could not be decoded
    ImagePrintError,
    /// Text could not be rendered
    TextPrintError,
    /// No document rasterizer is available
    PdfSupportMissing,
    /// The document has zero pages
    EmptyDocument,
    /// The document bytes could not be opened or a page failed to rasterize
    PdfProcessingError,
    /// The printer record cannot be turned into a connection
    PrinterConfigError,
    /// The driver reported a failure while encoding or sending
    DriverError,
    /// No compatible driver is installed for this model/transport
    DriverUnavailable,
    /// The driver family is known but its integration does not exist yet
    DriverNotImplemented,
    /// The send did not complete within the dispatch timeout
    PrintTimeout,
    /// At least one page of a document failed
    PartialDocumentPrintFailure,
    /// Font size, margin or dpi out of range
    InvalidOptions,
    /// Anything else caught at a job boundary
    UnclassifiedError,
}

impl ErrorKind {
    /// The tag as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ImagePrintError => "image_print_error",
            ErrorKind::TextPrintError => "text_print_error",
            ErrorKind::PdfSupportMissing => "pdf_support_missing",
            ErrorKind::EmptyDocument => "empty_document",
            ErrorKind::PdfProcessingError => "pdf_processing_error",
            ErrorKind::PrinterConfigError => "printer_config_error",
            ErrorKind::DriverError => "driver_error",
            ErrorKind::DriverUnavailable => "driver_unavailable",
            ErrorKind::DriverNotImplemented => "driver_not_implemented",
            ErrorKind::PrintTimeout => "print_timeout",
            ErrorKind::PartialDocumentPrintFailure => "partial_document_print_failure",
            ErrorKind::InvalidOptions => "invalid_options",
            ErrorKind::UnclassifiedError => "unclassified_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified print failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PrintError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PrintError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors raised while loading or saving the configuration store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid configuration JSON
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A printer record was rejected
    #[error("Invalid printer: {0}")]
    InvalidPrinter(String),
}

/// Errors raised by the HTTP server itself (bind, serve).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
