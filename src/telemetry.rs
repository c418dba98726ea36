//! # Telemetry
//!
//! The print pipeline reports timings and outcomes through the narrow
//! [`Telemetry`] trait. Recording is fire-and-forget: every method takes
//! `&self`, returns nothing and must not block.
//!
//! [`TracingTelemetry`] turns each observation into a `tracing` event on the
//! `labelstation::telemetry` target and keeps a handful of atomic counters
//! that the server exposes on `/api/stats`.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

use crate::error::ErrorKind;

/// What kind of payload a job printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Text,
    Image,
    Document,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Text => "text",
            LabelKind::Image => "image",
            LabelKind::Document => "document",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the printer a job targets, as telemetry sees it.
#[derive(Debug, Clone, Copy)]
pub struct PrinterTag<'a> {
    pub printer_id: &'a str,
    pub model: &'a str,
}

/// Observation sink for the print pipeline.
pub trait Telemetry: Send + Sync {
    fn record_print_attempt(&self, printer: PrinterTag<'_>, kind: LabelKind);

    fn record_print_success(&self, printer: PrinterTag<'_>, kind: LabelKind, duration: Duration);

    fn record_print_failure(
        &self,
        printer: PrinterTag<'_>,
        kind: LabelKind,
        error: ErrorKind,
        duration: Duration,
    );

    /// Time spent rendering + transforming one unit.
    fn record_image_generation(&self, kind: LabelKind, duration: Duration);

    /// Time spent inside one driver send.
    fn record_printer_response(&self, printer: PrinterTag<'_>, duration: Duration);

    fn record_api_request(&self, endpoint: &str, method: &str, status: u16);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record_print_attempt(&self, _: PrinterTag<'_>, _: LabelKind) {}
    fn record_print_success(&self, _: PrinterTag<'_>, _: LabelKind, _: Duration) {}
    fn record_print_failure(&self, _: PrinterTag<'_>, _: LabelKind, _: ErrorKind, _: Duration) {}
    fn record_image_generation(&self, _: LabelKind, _: Duration) {}
    fn record_printer_response(&self, _: PrinterTag<'_>, _: Duration) {}
    fn record_api_request(&self, _: &str, _: &str, _: u16) {}
}

/// Point-in-time counter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub api_requests: u64,
    pub prints_total: u64,
    pub prints_success: u64,
    pub prints_failed: u64,
    pub labels_sent: u64,
}

/// Logs every observation and counts outcomes.
#[derive(Debug, Default)]
pub struct TracingTelemetry {
    api_requests: AtomicU64,
    prints_total: AtomicU64,
    prints_success: AtomicU64,
    prints_failed: AtomicU64,
    labels_sent: AtomicU64,
}

impl TracingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            api_requests: self.api_requests.load(Ordering::Relaxed),
            prints_total: self.prints_total.load(Ordering::Relaxed),
            prints_success: self.prints_success.load(Ordering::Relaxed),
            prints_failed: self.prints_failed.load(Ordering::Relaxed),
            labels_sent: self.labels_sent.load(Ordering::Relaxed),
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl Telemetry for TracingTelemetry {
    fn record_print_attempt(&self, printer: PrinterTag<'_>, kind: LabelKind) {
        self.prints_total.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "labelstation::telemetry",
            printer_id = printer.printer_id,
            printer_model = printer.model,
            label_type = %kind,
            "print attempt"
        );
    }

    fn record_print_success(&self, printer: PrinterTag<'_>, kind: LabelKind, duration: Duration) {
        self.prints_success.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "labelstation::telemetry",
            printer_id = printer.printer_id,
            printer_model = printer.model,
            label_type = %kind,
            duration_ms = millis(duration),
            "print success"
        );
    }

    fn record_print_failure(
        &self,
        printer: PrinterTag<'_>,
        kind: LabelKind,
        error: ErrorKind,
        duration: Duration,
    ) {
        self.prints_failed.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "labelstation::telemetry",
            printer_id = printer.printer_id,
            printer_model = printer.model,
            label_type = %kind,
            error_type = %error,
            duration_ms = millis(duration),
            "print failure"
        );
    }

    fn record_image_generation(&self, kind: LabelKind, duration: Duration) {
        info!(
            target: "labelstation::telemetry",
            label_type = %kind,
            duration_ms = millis(duration),
            "image generated"
        );
    }

    fn record_printer_response(&self, printer: PrinterTag<'_>, duration: Duration) {
        self.labels_sent.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "labelstation::telemetry",
            printer_id = printer.printer_id,
            printer_model = printer.model,
            duration_ms = millis(duration),
            "printer response"
        );
    }

    fn record_api_request(&self, endpoint: &str, method: &str, status: u16) {
        self.api_requests.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "labelstation::telemetry",
            endpoint,
            method,
            status_code = status,
            "api request"
        );
    }
}
