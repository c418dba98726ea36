//! # Job Orchestrator
//!
//! [`PrintService`] drives one print job from payload to [`PrintResult`]:
//!
//! ```text
//! text / image      render -> transform -> dispatch            (one unit)
//! document          open -> for each page in order:
//!                       rasterize -> transform -> dispatch     (one unit per page)
//! ```
//!
//! Every unit runs inside its own failure scope. A panic or error in one page
//! is recorded against that page and the next page still runs. Nothing
//! escapes a job as an unhandled fault; the caller always gets a
//! well-formed result.
//!
//! Jobs are blocking. Run them on a blocking thread when calling from async
//! code, and serialize jobs per printer: a device cannot interleave two
//! raster streams.

pub mod options;
pub mod result;

pub use options::PrintOptions;
pub use result::{DocumentTally, PageResult, PrintResult};

use image::{DynamicImage, RgbImage};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::dispatch::{Delivery, Dispatcher};
use crate::driver::SendRequest;
use crate::error::{ErrorKind, PrintError};
use crate::printer::PrinterRecord;
use crate::render::{self, DocumentRasterizer};
use crate::telemetry::{LabelKind, NoopTelemetry, PrinterTag, Telemetry};
use crate::transform;

/// Runs print jobs against configured printers.
pub struct PrintService {
    dispatcher: Dispatcher,
    rasterizer: Option<Arc<dyn DocumentRasterizer>>,
    telemetry: Arc<dyn Telemetry>,
}

impl PrintService {
    /// A service without document support that discards telemetry.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            rasterizer: None,
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn DocumentRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn rasterizer(&self) -> Option<&Arc<dyn DocumentRasterizer>> {
        self.rasterizer.as_ref()
    }

    /// Print a text label.
    ///
    /// The margin is applied by the text renderer, so the transform stage
    /// only rotates and binarizes.
    pub fn print_text(&self, printer: &PrinterRecord, text: &str, options: &PrintOptions) -> PrintResult {
        self.run_job(printer, LabelKind::Text, options, || {
            let outcome = isolate(|| {
                self.print_unit(printer, LabelKind::Text, options, 0, || {
                    render::text::render_text(text, options.font_size_px(), options.margin_px()).map_err(|e| {
                        PrintError::new(ErrorKind::TextPrintError, format!("Failed to print text: {}", e))
                    })
                })
            });
            PrintResult::from_unit(outcome)
        })
    }

    /// Print a base64-encoded image.
    pub fn print_image(&self, printer: &PrinterRecord, image_base64: &str, options: &PrintOptions) -> PrintResult {
        self.run_job(printer, LabelKind::Image, options, || {
            let outcome = isolate(|| {
                self.print_unit(printer, LabelKind::Image, options, options.margin_px(), || {
                    render::image::render_image(image_base64).map_err(|e| {
                        PrintError::new(ErrorKind::ImagePrintError, format!("Failed to print image: {}", e))
                    })
                })
            });
            PrintResult::from_unit(outcome)
        })
    }

    /// Print every page of a base64-encoded document, one label per page.
    pub fn print_document(
        &self,
        printer: &PrinterRecord,
        document_base64: &str,
        options: &PrintOptions,
    ) -> PrintResult {
        self.run_job(printer, LabelKind::Document, options, || {
            let Some(rasterizer) = &self.rasterizer else {
                return PrintResult::failed(PrintError::new(
                    ErrorKind::PdfSupportMissing,
                    "PDF support is not available: no document rasterizer is installed",
                ));
            };

            let bytes = match render::image::decode_base64(document_base64) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return PrintResult::failed(PrintError::new(
                        ErrorKind::PdfProcessingError,
                        format!("Failed to decode document: {}", e),
                    ));
                }
            };

            let opened = isolate(|| {
                let source = rasterizer.open(&bytes).map_err(|e| {
                    PrintError::new(ErrorKind::PdfProcessingError, format!("Failed to open document: {}", e))
                })?;
                let page_count = source.page_count();
                Ok((source, page_count))
            });
            let (source, page_count) = match opened {
                Ok(opened) => opened,
                Err(e) => return PrintResult::failed(e),
            };

            if page_count == 0 {
                warn!("document has no pages");
                return PrintResult::failed(PrintError::new(ErrorKind::EmptyDocument, "Document has no pages"));
            }
            info!(pages = page_count, rasterizer = rasterizer.name(), "document opened");

            let dpi = options.dpi_value();
            let mut tally = DocumentTally::new();
            for index in 0..page_count {
                let outcome = isolate(|| {
                    self.print_unit(printer, LabelKind::Document, options, options.margin_px(), || {
                        source.render_page(index, dpi).map_err(|e| {
                            PrintError::new(
                                ErrorKind::PdfProcessingError,
                                format!("Failed to render page {}: {}", index + 1, e),
                            )
                        })
                    })
                });
                match &outcome {
                    Ok(_) => info!(page = index + 1, pages = page_count, "page printed"),
                    Err(e) => warn!(page = index + 1, pages = page_count, error = %e, "page failed"),
                }
                tally.record(index, &outcome);
            }
            tally.finish()
        })
    }

    /// Shared job envelope: logging span, up-front checks, telemetry.
    fn run_job(
        &self,
        printer: &PrinterRecord,
        kind: LabelKind,
        options: &PrintOptions,
        body: impl FnOnce() -> PrintResult,
    ) -> PrintResult {
        let job_id = Uuid::new_v4();
        let span = info_span!(
            "print_job",
            %job_id,
            printer_id = %printer.id,
            model = %printer.model,
            kind = %kind
        );
        let _guard = span.enter();

        let tag = tag_of(printer);
        self.telemetry.record_print_attempt(tag, kind);
        let started = Instant::now();

        let result = match preflight(printer, options) {
            Ok(()) => body(),
            Err(e) => PrintResult::failed(e),
        };

        let elapsed = started.elapsed();
        if result.success {
            info!(elapsed_ms = elapsed.as_millis() as u64, "print job succeeded");
            self.telemetry.record_print_success(tag, kind, elapsed);
        } else {
            let error_type = result.error_type.unwrap_or(ErrorKind::UnclassifiedError);
            warn!(
                error_type = %error_type,
                error = result.error.as_deref().unwrap_or(""),
                "print job failed"
            );
            self.telemetry.record_print_failure(tag, kind, error_type, elapsed);
        }
        result
    }

    /// One physical label: render, transform, dispatch.
    fn print_unit(
        &self,
        printer: &PrinterRecord,
        kind: LabelKind,
        options: &PrintOptions,
        margin: u32,
        render: impl FnOnce() -> Result<RgbImage, PrintError>,
    ) -> Result<Delivery, PrintError> {
        let started = Instant::now();
        let canvas = render()?;
        let image = transform::apply(DynamicImage::ImageRgb8(canvas), options.rotation(), margin)
            .map_err(|e| PrintError::new(render_error_kind(kind), format!("Failed to print {}: {}", kind, e)))?;
        self.telemetry.record_image_generation(kind, started.elapsed());

        let request = SendRequest {
            image,
            model: printer.model.clone(),
            connection: printer.connection(),
            label_size: printer.label_size.clone(),
            cut: options.cut,
            rotation_applied: true,
        };

        let sent = Instant::now();
        let outcome = self.dispatcher.dispatch(request);
        self.telemetry.record_printer_response(tag_of(printer), sent.elapsed());
        outcome
    }
}

fn tag_of(printer: &PrinterRecord) -> PrinterTag<'_> {
    PrinterTag {
        printer_id: &printer.id,
        model: &printer.model,
    }
}

/// The error kind for a unit that could not be turned into a label.
fn render_error_kind(kind: LabelKind) -> ErrorKind {
    match kind {
        LabelKind::Text => ErrorKind::TextPrintError,
        LabelKind::Image => ErrorKind::ImagePrintError,
        LabelKind::Document => ErrorKind::PdfProcessingError,
    }
}

/// Checks that fail the whole job before any rendering.
fn preflight(printer: &PrinterRecord, options: &PrintOptions) -> Result<(), PrintError> {
    if printer.address.trim().is_empty() {
        return Err(PrintError::new(
            ErrorKind::PrinterConfigError,
            format!("Printer {} has no address configured", printer.id),
        ));
    }
    options
        .validate()
        .map_err(|e| PrintError::new(ErrorKind::InvalidOptions, e))
}

/// Run `unit`, converting a panic into an `unclassified_error`.
fn isolate<T>(unit: impl FnOnce() -> Result<T, PrintError>) -> Result<T, PrintError> {
    match panic::catch_unwind(AssertUnwindSafe(unit)) {
        Ok(result) => result,
        Err(payload) => Err(PrintError::new(ErrorKind::UnclassifiedError, panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DriverSet;
    use crate::driver::{DriverError, LabelDriver};
    use crate::driver::pt::PT_NOT_IMPLEMENTED;
    use crate::printer::ConnectionType;
    use crate::telemetry::TracingTelemetry;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingDriver {
        sizes: Mutex<Vec<(u32, u32)>>,
    }

    impl LabelDriver for CountingDriver {
        fn name(&self) -> &'static str {
            "brother_ql"
        }

        fn send(&self, request: &SendRequest) -> Result<(), DriverError> {
            self.sizes
                .lock()
                .unwrap()
                .push((request.image.width(), request.image.height()));
            Ok(())
        }
    }

    fn service_with(driver: Arc<CountingDriver>) -> PrintService {
        PrintService::new(Dispatcher::new(DriverSet::default().with_ql(driver), None))
    }

    fn printer() -> PrinterRecord {
        PrinterRecord::network("office", "10.0.0.7", Some(9100))
    }

    #[test]
    fn test_text_job_succeeds() {
        let driver = Arc::new(CountingDriver::default());
        let result = service_with(driver.clone()).print_text(&printer(), "Hello", &PrintOptions::default());
        assert!(result.success, "{:?}", result);
        assert_eq!(result.message.as_deref(), Some("Print job sent successfully via brother_ql"));
        assert_eq!(driver.sizes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_text_rotation_swaps_dimensions() {
        let driver = Arc::new(CountingDriver::default());
        let service = service_with(driver.clone());
        let upright = PrintOptions::default();
        let turned = PrintOptions {
            rotate: 90,
            ..Default::default()
        };
        service.print_text(&printer(), "Hello", &upright);
        service.print_text(&printer(), "Hello", &turned);

        let sizes = driver.sizes.lock().unwrap();
        assert_eq!(sizes[0], (sizes[1].1, sizes[1].0));
    }

    #[test]
    fn test_bad_image_is_image_print_error() {
        let driver = Arc::new(CountingDriver::default());
        let result = service_with(driver.clone()).print_image(&printer(), "!!!not base64", &PrintOptions::default());
        assert!(!result.success);
        assert_eq!(result.error_type, Some(ErrorKind::ImagePrintError));
        assert!(driver.sizes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_address_is_config_error() {
        let driver = Arc::new(CountingDriver::default());
        let record = printer().with_connection(ConnectionType::Network, "  ");
        let result = service_with(driver).print_text(&record, "Hello", &PrintOptions::default());
        assert_eq!(result.error_type, Some(ErrorKind::PrinterConfigError));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let driver = Arc::new(CountingDriver::default());
        let options = PrintOptions {
            font_size: 0,
            ..Default::default()
        };
        let result = service_with(driver).print_text(&printer(), "Hello", &options);
        assert_eq!(result.error_type, Some(ErrorKind::InvalidOptions));
    }

    #[test]
    fn test_document_without_rasterizer() {
        let driver = Arc::new(CountingDriver::default());
        let result = service_with(driver).print_document(&printer(), "JVBERi0=", &PrintOptions::default());
        assert_eq!(result.error_type, Some(ErrorKind::PdfSupportMissing));
        assert!(result.page_results.is_none());
    }

    #[test]
    fn test_pt_model_reports_not_implemented() {
        let service = PrintService::new(Dispatcher::new(DriverSet::default(), None));
        let record = printer().with_model("PT-P710BT");
        let result = service.print_text(&record, "Hello", &PrintOptions::default());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(PT_NOT_IMPLEMENTED));
        assert_eq!(result.error_type, Some(ErrorKind::DriverNotImplemented));
    }

    #[test]
    fn test_panic_in_unit_is_contained() {
        let outcome: Result<(), PrintError> = isolate(|| panic!("renderer exploded"));
        let err = outcome.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclassifiedError);
        assert_eq!(err.message, "renderer exploded");
    }

    #[test]
    fn test_telemetry_counts_jobs() {
        let telemetry = Arc::new(TracingTelemetry::new());
        let driver = Arc::new(CountingDriver::default());
        let service = service_with(driver).with_telemetry(telemetry.clone());

        service.print_text(&printer(), "ok", &PrintOptions::default());
        service.print_image(&printer(), "%%%", &PrintOptions::default());

        let stats = telemetry.snapshot();
        assert_eq!(stats.prints_total, 2);
        assert_eq!(stats.prints_success, 1);
        assert_eq!(stats.prints_failed, 1);
        assert_eq!(stats.labels_sent, 1);
    }

    #[test]
    fn test_out_of_range_margin_is_invalid_options() {
        let driver = Arc::new(CountingDriver::default());
        let options: PrintOptions = serde_json::from_str(r#"{"margin": 1000000}"#).unwrap();
        let result = service_with(driver.clone()).print_text(&printer(), "Hello", &options);
        assert_eq!(result.error_type, Some(ErrorKind::InvalidOptions));
        assert!(driver.sizes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_text_label_is_text_print_error() {
        let driver = Arc::new(CountingDriver::default());
        let options = PrintOptions {
            font_size: options::MAX_FONT_SIZE,
            margin: options::MAX_MARGIN,
            ..Default::default()
        };
        let text = "W".repeat(2_000);
        let result = service_with(driver.clone()).print_text(&printer(), &text, &options);
        assert!(!result.success);
        assert_eq!(result.error_type, Some(ErrorKind::TextPrintError));
        assert!(result.error.unwrap().contains("label size limit"));
        assert!(driver.sizes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_padding_uses_unit_error_kind() {
        let driver = Arc::new(CountingDriver::default());
        let service = service_with(driver.clone());
        let err = service
            .print_unit(&printer(), LabelKind::Image, &PrintOptions::default(), u32::MAX, || {
                Ok(RgbImage::new(1, 1))
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImagePrintError);
        assert!(driver.sizes.lock().unwrap().is_empty());
    }
}
