//! # Print Pipeline Tests
//!
//! End-to-end runs of [`PrintService`] with in-memory drivers and a fake
//! document rasterizer. Nothing here talks to a real printer.
//!
//! ## Test Coverage
//!
//! - Text and image jobs through the QL path
//! - Model-prefix routing (QL driver, PT placeholder, raw fallback)
//! - Document jobs: missing rasterizer, empty document, per-page isolation
//! - Driver failures and dispatch timeouts surfacing as error kinds
//! - No overlapping sends to one printer, even after a timeout

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use labelstation::dispatch::{Dispatcher, DriverSet};
use labelstation::driver::pt::PT_NOT_IMPLEMENTED;
use labelstation::driver::{DriverError, LabelDriver, SendRequest};
use labelstation::printer::{ConnectionType, PrinterRecord};
use labelstation::render::{DocumentRasterizer, PageSource, RenderError};
use labelstation::telemetry::TracingTelemetry;
use labelstation::{ErrorKind, PrintOptions, PrintService};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// FAKES
// ============================================================================

/// Records every label it is asked to send.
#[derive(Default)]
struct RecordingDriver {
    sent: Mutex<Vec<SendRequest>>,
    fail_with: Option<DriverError>,
    delay: Option<Duration>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingDriver {
    fn failing(error: DriverError) -> Self {
        Self {
            fail_with: Some(error),
            ..Default::default()
        }
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl LabelDriver for RecordingDriver {
    fn name(&self) -> &'static str {
        "brother_ql"
    }

    fn send(&self, request: &SendRequest) -> Result<(), DriverError> {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(request.clone());
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// How one fake page behaves when rasterized.
#[derive(Clone, Copy)]
enum FakePage {
    Ok,
    Error,
    Panic,
}

struct FakeRasterizer {
    pages: Vec<FakePage>,
}

struct FakeDocument<'a> {
    pages: &'a [FakePage],
}

impl DocumentRasterizer for FakeRasterizer {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, RenderError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(RenderError::Document("not a PDF".to_string()));
        }
        Ok(Box::new(FakeDocument { pages: &self.pages }))
    }
}

impl PageSource for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, index: usize, dpi: u32) -> Result<RgbImage, RenderError> {
        match self.pages[index] {
            FakePage::Ok => {
                let side = dpi / 10;
                let mut page = RgbImage::from_pixel(side, side * 2, Rgb([255, 255, 255]));
                page.put_pixel(1, 1, Rgb([0, 0, 0]));
                Ok(page)
            }
            FakePage::Error => Err(RenderError::Document(format!("page {} is corrupt", index + 1))),
            FakePage::Panic => panic!("rasterizer crashed on page {}", index + 1),
        }
    }
}

/// Opens anything, then crashes while counting pages.
struct UncountableRasterizer;

struct UncountableDocument;

impl DocumentRasterizer for UncountableRasterizer {
    fn name(&self) -> &'static str {
        "uncountable"
    }

    fn open<'a>(&'a self, _bytes: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, RenderError> {
        Ok(Box::new(UncountableDocument))
    }
}

impl PageSource for UncountableDocument {
    fn page_count(&self) -> usize {
        panic!("page tree is corrupt")
    }

    fn render_page(&self, _index: usize, _dpi: u32) -> Result<RgbImage, RenderError> {
        unreachable!("pages are never rendered when counting fails")
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn office() -> PrinterRecord {
    PrinterRecord::network("office", "192.168.1.50", Some(9100))
}

fn ql_service(driver: Arc<RecordingDriver>) -> PrintService {
    PrintService::new(Dispatcher::new(DriverSet::default().with_ql(driver), None))
}

fn document_service(driver: Arc<RecordingDriver>, pages: Vec<FakePage>) -> PrintService {
    ql_service(driver).with_rasterizer(Arc::new(FakeRasterizer { pages }))
}

fn pdf_base64() -> String {
    STANDARD.encode(b"%PDF-1.7 fake")
}

fn png_base64(width: u32, height: u32) -> String {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for x in 0..width {
        img.put_pixel(x, height / 2, Rgb([0, 0, 0]));
    }
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    STANDARD.encode(bytes.into_inner())
}

// ============================================================================
// SINGLE-UNIT JOBS
// ============================================================================

#[test]
fn test_text_job_sends_one_label() {
    let driver = Arc::new(RecordingDriver::default());
    let result = ql_service(driver.clone()).print_text(&office(), "Hello World", &PrintOptions::default());

    assert!(result.success, "{:?}", result);
    assert!(result.page_results.is_none());

    let sent = driver.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].model, "QL-820NWB");
    assert_eq!(sent[0].connection.identifier, "tcp://192.168.1.50:9100");
    assert_eq!(sent[0].label_size, "62");
    assert!(sent[0].cut);
    assert!(sent[0].rotation_applied);
    assert!(sent[0].image.black_pixel_count() > 0);
}

#[test]
fn test_image_job_applies_margin_and_rotation() {
    let driver = Arc::new(RecordingDriver::default());
    let service = ql_service(driver.clone());
    let options = PrintOptions {
        rotate: 90,
        margin: 5,
        cut: false,
        ..Default::default()
    };

    let result = service.print_image(&office(), &png_base64(40, 20), &options);
    assert!(result.success, "{:?}", result);

    let sent = driver.sent.lock().unwrap();
    assert_eq!((sent[0].image.width(), sent[0].image.height()), (30, 50));
    assert!(!sent[0].cut);
}

#[test]
fn test_undecodable_image() {
    let driver = Arc::new(RecordingDriver::default());
    let payload = STANDARD.encode(b"definitely not an image");
    let result = ql_service(driver.clone()).print_image(&office(), &payload, &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.error_type, Some(ErrorKind::ImagePrintError));
    assert_eq!(driver.count(), 0);
}

// ============================================================================
// ROUTING
// ============================================================================

#[test]
fn test_pt_model_fails_even_with_ql_driver() {
    let driver = Arc::new(RecordingDriver::default());
    let printer = office().with_model("PT-P710BT");
    let result = ql_service(driver.clone()).print_text(&printer, "Shelf A", &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some(PT_NOT_IMPLEMENTED));
    assert_eq!(driver.count(), 0);
}

#[test]
fn test_no_driver_falls_back_with_guidance() {
    let service = PrintService::new(Dispatcher::new(DriverSet::default(), None));
    let result = service.print_text(&office(), "Hello", &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.error_type, Some(ErrorKind::DriverUnavailable));
    assert!(result.error.unwrap().contains("install"));
}

#[test]
fn test_usb_printer_without_driver() {
    let service = PrintService::new(Dispatcher::new(DriverSet::default(), None));
    let printer = office().with_connection(ConnectionType::Usb, "0x04f9:0x209b");
    let result = service.print_text(&printer, "Hello", &PrintOptions::default());

    assert_eq!(result.error_type, Some(ErrorKind::DriverUnavailable));
}

#[test]
fn test_driver_failure_is_prefixed() {
    let driver = Arc::new(RecordingDriver::failing(DriverError::Transport(
        "connection refused".to_string(),
    )));
    let result = ql_service(driver).print_text(&office(), "Hello", &PrintOptions::default());

    assert_eq!(result.error_type, Some(ErrorKind::DriverError));
    let error = result.error.unwrap();
    assert!(error.starts_with("brother_ql print failed"), "{}", error);
}

#[test]
fn test_stuck_driver_times_out() {
    let driver = Arc::new(RecordingDriver {
        delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    let dispatcher = Dispatcher::new(
        DriverSet::default().with_ql(driver),
        Some(Duration::from_millis(20)),
    );
    let result = PrintService::new(dispatcher).print_text(&office(), "Hello", &PrintOptions::default());

    assert_eq!(result.error_type, Some(ErrorKind::PrintTimeout));
}

#[test]
fn test_back_to_back_jobs_never_overlap_after_timeout() {
    let driver = Arc::new(RecordingDriver {
        delay: Some(Duration::from_millis(300)),
        ..Default::default()
    });
    let service = PrintService::new(Dispatcher::new(
        DriverSet::default().with_ql(driver.clone()),
        Some(Duration::from_millis(20)),
    ));

    let first = service.print_text(&office(), "a", &PrintOptions::default());
    let second = service.print_text(&office(), "b", &PrintOptions::default());
    assert_eq!(first.error_type, Some(ErrorKind::PrintTimeout));
    assert_eq!(second.error_type, Some(ErrorKind::PrintTimeout));

    // Let the abandoned send drain, then the printer is usable again
    std::thread::sleep(Duration::from_millis(400));
    assert!(!service.dispatcher().is_sending(&office().connection()));
    assert_eq!(driver.count(), 1);
    assert_eq!(driver.peak.load(Ordering::SeqCst), 1);
}

// ============================================================================
// DOCUMENT JOBS
// ============================================================================

#[test]
fn test_document_without_rasterizer() {
    let driver = Arc::new(RecordingDriver::default());
    let result = ql_service(driver.clone()).print_document(&office(), &pdf_base64(), &PrintOptions::default());

    assert_eq!(result.error_type, Some(ErrorKind::PdfSupportMissing));
    assert_eq!(driver.count(), 0);
}

#[test]
fn test_empty_document_never_dispatches() {
    let driver = Arc::new(RecordingDriver::default());
    let service = document_service(driver.clone(), vec![]);
    let result = service.print_document(&office(), &pdf_base64(), &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.error_type, Some(ErrorKind::EmptyDocument));
    assert_eq!(driver.count(), 0);
}

#[test]
fn test_malformed_document() {
    let driver = Arc::new(RecordingDriver::default());
    let service = document_service(driver.clone(), vec![FakePage::Ok]);

    let garbage = STANDARD.encode(b"GIF89a");
    let result = service.print_document(&office(), &garbage, &PrintOptions::default());
    assert_eq!(result.error_type, Some(ErrorKind::PdfProcessingError));

    let result = service.print_document(&office(), "***", &PrintOptions::default());
    assert_eq!(result.error_type, Some(ErrorKind::PdfProcessingError));
    assert_eq!(driver.count(), 0);
}

#[test]
fn test_panic_while_counting_pages_is_contained() {
    let driver = Arc::new(RecordingDriver::default());
    let service = ql_service(driver.clone()).with_rasterizer(Arc::new(UncountableRasterizer));
    let result = service.print_document(&office(), &pdf_base64(), &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.error_type, Some(ErrorKind::UnclassifiedError));
    assert_eq!(result.error.as_deref(), Some("page tree is corrupt"));
    assert!(result.page_results.is_none());
    assert_eq!(driver.count(), 0);
}

#[test]
fn test_all_pages_print_in_order() {
    let driver = Arc::new(RecordingDriver::default());
    let service = document_service(driver.clone(), vec![FakePage::Ok; 3]);
    let options = PrintOptions {
        dpi: 100,
        margin: 0,
        ..Default::default()
    };
    let result = service.print_document(&office(), &pdf_base64(), &options);

    assert!(result.success, "{:?}", result);
    assert_eq!(result.pages_total, Some(3));
    assert_eq!(result.pages_successful, Some(3));
    assert_eq!(result.pages_failed, Some(0));

    let pages: Vec<usize> = result.page_results.unwrap().iter().map(|p| p.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);

    let sent = driver.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!((sent[0].image.width(), sent[0].image.height()), (10, 20));
}

#[test]
fn test_failing_page_is_isolated() {
    let driver = Arc::new(RecordingDriver::default());
    let service = document_service(driver.clone(), vec![FakePage::Ok, FakePage::Error, FakePage::Ok]);
    let result = service.print_document(&office(), &pdf_base64(), &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.error_type, Some(ErrorKind::PartialDocumentPrintFailure));
    assert_eq!(result.pages_total, Some(3));
    assert_eq!(result.pages_successful, Some(2));
    assert_eq!(result.pages_failed, Some(1));

    let pages = result.page_results.unwrap();
    assert!(pages[0].success);
    assert!(!pages[1].success);
    assert_eq!(pages[1].error_type, Some(ErrorKind::PdfProcessingError));
    assert!(pages[1].error.as_deref().unwrap().contains("page 2 is corrupt"));
    assert!(pages[2].success);

    // Pages 1 and 3 still reached the printer
    assert_eq!(driver.count(), 2);
}

#[test]
fn test_panicking_page_is_isolated() {
    let driver = Arc::new(RecordingDriver::default());
    let service = document_service(driver.clone(), vec![FakePage::Panic, FakePage::Ok]);
    let result = service.print_document(&office(), &pdf_base64(), &PrintOptions::default());

    assert_eq!(result.pages_failed, Some(1));
    assert_eq!(result.pages_successful, Some(1));

    let pages = result.page_results.unwrap();
    assert_eq!(pages[0].error_type, Some(ErrorKind::UnclassifiedError));
    assert_eq!(pages[0].error.as_deref(), Some("rasterizer crashed on page 1"));
    assert_eq!(driver.count(), 1);
}

#[test]
fn test_every_page_failing_reports_all() {
    let driver = Arc::new(RecordingDriver::failing(DriverError::Encode(
        "label too wide".to_string(),
    )));
    let service = document_service(driver.clone(), vec![FakePage::Ok, FakePage::Ok]);
    let result = service.print_document(&office(), &pdf_base64(), &PrintOptions::default());

    assert!(!result.success);
    assert_eq!(result.pages_failed, Some(2));
    assert_eq!(result.pages_successful, Some(0));
    assert_eq!(driver.count(), 2);
}

// ============================================================================
// TELEMETRY
// ============================================================================

#[test]
fn test_document_job_counts_labels() {
    let telemetry = Arc::new(TracingTelemetry::new());
    let driver = Arc::new(RecordingDriver::default());
    let service = document_service(driver, vec![FakePage::Ok, FakePage::Error, FakePage::Ok])
        .with_telemetry(telemetry.clone());

    service.print_document(&office(), &pdf_base64(), &PrintOptions::default());

    let stats = telemetry.snapshot();
    assert_eq!(stats.prints_total, 1);
    assert_eq!(stats.prints_failed, 1);
    assert_eq!(stats.labels_sent, 2);
}
