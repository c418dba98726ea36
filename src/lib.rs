//! # Labelstation - Label Printer Job Service
//!
//! Labelstation turns print requests (plain text, an encoded image, or a
//! multi-page document) into 1-bit raster labels for Brother QL and PT
//! printers and hands them to a driver. It provides:
//!
//! - **Rendering**: text onto a white canvas, image decoding, document pages
//! - **Transform**: rotation, binarization and margins into a [`MonoImage`]
//! - **Dispatch**: model-prefix driver selection with a bounded send
//! - **Jobs**: per-page failure isolation and aggregated results
//! - **Server**: an authenticated JSON API with per-printer serialization
//!
//! ## Quick Start
//!
//! ```no_run
//! use labelstation::{
//!     dispatch::{Dispatcher, DriverSet, DEFAULT_DISPATCH_TIMEOUT},
//!     job::{PrintOptions, PrintService},
//!     printer::PrinterRecord,
//! };
//!
//! let service = PrintService::new(Dispatcher::new(
//!     DriverSet::default(),
//!     Some(DEFAULT_DISPATCH_TIMEOUT),
//! ));
//!
//! let printer = PrinterRecord::network("office", "192.168.1.50", Some(9100));
//! let result = service.print_text(&printer, "Hello", &PrintOptions::default());
//!
//! if !result.success {
//!     eprintln!("{:?}: {:?}", result.error_type, result.error);
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | JSON configuration store (API keys, printers) |
//! | [`printer`] | Printer records, model families, connection identifiers |
//! | [`render`] | Text, image and document rendering |
//! | [`transform`] | Rotate, binarize, pad |
//! | [`driver`] | Driver seam and terminal fallbacks |
//! | [`dispatch`] | Backend selection and bounded send |
//! | [`job`] | Print orchestration and results |
//! | [`telemetry`] | Observation sink |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod job;
pub mod printer;
pub mod render;
pub mod server;
pub mod telemetry;
pub mod transform;

// Re-exports for convenience
pub use error::{ErrorKind, PrintError};
pub use job::{PrintOptions, PrintResult, PrintService};
pub use printer::PrinterRecord;
pub use transform::MonoImage;
