//! # Label Drivers
//!
//! A driver is the external capability that encodes a 1-bit image into a
//! vendor raster command stream and pushes it down a transport. This crate
//! does not speak any vendor protocol itself; it defines the seam
//! ([`LabelDriver`]) and the terminal states for families that have no
//! working driver:
//!
//! - [`PtPlaceholder`]: PT-series integration is not implemented and always
//!   fails with an explanation
//! - [`raw_fallback`]: no compatible driver at all; always fails with
//!   installation guidance
//!
//! Drivers are blocking. The [`dispatch`](crate::dispatch) layer bounds each
//! call with a timeout.

pub mod fallback;
pub mod pt;

pub use fallback::raw_fallback;
pub use pt::PtPlaceholder;

use thiserror::Error;

use crate::printer::ConnectionIdentifier;
use crate::transform::MonoImage;

/// Everything a driver needs for one physical label.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub image: MonoImage,
    /// Target model (e.g. "QL-820NWB")
    pub model: String,
    pub connection: ConnectionIdentifier,
    /// Label stock identifier from the printer record
    pub label_size: String,
    /// Cut after this label
    pub cut: bool,
    /// Always true: rotation has been applied by the transform stage, so the
    /// driver must not auto-rotate
    pub rotation_applied: bool,
}

/// Failure reported by a driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// Raster encoding failed (unsupported label size, image too wide, ...)
    #[error("encoding failed: {0}")]
    Encode(String),

    /// The printer could not be reached or rejected the data
    #[error("transport failed: {0}")]
    Transport(String),

    /// The driver does not support this request
    #[error("{0}")]
    Unsupported(String),
}

/// The send capability of one driver family.
pub trait LabelDriver: Send + Sync {
    /// Name used in logs and error prefixes (e.g. "brother_ql")
    fn name(&self) -> &'static str;

    /// Encode and send one label, blocking until the device accepted it.
    fn send(&self, request: &SendRequest) -> Result<(), DriverError>;
}
