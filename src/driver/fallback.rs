//! Terminal state when no compatible driver is installed.
//!
//! Raw framing is only ever considered for `tcp://` identifiers, and even
//! then nothing is sent: without a vendor encoder there is no safe raster
//! stream to produce. The result is always an error telling the operator
//! what to install.

use tracing::debug;

use super::DriverError;
use crate::printer::ConnectionIdentifier;

pub const RAW_TCP_ONLY: &str =
    "Raw printing only supports TCP connections. Install a QL-series driver for other backends.";

pub const NO_COMPATIBLE_DRIVER: &str = "No compatible printer driver installed. \
     Enable a QL-series driver (for QL models) or a PT-series driver (for PT models).";

/// Attempt the raw fallback for `model` on `connection`.
///
/// There is no success path; the returned error explains what is missing.
pub fn raw_fallback(model: &str, connection: &ConnectionIdentifier) -> DriverError {
    let Some((host, port)) = connection.tcp_endpoint() else {
        return DriverError::Unsupported(RAW_TCP_ONLY.to_string());
    };
    debug!(model, host, port, "raw fallback reached, no encoder available");
    DriverError::Unsupported(NO_COMPATIBLE_DRIVER.to_string())
}
