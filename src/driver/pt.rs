//! PT-series placeholder driver.

use super::{DriverError, LabelDriver, SendRequest};

/// Message returned for every PT-series label.
pub const PT_NOT_IMPLEMENTED: &str = "PT-series driver integration not yet implemented";

/// Stands in for the PT-series driver until a real integration exists.
///
/// Every send fails; nothing is transmitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PtPlaceholder;

impl LabelDriver for PtPlaceholder {
    fn name(&self) -> &'static str {
        "pt_placeholder"
    }

    fn send(&self, _request: &SendRequest) -> Result<(), DriverError> {
        Err(DriverError::Unsupported(PT_NOT_IMPLEMENTED.to_string()))
    }
}
