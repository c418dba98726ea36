//! # Result Aggregation
//!
//! Folds unit outcomes into the [`PrintResult`] handed back to callers.
//!
//! Single-unit jobs (text, image) map one outcome straight through and carry
//! no page fields. Document jobs fold one outcome per page into a
//! [`DocumentTally`], whose result always satisfies:
//!
//! ```text
//! pages_successful + pages_failed == pages_total
//! success == (pages_failed == 0)
//! ```

use serde::Serialize;

use crate::dispatch::Delivery;
use crate::error::{ErrorKind, PrintError};

/// Outcome of one page of a document job. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub page: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
}

/// What a print job returns. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_successful: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_results: Option<Vec<PageResult>>,
}

impl PrintResult {
    /// Result of a single-unit job.
    pub fn from_unit(outcome: Result<Delivery, PrintError>) -> Self {
        match outcome {
            Ok(delivery) => Self::succeeded(delivery.message),
            Err(error) => Self::failed(error),
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            error_type: None,
            pages_total: None,
            pages_successful: None,
            pages_failed: None,
            page_results: None,
        }
    }

    /// A job-fatal failure (no page detail).
    pub fn failed(error: PrintError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.message),
            error_type: Some(error.kind),
            pages_total: None,
            pages_successful: None,
            pages_failed: None,
            page_results: None,
        }
    }
}

/// Per-job accumulator for document pages.
///
/// Create one per job and [`record`](Self::record) every page in order.
#[derive(Debug, Default)]
pub struct DocumentTally {
    pages: Vec<PageResult>,
    failed: usize,
}

impl DocumentTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of the page at zero-based `index`.
    pub fn record(&mut self, index: usize, outcome: &Result<Delivery, PrintError>) {
        let page = match outcome {
            Ok(_) => PageResult {
                page: index + 1,
                success: true,
                error: None,
                error_type: None,
            },
            Err(e) => {
                self.failed += 1;
                PageResult {
                    page: index + 1,
                    success: false,
                    error: Some(e.message.clone()),
                    error_type: Some(e.kind),
                }
            }
        };
        self.pages.push(page);
    }

    pub fn pages_recorded(&self) -> usize {
        self.pages.len()
    }

    pub fn pages_failed(&self) -> usize {
        self.failed
    }

    pub fn finish(self) -> PrintResult {
        let total = self.pages.len();
        let failed = self.failed;
        let successful = total - failed;

        let (message, error, error_type) = if failed == 0 {
            (Some(format!("Printed {} page(s) successfully", total)), None, None)
        } else {
            (
                None,
                Some(format!("{} of {} page(s) failed to print", failed, total)),
                Some(ErrorKind::PartialDocumentPrintFailure),
            )
        };

        PrintResult {
            success: failed == 0,
            message,
            error,
            error_type,
            pages_total: Some(total),
            pages_successful: Some(successful),
            pages_failed: Some(failed),
            page_results: Some(self.pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ok() -> Result<Delivery, PrintError> {
        Ok(Delivery {
            backend: "brother_ql",
            message: "sent".to_string(),
        })
    }

    fn err(msg: &str) -> Result<Delivery, PrintError> {
        Err(PrintError::new(ErrorKind::PdfProcessingError, msg))
    }

    #[test]
    fn test_single_unit_has_no_page_fields() {
        let result = PrintResult::from_unit(ok());
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("sent"));
        assert!(result.pages_total.is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("pages_total").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_single_unit_failure() {
        let result = PrintResult::from_unit(Err(PrintError::new(ErrorKind::ImagePrintError, "bad")));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("bad"));
        assert_eq!(result.error_type, Some(ErrorKind::ImagePrintError));
    }

    #[test]
    fn test_all_pages_succeed() {
        let mut tally = DocumentTally::new();
        for i in 0..3 {
            tally.record(i, &ok());
        }
        let result = tally.finish();
        assert!(result.success);
        assert_eq!(result.pages_total, Some(3));
        assert_eq!(result.pages_successful, Some(3));
        assert_eq!(result.pages_failed, Some(0));
        assert!(result.error_type.is_none());
    }

    #[test]
    fn test_partial_failure() {
        let mut tally = DocumentTally::new();
        tally.record(0, &ok());
        tally.record(1, &err("page 2 is corrupt"));
        tally.record(2, &ok());
        let result = tally.finish();

        assert!(!result.success);
        assert_eq!(result.error_type, Some(ErrorKind::PartialDocumentPrintFailure));
        assert_eq!(result.error.as_deref(), Some("1 of 3 page(s) failed to print"));
        assert_eq!(
            result.page_results.unwrap()[1],
            PageResult {
                page: 2,
                success: false,
                error: Some("page 2 is corrupt".to_string()),
                error_type: Some(ErrorKind::PdfProcessingError),
            }
        );
    }

    #[test]
    fn test_aggregate_law_holds_for_every_mix() {
        for mask in 0u32..32 {
            let mut tally = DocumentTally::new();
            for i in 0..5 {
                if mask & (1 << i) == 0 {
                    tally.record(i, &ok());
                } else {
                    tally.record(i, &err("x"));
                }
            }
            let result = tally.finish();
            let total = result.pages_total.unwrap();
            let failed = result.pages_failed.unwrap();
            assert_eq!(result.pages_successful.unwrap() + failed, total);
            assert_eq!(result.success, failed == 0);
            assert_eq!(failed, mask.count_ones() as usize);
        }
    }
}
