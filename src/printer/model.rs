//! # Model Catalogue
//!
//! Brother label printers fall into driver families by model prefix:
//!
//! | Family | Prefix | Driver |
//! |--------|--------|--------|
//! | QL | `QL-` | QL raster driver |
//! | PT | `PT-` | PT driver (integration pending) |
//! | Unsupported | anything else | raw fallback |
//!
//! The lists below are the models known to work with each family. They are
//! informational: routing is by prefix, so an unlisted `QL-` model still goes
//! to the QL driver.

use std::fmt;

/// QL series models known to be compatible with the QL raster driver.
pub const QL_MODELS: &[&str] = &[
    "QL-500", "QL-550", "QL-560", "QL-570", "QL-580N", "QL-650TD", "QL-700", "QL-710W",
    "QL-720NW", "QL-800", "QL-810W", "QL-820NWB", "QL-1050", "QL-1060N", "QL-1100",
    "QL-1115NWB",
];

/// PT series (P-touch) models.
pub const PT_MODELS: &[&str] = &[
    "PT-P710BT", "PT-E550W", "PT-P750W", "PT-P900", "PT-P900W", "PT-P950NW", "PT-H500",
    "PT-P700", "PT-P300BT",
];

/// Standard raw-print TCP port used by Brother network printers.
pub const DEFAULT_NETWORK_PORT: u16 = 9100;

/// Driver family a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFamily {
    Ql,
    Pt,
    Unsupported,
}

impl BackendFamily {
    /// Classify a model string by its family prefix.
    pub fn of_model(model: &str) -> Self {
        let model = model.trim();
        if model.starts_with("QL-") {
            Self::Ql
        } else if model.starts_with("PT-") {
            Self::Pt
        } else {
            Self::Unsupported
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ql => "ql",
            Self::Pt => "pt",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if the model appears in either catalogue list.
pub fn is_known_model(model: &str) -> bool {
    QL_MODELS.contains(&model) || PT_MODELS.contains(&model)
}
