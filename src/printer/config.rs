//! # Printer Records
//!
//! A [`PrinterRecord`] is what the configuration store hands to the print
//! pipeline for one printer. The pipeline only ever borrows it, so several
//! jobs may read the same record at once.
//!
//! ## JSON Shape
//!
//! ```json
//! {
//!   "id": "office",
//!   "name": "Office QL",
//!   "model": "QL-820NWB",
//!   "connection_type": "network",
//!   "address": "192.168.1.50",
//!   "port": 9100,
//!   "label_size": "62"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::connection::{self, ConnectionIdentifier};
use super::model::BackendFamily;

/// Model assumed when a record does not name one.
pub const DEFAULT_MODEL: &str = "QL-820NWB";

/// Label stock assumed when a record does not name one (62mm endless).
pub const DEFAULT_LABEL_SIZE: &str = "62";

/// How the printer is physically reached.
///
/// Unrecognised values are kept verbatim in [`ConnectionType::Other`] so they
/// survive a config round trip; the connection builder treats them as network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionType {
    #[default]
    Network,
    Usb,
    Serial,
    Other(String),
}

impl ConnectionType {
    /// Parse a connection type name (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "network" => Self::Network,
            "usb" => Self::Usb,
            "serial" => Self::Serial,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Network => "network",
            Self::Usb => "usb",
            Self::Serial => "serial",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ConnectionType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ConnectionType> for String {
    fn from(ct: ConnectionType) -> Self {
        ct.as_str().to_string()
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Printer Record
///
/// Identity, model and transport location of one configured printer.
///
/// Either `id` or `name` can be used to look the record up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterRecord {
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Vendor model string (e.g. "QL-820NWB", "PT-P710BT")
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub connection_type: ConnectionType,

    /// Host name / IP, USB device address, or serial device path
    #[serde(default)]
    pub address: String,

    /// TCP port for network printers; omitted from the identifier when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Label stock identifier, passed through to the driver untouched
    #[serde(default = "default_label_size")]
    pub label_size: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_label_size() -> String {
    DEFAULT_LABEL_SIZE.to_string()
}

impl PrinterRecord {
    /// Create a network printer record with default model and label size.
    pub fn network(id: &str, address: &str, port: Option<u16>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            model: default_model(),
            connection_type: ConnectionType::Network,
            address: address.to_string(),
            port,
            label_size: default_label_size(),
        }
    }

    /// Builder-style model override.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Builder-style connection override.
    pub fn with_connection(mut self, connection_type: ConnectionType, address: &str) -> Self {
        self.connection_type = connection_type;
        self.address = address.to_string();
        self
    }

    /// True if `key` is this printer's id or display name.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || (!self.name.is_empty() && self.name == key)
    }

    /// The driver-facing connection for this record.
    pub fn connection(&self) -> ConnectionIdentifier {
        connection::build(&self.connection_type, &self.address, self.port)
    }

    pub fn family(&self) -> BackendFamily {
        BackendFamily::of_model(&self.model)
    }
}
