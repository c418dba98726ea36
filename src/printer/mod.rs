//! # Printer Module
//!
//! Printer records as resolved by the configuration store, the model
//! catalogue, and the mapping from a record to a driver connection.
//!
//! ## Modules
//!
//! - [`config`]: The read-only [`PrinterRecord`]
//! - [`model`]: Known models and their [`BackendFamily`]
//! - [`connection`]: Connection identifier builder

pub mod config;
pub mod connection;
pub mod model;

pub use config::{ConnectionType, PrinterRecord};
pub use connection::{BackendName, ConnectionIdentifier};
pub use model::{BackendFamily, is_known_model};
