//! Server state and configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::ConfigStore;
use crate::dispatch::{Dispatcher, DriverSet};
use crate::error::ServerError;
use crate::job::PrintService;
use crate::printer::ConnectionIdentifier;
use crate::render;
use crate::telemetry::TracingTelemetry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:5000")
    pub listen_addr: String,
    /// Path to the JSON configuration store
    pub config_path: PathBuf,
    /// Bound on each driver send; `None` disables it
    pub dispatch_timeout: Option<Duration>,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

/// Application state shared across handlers.
pub struct AppState {
    pub store: ConfigStore,
    pub service: Arc<PrintService>,
    pub telemetry: Arc<TracingTelemetry>,
    /// One async lock per connection identifier; a job holds it until its
    /// last label is sent. Bounded by the configured printers.
    printer_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AppState {
    /// Wire a store and print service together. The service's telemetry is
    /// replaced by the shared counters behind `/api/stats`.
    pub fn new(store: ConfigStore, service: PrintService) -> Self {
        let telemetry = Arc::new(TracingTelemetry::new());
        let service = service.with_telemetry(telemetry.clone());
        Self {
            store,
            service: Arc::new(service),
            telemetry,
            printer_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load the configuration store and set up the default driver set.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let store = ConfigStore::load(&config.config_path)?;
        let dispatcher = Dispatcher::new(DriverSet::default(), config.dispatch_timeout);
        let mut service = PrintService::new(dispatcher);
        if let Some(rasterizer) = render::document::system_rasterizer() {
            service = service.with_rasterizer(rasterizer);
        }
        Ok(Self::new(store, service))
    }

    /// The lock serializing jobs for one device. Records that share an
    /// address share the lock.
    pub fn printer_lock(&self, connection: &ConnectionIdentifier) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.printer_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(connection.identifier.clone()).or_default().clone()
    }
}
