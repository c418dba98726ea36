//! # Backend Dispatcher
//!
//! Picks the driver family for a model and performs one bounded send.
//!
//! ## Selection
//!
//! Evaluated in order:
//!
//! 1. `QL-` model and a QL driver installed → [`Backend::Ql`]
//! 2. `PT-` model and a PT driver installed → [`Backend::Pt`] (by default the
//!    [`PtPlaceholder`], which always fails)
//! 3. Otherwise → [`Backend::RawFallback`], which always fails with
//!    installation guidance
//!
//! Whatever runs, the caller gets `Result<Delivery, PrintError>`.
//!
//! ## Timeouts
//!
//! Driver sends block for as long as the device takes. With a timeout
//! configured, the send runs on its own thread and is abandoned once the limit
//! passes; the unit is reported as `print_timeout`.
//!
//! An abandoned send keeps its connection claimed until the driver returns.
//! A later send to the same connection waits for it within its own limit and
//! reports `print_timeout` if the earlier send is still running.

use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::driver::{self, DriverError, LabelDriver, PtPlaceholder, SendRequest};
use crate::error::{ErrorKind, PrintError};
use crate::printer::{BackendFamily, ConnectionIdentifier};

/// Default bound on a single driver send.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The installed drivers, one optional slot per family.
#[derive(Clone)]
pub struct DriverSet {
    pub ql: Option<Arc<dyn LabelDriver>>,
    pub pt: Option<Arc<dyn LabelDriver>>,
}

impl DriverSet {
    /// No drivers at all; every model ends in the raw fallback.
    pub fn empty() -> Self {
        Self { ql: None, pt: None }
    }

    pub fn with_ql(mut self, driver: Arc<dyn LabelDriver>) -> Self {
        self.ql = Some(driver);
        self
    }

    pub fn with_pt(mut self, driver: Arc<dyn LabelDriver>) -> Self {
        self.pt = Some(driver);
        self
    }
}

impl Default for DriverSet {
    /// No QL driver, PT slot held by the placeholder.
    fn default() -> Self {
        Self {
            ql: None,
            pt: Some(Arc::new(PtPlaceholder)),
        }
    }
}

/// The selected backend for one send.
#[derive(Clone)]
pub enum Backend {
    Ql(Arc<dyn LabelDriver>),
    Pt(Arc<dyn LabelDriver>),
    RawFallback,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Ql(driver) | Backend::Pt(driver) => driver.name(),
            Backend::RawFallback => "raw_fallback",
        }
    }

    pub fn family(&self) -> BackendFamily {
        match self {
            Backend::Ql(_) => BackendFamily::Ql,
            Backend::Pt(_) => BackendFamily::Pt,
            Backend::RawFallback => BackendFamily::Unsupported,
        }
    }
}

/// Choose the backend for `model` given the installed drivers.
pub fn select(drivers: &DriverSet, model: &str) -> Backend {
    match (BackendFamily::of_model(model), &drivers.ql, &drivers.pt) {
        (BackendFamily::Ql, Some(ql), _) => Backend::Ql(ql.clone()),
        (BackendFamily::Pt, _, Some(pt)) => Backend::Pt(pt.clone()),
        _ => Backend::RawFallback,
    }
}

/// A successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub backend: &'static str,
    pub message: String,
}

/// Connections with a driver send still running.
///
/// A slot is claimed before a send starts and released by whichever thread
/// finishes the send, including a send abandoned after a timeout.
#[derive(Default)]
struct InFlight {
    active: Mutex<HashSet<String>>,
    released: Condvar,
}

impl InFlight {
    /// Claim `key`, waiting until `deadline` (or forever) for a running send.
    fn claim(self: &Arc<Self>, key: &str, deadline: Option<Instant>) -> Option<SendSlot> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        while active.contains(key) {
            active = match deadline {
                None => self.released.wait(active).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return None;
                    }
                    self.released
                        .wait_timeout(active, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        active.insert(key.to_string());
        Some(SendSlot {
            owner: Arc::clone(self),
            key: key.to_string(),
        })
    }

    fn contains(&self, key: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Exclusive use of one connection; dropping it frees the connection.
struct SendSlot {
    owner: Arc<InFlight>,
    key: String,
}

impl Drop for SendSlot {
    fn drop(&mut self) {
        self.owner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        self.owner.released.notify_all();
    }
}

pub struct Dispatcher {
    drivers: DriverSet,
    timeout: Option<Duration>,
    in_flight: Arc<InFlight>,
}

impl Dispatcher {
    /// `timeout: None` lets sends block indefinitely.
    pub fn new(drivers: DriverSet, timeout: Option<Duration>) -> Self {
        Self {
            drivers,
            timeout,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn drivers(&self) -> &DriverSet {
        &self.drivers
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn select(&self, model: &str) -> Backend {
        select(&self.drivers, model)
    }

    /// Whether a driver send to `connection` is still running, including one
    /// whose caller already gave up on it.
    pub fn is_sending(&self, connection: &ConnectionIdentifier) -> bool {
        self.in_flight.contains(&connection.identifier)
    }

    /// Send one label through the selected backend.
    pub fn dispatch(&self, request: SendRequest) -> Result<Delivery, PrintError> {
        let backend = self.select(&request.model);
        debug!(
            backend = backend.name(),
            model = %request.model,
            connection = %request.connection,
            width = request.image.width(),
            height = request.image.height(),
            "dispatching label"
        );

        let driver = match &backend {
            Backend::Ql(driver) | Backend::Pt(driver) => driver.clone(),
            Backend::RawFallback => {
                let e = driver::raw_fallback(&request.model, &request.connection);
                warn!(model = %request.model, error = %e, "no compatible driver");
                return Err(PrintError::new(ErrorKind::DriverUnavailable, e.to_string()));
            }
        };

        let name = driver.name();
        match self.send_bounded(driver, request) {
            Ok(Ok(())) => {
                info!(backend = name, "label sent");
                Ok(Delivery {
                    backend: name,
                    message: format!("Print job sent successfully via {}", name),
                })
            }
            Ok(Err(e)) => {
                warn!(backend = name, error = %e, "driver reported failure");
                Err(classify_driver_error(name, e))
            }
            Err(e) => {
                warn!(backend = name, error = %e, "send abandoned");
                Err(e)
            }
        }
    }

    /// Run the driver, bounded by the timeout when one is set.
    ///
    /// Only one send per connection runs at a time. The limit covers both
    /// waiting for an earlier send on the same connection and the send itself.
    /// The outer error is for sends that never produced a driver result.
    fn send_bounded(
        &self,
        driver: Arc<dyn LabelDriver>,
        request: SendRequest,
    ) -> Result<Result<(), DriverError>, PrintError> {
        let name = driver.name();
        let key = request.connection.identifier.clone();

        let Some(limit) = self.timeout else {
            let _slot = self.in_flight.claim(&key, None);
            return Ok(driver.send(&request));
        };

        let deadline = Instant::now() + limit;
        let slot = self.in_flight.claim(&key, Some(deadline)).ok_or_else(|| {
            PrintError::new(
                ErrorKind::PrintTimeout,
                format!(
                    "{} print timed out after {}s: an earlier send to {} is still running",
                    name,
                    limit.as_secs_f32(),
                    key
                ),
            )
        })?;

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("send-{}", name))
            .spawn(move || {
                let result = driver.send(&request);
                drop(slot);
                // Receiver may be gone after a timeout
                let _ = tx.send(result);
            })
            .map_err(|e| {
                PrintError::new(
                    ErrorKind::UnclassifiedError,
                    format!("Failed to start send thread: {}", e),
                )
            })?;

        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(PrintError::new(
                ErrorKind::PrintTimeout,
                format!(
                    "{} print timed out after {}s",
                    name,
                    limit.as_secs_f32()
                ),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(PrintError::new(
                ErrorKind::UnclassifiedError,
                format!("{} driver crashed during send", name),
            )),
        }
    }
}

fn classify_driver_error(name: &str, error: DriverError) -> PrintError {
    match error {
        DriverError::Unsupported(message) => PrintError::new(ErrorKind::DriverNotImplemented, message),
        other => PrintError::new(ErrorKind::DriverError, format!("{} print failed: {}", name, other)),
    }
}
