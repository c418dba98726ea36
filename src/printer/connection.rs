//! # Connection Identifier Builder
//!
//! Maps a printer's `(connection_type, address, port)` onto the addressing
//! scheme the driver transport expects:
//!
//! | Connection | Identifier | Backend |
//! |------------|------------|---------|
//! | network | `tcp://{address}:{port}` | `network` |
//! | usb | `usb://{address}` | `pyusb` |
//! | serial | `file://{address}` | `linux_kernel` |
//! | other | treated as network | `network` |
//!
//! Pure, no I/O, cannot fail.

use serde::Serialize;
use std::fmt;

use super::config::ConnectionType;
use super::model::DEFAULT_NETWORK_PORT;

/// Transport backend the driver should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendName {
    /// Raw TCP socket
    Network,
    /// Userspace USB
    Pyusb,
    /// Kernel character device (serial / usblp)
    LinuxKernel,
}

impl BackendName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Pyusb => "pyusb",
            Self::LinuxKernel => "linux_kernel",
        }
    }
}

impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver-facing printer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionIdentifier {
    pub identifier: String,
    pub backend: BackendName,
}

impl ConnectionIdentifier {
    /// Host and port of a `tcp://` identifier, defaulting the port.
    ///
    /// Returns `None` for non-network identifiers or an unparsable port.
    pub fn tcp_endpoint(&self) -> Option<(&str, u16)> {
        let host_port = self.identifier.strip_prefix("tcp://")?;
        match host_port.rsplit_once(':') {
            Some((host, port)) => port.parse().ok().map(|p| (host, p)),
            None => Some((host_port, DEFAULT_NETWORK_PORT)),
        }
    }
}

impl fmt::Display for ConnectionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.backend)
    }
}

/// Build the identifier/backend pair for a connection.
pub fn build(connection_type: &ConnectionType, address: &str, port: Option<u16>) -> ConnectionIdentifier {
    match connection_type {
        ConnectionType::Usb => ConnectionIdentifier {
            identifier: format!("usb://{}", address),
            backend: BackendName::Pyusb,
        },
        ConnectionType::Serial => ConnectionIdentifier {
            identifier: format!("file://{}", address),
            backend: BackendName::LinuxKernel,
        },
        ConnectionType::Network | ConnectionType::Other(_) => {
            let identifier = match port {
                Some(port) => format!("tcp://{}:{}", address, port),
                None => format!("tcp://{}", address),
            };
            ConnectionIdentifier {
                identifier,
                backend: BackendName::Network,
            }
        }
    }
}
