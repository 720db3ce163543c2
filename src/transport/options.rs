//! TCP and TLS transport configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LumberjackError, Result};

/// Default connect timeout.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Default per-operation read/write timeout.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(3);

/// Options for [`TcpTransport`](super::TcpTransport) and
/// [`TlsTransport`](super::TlsTransport).
///
/// Validated once when the transport is created and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Collector host name or IP address.
    pub host: String,
    /// Collector port (1-65535).
    pub port: u16,
    /// How long to wait for the TCP connection to be established.
    /// Default: 3 seconds.
    pub connection_timeout: Duration,
    /// How long a single read or write may take. An ACK wait that exceeds
    /// this fails the write in progress.
    /// Default: 3 seconds.
    pub socket_timeout: Duration,
    /// Disable Nagle's algorithm.
    /// Default: true
    pub nodelay: bool,
    /// Connect as soon as the transport is created.
    /// Default: true
    pub autoconnect: bool,
    /// PEM file with the CA certificates trusted for the collector.
    /// Required by the TLS transport, ignored by plain TCP.
    pub tls_ca_file: Option<PathBuf>,
    /// Name checked against the collector certificate.
    /// Default: `host`
    pub peer_name: Option<String>,
    /// Accept a self-signed collector certificate if it appears in
    /// `tls_ca_file`.
    /// Default: false
    pub allow_self_signed: bool,
}

impl TransportOptions {
    /// Options for `host:port` with defaults for everything else.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            nodelay: true,
            autoconnect: true,
            tls_ca_file: None,
            peer_name: None,
            allow_self_signed: false,
        }
    }

    /// Set the connect timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the read/write timeout.
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Enable or disable `TCP_NODELAY`.
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Connect on creation or wait for an explicit `connect()`.
    pub fn autoconnect(mut self, autoconnect: bool) -> Self {
        self.autoconnect = autoconnect;
        self
    }

    /// Set the CA bundle used to verify the collector.
    pub fn tls_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls_ca_file = Some(path.into());
        self
    }

    /// Verify the collector certificate against `name` instead of `host`.
    pub fn peer_name(mut self, name: impl Into<String>) -> Self {
        self.peer_name = Some(name.into());
        self
    }

    /// Accept self-signed certificates listed in the CA bundle.
    pub fn allow_self_signed(mut self, allow: bool) -> Self {
        self.allow_self_signed = allow;
        self
    }

    /// Name the TLS handshake verifies: `peer_name`, or `host`.
    pub fn tls_peer_name(&self) -> &str {
        self.peer_name.as_deref().unwrap_or(&self.host)
    }

    /// `host:port` string used for connecting and in errors.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the options for values that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(LumberjackError::InvalidConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(LumberjackError::InvalidConfig(
                "port should be between 1 and 65535".to_string(),
            ));
        }
        if self.connection_timeout.is_zero() {
            return Err(LumberjackError::InvalidConfig(
                "connection_timeout must be non-zero".to_string(),
            ));
        }
        if self.socket_timeout.is_zero() {
            return Err(LumberjackError::InvalidConfig(
                "socket_timeout must be non-zero".to_string(),
            ));
        }
        if let Some(path) = &self.tls_ca_file {
            if !path.is_file() {
                return Err(LumberjackError::InvalidConfig(format!(
                    "tls_ca_file {} does not exist",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}
