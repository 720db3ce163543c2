//! Error types for lumberjack-client.

use thiserror::Error;

/// Main error type for all lumberjack operations.
#[derive(Debug, Error)]
pub enum LumberjackError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error while building a record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The peer sent something other than an ACK where one was expected.
    #[error("Protocol desync: expected ACK frame, got type {found:#04x}")]
    ProtocolDesync {
        /// The frame type byte actually received.
        found: u8,
    },

    /// The peer acknowledged a sequence that was never sent.
    #[error("ACK {ack} is ahead of last sent sequence {sequence}")]
    AckOutOfRange { ack: u32, sequence: u32 },

    /// Malformed frame (peer-side decoding).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// TLS setup failed: unreadable CA bundle, bad peer name, or a
    /// rejected verifier configuration.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Invalid client or transport configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Transport has no open connection.
    #[error("Not connected to {0}")]
    NotConnected(String),

    /// `connect()` called on a transport that is already connected.
    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    /// A connect, read or write did not finish in time.
    #[error("Timed out during {0}")]
    Timeout(&'static str),
}

impl LumberjackError {
    /// Whether the error came from the transport rather than the protocol.
    ///
    /// Transport failures end the session; the caller decides whether to
    /// reconnect and resend.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            LumberjackError::Io(_)
                | LumberjackError::ConnectionClosed
                | LumberjackError::NotConnected(_)
                | LumberjackError::Timeout(_)
        )
    }
}

/// Result type alias using LumberjackError.
pub type Result<T> = std::result::Result<T, LumberjackError>;
