//! Transport module - the byte stream the client talks over.
//!
//! The client only needs two operations from a transport: send a whole
//! frame, and read an exact number of bytes. Connection setup, TLS and
//! timeouts belong to the transport.
//!
//! - [`StreamTransport`] wraps any tokio `AsyncRead + AsyncWrite` stream
//! - [`TcpTransport`] owns a TCP connection with explicit
//!   connect/disconnect/reconnect
//! - [`TlsTransport`] does the same over rustls, verifying the collector
//!   against a CA bundle

mod options;
mod stream;
mod tcp;
mod tls;

pub use options::{TransportOptions, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_SOCKET_TIMEOUT};
pub use stream::StreamTransport;
pub use tcp::TcpTransport;
pub use tls::TlsTransport;

use crate::error::Result;

/// Byte stream contract used by [`Client`](crate::Client).
///
/// Any failure is fatal to the write in progress; the client never
/// retries.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Write all of `bytes`, returning the number of bytes written.
    async fn send(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Fill `buf` completely, waiting as long as the transport allows.
    async fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()>;
}
