//! Transport over any tokio byte stream.
//!
//! Wraps an `AsyncRead + AsyncWrite` stream (a `TcpStream`, a TLS stream,
//! or `tokio::io::duplex` in tests) and applies an optional per-operation
//! timeout.
//!
//! # Example
//!
//! ```
//! use lumberjack_client::transport::{StreamTransport, Transport};
//! use tokio::io::AsyncReadExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lumberjack_client::Result<()> {
//! let (client, mut server) = tokio::io::duplex(64);
//! let mut transport = StreamTransport::new(client);
//!
//! assert_eq!(transport.send(b"1W\0\0\0\x05").await?, 6);
//!
//! let mut buf = [0u8; 6];
//! server.read_exact(&mut buf).await?;
//! assert_eq!(&buf, b"1W\0\0\0\x05");
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::error::{LumberjackError, Result};

/// A [`Transport`] over a tokio byte stream.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    io_timeout: Option<Duration>,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream with no timeout.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            io_timeout: None,
        }
    }

    /// Wrap a stream, failing any single read or write that takes longer
    /// than `timeout`.
    pub fn with_timeout(stream: S, timeout: Duration) -> Self {
        Self {
            stream,
            io_timeout: Some(timeout),
        }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        let stream = &mut self.stream;
        with_timeout(self.io_timeout, "write", async move {
            stream.write_all(bytes).await?;
            stream.flush().await?;
            Ok::<_, io::Error>(bytes.len())
        })
        .await
    }

    async fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let stream = &mut self.stream;
        with_timeout(self.io_timeout, "read", async move {
            stream.read_exact(buf).await?;
            Ok::<_, io::Error>(())
        })
        .await
    }
}

async fn with_timeout<T, F>(limit: Option<Duration>, op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    let res = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| LumberjackError::Timeout(op))?,
        None => fut.await,
    };
    res.map_err(map_io_error)
}

fn map_io_error(e: io::Error) -> LumberjackError {
    match e.kind() {
        // EOF mid-read, or the peer stopped accepting bytes.
        io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => {
            LumberjackError::ConnectionClosed
        }
        _ => LumberjackError::Io(e),
    }
}
