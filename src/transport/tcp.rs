//! TCP transport with an explicit connection lifecycle.
//!
//! The transport never reconnects on its own. A failed send or read
//! leaves the decision to the caller, who can call
//! [`TcpTransport::reconnect`] and start a new client session.
//!
//! # Example
//!
//! ```no_run
//! use lumberjack_client::transport::{TcpTransport, TransportOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lumberjack_client::Result<()> {
//! let transport = TcpTransport::new(TransportOptions::new("logs.local", 5043)).await?;
//! assert!(transport.is_connected());
//! # Ok(())
//! # }
//! ```

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::{StreamTransport, Transport, TransportOptions};
use crate::error::{LumberjackError, Result};

/// A TCP connection to a collector.
#[derive(Debug)]
pub struct TcpTransport {
    options: TransportOptions,
    stream: Option<StreamTransport<TcpStream>>,
}

impl TcpTransport {
    /// Validate `options` and, if `autoconnect` is set, connect.
    pub async fn new(options: TransportOptions) -> Result<Self> {
        options.validate()?;

        let mut transport = Self {
            options,
            stream: None,
        };
        if transport.options.autoconnect {
            transport.connect().await?;
        }
        Ok(transport)
    }

    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Fails if already connected, if the connection is refused, or if it
    /// is not established within `connection_timeout`.
    pub async fn connect(&mut self) -> Result<()> {
        let address = self.options.address();
        if self.stream.is_some() {
            return Err(LumberjackError::AlreadyConnected(address));
        }

        let stream = open_tcp(&self.options).await?;
        tracing::info!(%address, "Connected to collector");
        self.stream = Some(StreamTransport::with_timeout(
            stream,
            self.options.socket_timeout,
        ));
        Ok(())
    }

    /// Shut down and drop the connection. No-op when not connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.get_mut().shutdown().await?;
            tracing::info!(address = %self.options.address(), "Disconnected from collector");
        }
        Ok(())
    }

    /// Drop the current connection (if any) and open a new one.
    ///
    /// A failed shutdown of the old connection is logged and ignored; the
    /// socket is usually already broken when a reconnect is needed.
    pub async fn reconnect(&mut self) -> Result<()> {
        if let Err(e) = self.disconnect().await {
            tracing::debug!("Ignoring shutdown error before reconnect: {}", e);
        }
        self.connect().await
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The validated options.
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    fn stream_mut(&mut self) -> Result<&mut StreamTransport<TcpStream>> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(LumberjackError::NotConnected(self.options.address())),
        }
    }
}

/// Dial the collector within `connection_timeout` and apply `nodelay`.
pub(super) async fn open_tcp(options: &TransportOptions) -> Result<TcpStream> {
    let stream = tokio::time::timeout(
        options.connection_timeout,
        TcpStream::connect(options.address()),
    )
    .await
    .map_err(|_| LumberjackError::Timeout("connect"))??;
    stream.set_nodelay(options.nodelay)?;
    Ok(stream)
}

impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        self.stream_mut()?.send(bytes).await
    }

    async fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream_mut()?.recv_exact(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_autoconnect_and_send() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            sock.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut transport = TcpTransport::new(TransportOptions::new("127.0.0.1", port))
            .await
            .unwrap();
        assert!(transport.is_connected());
        assert_eq!(transport.send(b"ping").await.unwrap(), 4);
        assert_eq!(&server.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn test_not_connected_without_autoconnect() {
        let opts = TransportOptions::new("127.0.0.1", 5043).autoconnect(false);
        let mut transport = TcpTransport::new(opts).await.unwrap();
        assert!(!transport.is_connected());

        let err = transport.send(b"x").await.unwrap_err();
        assert!(matches!(err, LumberjackError::NotConnected(_)));
        assert!(err.to_string().contains("127.0.0.1:5043"));
    }

    #[tokio::test]
    async fn test_connect_twice_fails() {
        let (_listener, port) = listener().await;
        let mut transport = TcpTransport::new(TransportOptions::new("127.0.0.1", port))
            .await
            .unwrap();

        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, LumberjackError::AlreadyConnected(_)));
    }

    #[tokio::test]
    async fn test_disconnect_and_reconnect() {
        let (listener, port) = listener().await;
        let accepts = tokio::spawn(async move {
            let _first = listener.accept().await.unwrap();
            let _second = listener.accept().await.unwrap();
        });

        let mut transport = TcpTransport::new(TransportOptions::new("127.0.0.1", port))
            .await
            .unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
        transport.disconnect().await.unwrap();

        transport.reconnect().await.unwrap();
        assert!(transport.is_connected());
        accepts.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let err = TcpTransport::new(TransportOptions::new("127.0.0.1", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, LumberjackError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port with nothing listening.
        let (listener, port) = listener().await;
        drop(listener);

        let opts = TransportOptions::new("127.0.0.1", port)
            .connection_timeout(Duration::from_secs(1));
        let err = TcpTransport::new(opts).await.unwrap_err();
        assert!(err.is_transport_failure());
    }
}
