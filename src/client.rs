//! Client builder and send path.
//!
//! The [`ClientBuilder`] configures the window size and encoder. The
//! [`Client`] manages one session over a transport:
//! 1. Advertise the window size (once, before any data)
//! 2. For each record: take the next sequence, encode a compressed frame
//! 3. If the window is full, read ACK frames until it has room
//! 4. Send the frame
//!
//! # Example
//!
//! ```no_run
//! use lumberjack_client::{Client, TransportOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::builder()
//!         .window_size(1000)
//!         .connect(TransportOptions::new("logs.local", 5043))
//!         .await?;
//!
//!     client
//!         .write_serialized(&json!({"message": "hello", "host": {"name": "web-1"}}))
//!         .await?;
//!     Ok(())
//! }
//! ```

use serde::Serialize;

use crate::codec::{to_record, Record};
use crate::error::{LumberjackError, Result};
use crate::protocol::{
    encode_window_frame, Encoder, FrameEncoder, FrameType, SequenceWindow, DEFAULT_WINDOW_SIZE,
    PREFIX_SIZE,
};
use crate::transport::{TcpTransport, TlsTransport, Transport, TransportOptions};

/// Builder for configuring and creating a Lumberjack client.
#[derive(Debug)]
pub struct ClientBuilder<E = FrameEncoder> {
    window_size: u32,
    encoder: E,
}

impl ClientBuilder<FrameEncoder> {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            encoder: FrameEncoder::new(),
        }
    }

    /// Set the zlib level for compressed frames (0-9, higher values are
    /// clamped to 9).
    ///
    /// Default: 6
    pub fn compression_level(mut self, level: u32) -> Self {
        self.encoder = FrameEncoder::with_compression_level(level);
        self
    }
}

impl<E: Encoder> ClientBuilder<E> {
    /// Set the maximum number of unacknowledged frames.
    ///
    /// Default: 5000
    pub fn window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    /// Replace the frame encoder.
    pub fn encoder<E2: Encoder>(self, encoder: E2) -> ClientBuilder<E2> {
        ClientBuilder {
            window_size: self.window_size,
            encoder,
        }
    }

    /// Start a session over an already connected transport.
    ///
    /// Sends the window frame before returning.
    pub async fn start<T: Transport>(self, transport: T) -> Result<Client<T, E>> {
        Client::with_encoder(transport, self.encoder, self.window_size).await
    }

    /// Connect to a collector over TCP and start a session.
    pub async fn connect(self, options: TransportOptions) -> Result<Client<TcpTransport, E>> {
        if self.window_size == 0 {
            return Err(zero_window());
        }
        let mut transport = TcpTransport::new(options).await?;
        if !transport.is_connected() {
            transport.connect().await?;
        }
        self.start(transport).await
    }

    /// Connect to a collector over TLS and start a session.
    ///
    /// `options` must carry a `tls_ca_file`.
    pub async fn connect_tls(self, options: TransportOptions) -> Result<Client<TlsTransport, E>> {
        if self.window_size == 0 {
            return Err(zero_window());
        }
        let mut transport = TlsTransport::new(options).await?;
        if !transport.is_connected() {
            transport.connect().await?;
        }
        self.start(transport).await
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One Lumberjack session over a transport.
///
/// Sequence and window state start at zero and are not carried across
/// sessions. A client is a single writer: every operation takes
/// `&mut self`.
#[derive(Debug)]
pub struct Client<T, E = FrameEncoder> {
    transport: T,
    encoder: E,
    window: SequenceWindow,
}

impl Client<TcpTransport> {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// Start a session with the default encoder.
    pub async fn new(transport: T, window_size: u32) -> Result<Self> {
        Self::with_encoder(transport, FrameEncoder::new(), window_size).await
    }
}

impl<T: Transport, E: Encoder> Client<T, E> {
    /// Start a session: send the window frame and reset the sequence.
    ///
    /// # Errors
    ///
    /// Fails on a zero window size or if the window frame cannot be sent.
    pub async fn with_encoder(mut transport: T, encoder: E, window_size: u32) -> Result<Self> {
        if window_size == 0 {
            return Err(zero_window());
        }

        transport.send(&encode_window_frame(window_size)).await?;
        tracing::debug!(window_size, "Sent window frame");

        Ok(Self {
            transport,
            encoder,
            window: SequenceWindow::new(window_size),
        })
    }

    /// Send one record, returning the number of bytes written.
    ///
    /// Waits for ACKs first when the window is full. On failure the
    /// sequence number assigned to this record stays consumed.
    pub async fn write(&mut self, record: &Record) -> Result<usize> {
        let sequence = self.window.next();
        let frame = self.encoder.encode_compressed_frame(record, sequence)?;

        if self.window.is_window_full() {
            self.drain_acks().await?;
        }

        let written = self.transport.send(&frame).await?;
        tracing::trace!(sequence, bytes = written, "Sent frame");
        Ok(written)
    }

    /// Serialize `event` into a record and send it.
    pub async fn write_serialized<S: Serialize>(&mut self, event: &S) -> Result<usize> {
        let record = to_record(event)?;
        self.write(&record).await
    }

    /// Read ACK frames until the window has room.
    async fn drain_acks(&mut self) -> Result<()> {
        loop {
            let mut prefix = [0u8; PREFIX_SIZE];
            self.transport.recv_exact(&mut prefix).await?;

            let frame_type = prefix[1];
            if frame_type != FrameType::Ack.as_byte() {
                tracing::warn!(
                    "Expected ACK frame, got type {:#04x} (version {:#04x})",
                    frame_type,
                    prefix[0]
                );
                return Err(LumberjackError::ProtocolDesync { found: frame_type });
            }

            let mut raw = [0u8; 4];
            self.transport.recv_exact(&mut raw).await?;
            let ack = u32::from_be_bytes(raw);

            let sequence = self.window.sequence();
            if ack > sequence {
                tracing::warn!(ack, sequence, "ACK ahead of last sent sequence");
                return Err(LumberjackError::AckOutOfRange { ack, sequence });
            }

            self.window.record_ack(ack);
            tracing::debug!(ack, unacked = self.window.unacked_count(), "Received ACK");

            if !self.window.is_window_full() {
                return Ok(());
            }
        }
    }

    /// Last sequence number assigned.
    pub fn sequence(&self) -> u32 {
        self.window.sequence()
    }

    /// Highest sequence acknowledged by the collector.
    pub fn last_ack(&self) -> u32 {
        self.window.last_ack()
    }

    /// Configured window size.
    pub fn window_size(&self) -> u32 {
        self.window.window_size()
    }

    /// Frames sent before the latest one and not yet acknowledged.
    pub fn unacked(&self) -> i64 {
        self.window.unacked_count()
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// End the session and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

fn zero_window() -> LumberjackError {
    LumberjackError::InvalidConfig("window_size must be greater than 0".to_string())
}
