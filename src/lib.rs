//! # lumberjack-client
//!
//! Rust client for the Lumberjack v1 log shipping protocol.
//!
//! Records (nested key/value maps) are flattened into dotted keys, encoded
//! as length-prefixed data frames, compressed with zlib and sent to a
//! collector. The client numbers every frame and waits for ACKs whenever
//! the configured window of unacknowledged frames is full.
//!
//! ## Architecture
//!
//! - **Codec**: record flattening, dotted-key lookup, zlib compression
//! - **Protocol**: frame layout, [`FrameEncoder`](protocol::FrameEncoder),
//!   [`SequenceWindow`](protocol::SequenceWindow)
//! - **Transport**: the byte stream (TCP, TLS, or any tokio stream)
//! - **Client**: the send path tying the three together
//!
//! ## Example
//!
//! ```no_run
//! use lumberjack_client::{Client, TransportOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> lumberjack_client::Result<()> {
//!     let mut client = Client::builder()
//!         .window_size(1000)
//!         .connect(TransportOptions::new("logs.local", 5043))
//!         .await?;
//!
//!     client.write_serialized(&json!({"message": "started"})).await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder};
pub use codec::Record;
pub use error::{LumberjackError, Result};
pub use transport::{StreamTransport, TcpTransport, TlsTransport, Transport, TransportOptions};
