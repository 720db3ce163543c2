//! Collector - a minimal Lumberjack v1 receiver.
//!
//! Accepts connections, inflates compressed frames, logs every record and
//! acknowledges each data frame as soon as it is decoded.
//!
//! # Running
//!
//! ```text
//! RUST_LOG=info cargo run --example collector -- 5043
//! ```

use lumberjack_client::protocol::{encode_ack_frame, Frame, FrameBuffer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::args()
        .nth(1)
        .map(|p| p.parse())
        .transpose()?
        .unwrap_or(5043);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Collector listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        tokio::spawn(async move {
            match serve(socket).await {
                Ok(records) => tracing::info!(%peer, records, "Session closed"),
                Err(e) => tracing::warn!(%peer, "Session failed: {}", e),
            }
        });
    }
}

async fn serve(mut socket: TcpStream) -> lumberjack_client::Result<u64> {
    let mut buffer = FrameBuffer::new().inflating();
    let mut buf = vec![0u8; 64 * 1024];
    let mut records = 0;

    loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(records);
        }

        for frame in buffer.push(&buf[..n])? {
            match frame {
                Frame::Window { window_size } => {
                    tracing::info!(window_size, "New session");
                }
                Frame::Data { sequence, pairs } => {
                    records += 1;
                    tracing::info!(sequence, ?pairs, "Record");
                    socket.write_all(&encode_ack_frame(sequence)).await?;
                }
                other => {
                    tracing::warn!(frame_type = ?other.frame_type(), "Ignoring unexpected frame");
                }
            }
        }
    }
}
