//! Ship - send a batch of log records to a collector.
//!
//! This example demonstrates:
//! - Connecting with the builder and custom transport options
//! - Writing typed events with `write_serialized`
//! - Reconnecting after a transport failure
//!
//! # Running
//!
//! Start the collector first, then:
//!
//! ```text
//! RUST_LOG=debug cargo run --example ship -- 127.0.0.1 5043 100
//! ```

use std::time::Duration;

use lumberjack_client::{Client, ClientBuilder, TcpTransport, TransportOptions};
use serde::Serialize;

/// One access log line.
#[derive(Serialize, Debug)]
struct AccessLog {
    message: String,
    status: u16,
    latency_ms: f64,
    host: Host,
}

#[derive(Serialize, Debug)]
struct Host {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().map(|p| p.parse()).transpose()?.unwrap_or(5043);
    let count: u32 = args.next().map(|c| c.parse()).transpose()?.unwrap_or(10);

    let options = TransportOptions::new(host, port)
        .connection_timeout(Duration::from_secs(5))
        .socket_timeout(Duration::from_secs(10));

    let mut client = ClientBuilder::new()
        .window_size(100)
        .connect(options)
        .await?;

    for i in 0..count {
        let event = AccessLog {
            message: format!("GET /items/{} HTTP/1.1", i),
            status: 200,
            latency_ms: 3.5 + f64::from(i % 7),
            host: Host {
                name: "web-1".to_string(),
            },
        };

        if let Err(e) = client.write_serialized(&event).await {
            if !e.is_transport_failure() {
                return Err(e.into());
            }
            // The frame is lost with the old session; resend it on a new one.
            tracing::warn!("Write failed ({}), reconnecting", e);
            client = restart(client).await?;
            client.write_serialized(&event).await?;
        }
    }

    tracing::info!(
        sent = client.sequence(),
        acked = client.last_ack(),
        "Done"
    );
    client.into_inner().disconnect().await?;
    Ok(())
}

async fn restart(client: Client<TcpTransport>) -> lumberjack_client::Result<Client<TcpTransport>> {
    let window_size = client.window_size();
    let mut transport = client.into_inner();
    transport.reconnect().await?;
    ClientBuilder::new()
        .window_size(window_size)
        .start(transport)
        .await
}
