//! End-to-end tests against a collector listening on a local TCP port.

use lumberjack_client::protocol::{encode_ack_frame, Frame, FrameBuffer};
use lumberjack_client::{Client, ClientBuilder, LumberjackError, TcpTransport, TransportOptions};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read frames until `data_frames` data frames have arrived, optionally
/// acking each one.
async fn collect(socket: &mut TcpStream, data_frames: usize, ack: bool) -> Vec<Frame> {
    let mut buffer = FrameBuffer::new().inflating();
    let mut frames = Vec::new();
    let mut seen = 0;
    let mut buf = [0u8; 8192];

    while seen < data_frames {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed after {} data frames", seen);
        for frame in buffer.push(&buf[..n]).unwrap() {
            if let Frame::Data { sequence, .. } = &frame {
                seen += 1;
                if ack {
                    socket.write_all(&encode_ack_frame(*sequence)).await.unwrap();
                }
            }
            frames.push(frame);
        }
    }
    frames
}

async fn bind() -> (TcpListener, TransportOptions) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, TransportOptions::new("127.0.0.1", port))
}

#[tokio::test]
async fn test_ship_records_over_tcp() {
    let (listener, options) = bind().await;
    let collector = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        collect(&mut socket, 10, true).await
    });

    let mut client = Client::builder()
        .window_size(2)
        .compression_level(1)
        .connect(options)
        .await
        .unwrap();
    for i in 0..10 {
        client
            .write_serialized(&json!({"line": i, "host": {"name": "web-1"}}))
            .await
            .unwrap();
    }
    let frames = collector.await.unwrap();

    assert_eq!(frames[0], Frame::Window { window_size: 2 });
    assert_eq!(frames.len(), 11);
    for (i, frame) in frames[1..].iter().enumerate() {
        assert_eq!(
            frame,
            &Frame::Data {
                sequence: i as u32 + 1,
                pairs: vec![
                    ("line".to_string(), i.to_string()),
                    ("host.name".to_string(), "web-1".to_string()),
                ],
            }
        );
    }
    assert_eq!(client.sequence(), 10);
    assert!(client.unacked() < 2);
}

#[tokio::test]
async fn test_reconnect_starts_new_session() {
    let (listener, options) = bind().await;
    let collector = tokio::spawn(async move {
        let (mut first, _) = listener.accept().await.unwrap();
        let before = collect(&mut first, 3, false).await;
        let (mut second, _) = listener.accept().await.unwrap();
        let after = collect(&mut second, 2, false).await;
        (before, after)
    });

    let mut client = ClientBuilder::new()
        .window_size(10)
        .connect(options)
        .await
        .unwrap();
    for i in 0..3 {
        client.write_serialized(&json!({"i": i})).await.unwrap();
    }

    let mut transport = client.into_inner();
    transport.reconnect().await.unwrap();
    assert!(transport.is_connected());

    let mut client = ClientBuilder::new()
        .window_size(10)
        .start(transport)
        .await
        .unwrap();
    assert_eq!(client.sequence(), 0);
    for i in 0..2 {
        client.write_serialized(&json!({"i": i})).await.unwrap();
    }

    let (before, after) = collector.await.unwrap();
    assert_eq!(before.len(), 4);
    assert_eq!(after[0], Frame::Window { window_size: 10 });
    assert!(matches!(after[1], Frame::Data { sequence: 1, .. }));
    assert!(matches!(after[2], Frame::Data { sequence: 2, .. }));
}

#[tokio::test]
async fn test_connect_refused_is_transport_failure() {
    let (listener, options) = bind().await;
    drop(listener);

    let err = ClientBuilder::new().connect(options).await.unwrap_err();
    assert!(err.is_transport_failure(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_zero_window_rejected_before_connecting() {
    let (_listener, options) = bind().await;
    let err = ClientBuilder::new()
        .window_size(0)
        .connect(options)
        .await
        .unwrap_err();
    assert!(matches!(err, LumberjackError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_manual_connect_lifecycle() {
    let (listener, options) = bind().await;
    let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

    let mut transport = TcpTransport::new(options.autoconnect(false)).await.unwrap();
    assert!(!transport.is_connected());

    transport.connect().await.unwrap();
    assert!(matches!(
        transport.connect().await,
        Err(LumberjackError::AlreadyConnected(_))
    ));

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
    drop(accept.await.unwrap());
}
