//! Loopback WebSocket tests for the kernel channel.
//!
//! A local tungstenite acceptor stands in for the gateway's
//! `/api/kernels/{id}/channels` endpoint.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use gateway_client::{ChannelState, KernelChannel};
use gateway_messages::execute_request;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn test_execute_request_roundtrip() {
    init_logging();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gateway = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();

        // The execute request arrives verbatim.
        let frame = socket.next().await.unwrap().unwrap();
        let text = frame.into_text().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["header"]["msg_type"], "execute_request");
        assert_eq!(value["header"]["session"], "sess-1");
        assert_eq!(value["content"]["code"], "1 + 1");
        assert_eq!(value["content"]["allow_stdin"], true);
        assert_eq!(value["channel"], "shell");

        // Reply with a stream output on iopub, parented to the request.
        let reply = serde_json::json!({
            "header": {
                "date": "2026-02-11T09:15:02.114Z",
                "msg_id": "reply-1",
                "msg_type": "stream",
                "session": "sess-1",
                "username": "kernel",
                "version": "5.3"
            },
            "parent_header": value["header"],
            "metadata": {},
            "content": {"name": "stdout", "text": "2\n"},
            "buffers": [],
            "channel": "iopub"
        });
        socket
            .send(Message::Text(reply.to_string()))
            .await
            .unwrap();
    });

    let url = Url::parse(&format!(
        "ws://{addr}/api/kernels/k-1/channels?session_id=sess-1"
    ))
    .unwrap();

    let mut channel = KernelChannel::new();
    channel.open(&url).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);

    let request = execute_request("1 + 1", "sess-1", "tester", None);
    let sent_msg_id = request.header.msg_id.clone();
    channel.send(&request).unwrap();

    let mut inbound = channel.take_inbound().expect("inbound hook");
    let envelope = inbound.recv().await.expect("inbound frame");
    assert_eq!(envelope.header.msg_type, "stream");
    assert_eq!(
        envelope.parent_header.expect("parent header").msg_id,
        sent_msg_id
    );

    gateway.await.unwrap();
    channel.close();
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn test_reopening_replaces_the_previous_transport() {
    init_logging();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gateway = tokio::spawn(async move {
        // Accept two consecutive connections; the first should be dropped
        // when the channel reopens.
        for _ in 0..2 {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            // Hold until the peer disconnects.
            while let Some(frame) = socket.next().await {
                if frame.is_err() {
                    break;
                }
            }
        }
    });

    let url = Url::parse(&format!(
        "ws://{addr}/api/kernels/k-1/channels?session_id=sess-1"
    ))
    .unwrap();

    let mut channel = KernelChannel::new();
    channel.open(&url).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);

    channel.open(&url).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);
    channel
        .send(&execute_request("pass", "sess-1", "tester", None))
        .unwrap();

    channel.close();
    drop(channel);
    gateway.abort();
}

#[tokio::test]
async fn test_gateway_hangup_right_after_open_ends_closed() {
    init_logging();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gateway = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let socket = accept_async(stream).await.unwrap();
        // Hang up immediately after the handshake.
        drop(socket);
    });

    let url = Url::parse(&format!(
        "ws://{addr}/api/kernels/k-1/channels?session_id=sess-1"
    ))
    .unwrap();

    let mut channel = KernelChannel::new();
    channel.open(&url).await.unwrap();
    gateway.await.unwrap();

    // The reader notices the hangup and stamps Closed; that stamp must
    // stick - the open transition may never overwrite it back to Open.
    for _ in 0..100 {
        if channel.state() == ChannelState::Closed {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(channel.state(), ChannelState::Closed);
    assert!(channel
        .send(&execute_request("pass", "sess-1", "tester", None))
        .is_err());
}
