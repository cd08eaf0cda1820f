//! Scripted-peer helpers shared by the connection tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;

use interactive_client::transport::memory::{self, MemoryPeer};
use interactive_client::{Connection, ConnectionOptions};
use interactive_core::encoding::Frame;

pub const HELLO: &str = r#"{"type":"method","method":"hello","discard":true}"#;

/// Connection that already completed its handshake against a memory peer.
pub async fn open() -> (Connection, MemoryPeer) {
    open_with(ConnectionOptions::default()).await
}

pub async fn open_with(options: ConnectionOptions) -> (Connection, MemoryPeer) {
    let (writer, reader, peer) = memory::pair();
    let conn = Connection::new(writer, reader, options);
    peer.send_text(HELLO).unwrap();
    conn.connect().await.expect("handshake");
    (conn, peer)
}

/// Next frame the client wrote, within a second.
pub async fn next_frame(peer: &mut MemoryPeer) -> Frame {
    tokio::time::timeout(Duration::from_secs(1), peer.recv())
        .await
        .expect("client wrote nothing")
        .expect("client closed")
}

/// Next text frame the client wrote, parsed.
pub async fn next_json(peer: &mut MemoryPeer) -> Value {
    match next_frame(peer).await {
        Frame::Text(s) => serde_json::from_str(&s).unwrap(),
        Frame::Binary(b) => panic!("expected a text frame, got {} binary bytes", b.len()),
    }
}

/// Poll `cond` until it holds or a second passes.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
