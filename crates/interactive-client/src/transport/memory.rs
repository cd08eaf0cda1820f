//! In-memory socket pair.
//!
//! [`pair`] returns the two halves a [`Connection`](crate::Connection) needs
//! plus a [`MemoryPeer`] that plays the server: it sees every frame the
//! client writes and can push frames back.

use async_trait::async_trait;
use tokio::sync::mpsc;

use interactive_core::encoding::Frame;
use interactive_core::error::{InteractiveError, Result};

use super::socket::{SocketReader, SocketWriter};

/// Client write half.
#[derive(Debug)]
pub struct MemoryWriter {
    tx: Option<mpsc::UnboundedSender<Frame>>,
}

/// Client read half.
#[derive(Debug)]
pub struct MemoryReader {
    rx: mpsc::UnboundedReceiver<Frame>,
}

/// Server side of the pair.
#[derive(Debug)]
pub struct MemoryPeer {
    tx: Option<mpsc::UnboundedSender<Frame>>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

/// Connected socket halves and their peer.
pub fn pair() -> (MemoryWriter, MemoryReader, MemoryPeer) {
    let (client_tx, peer_rx) = mpsc::unbounded_channel();
    let (peer_tx, client_rx) = mpsc::unbounded_channel();
    (
        MemoryWriter { tx: Some(client_tx) },
        MemoryReader { rx: client_rx },
        MemoryPeer {
            tx: Some(peer_tx),
            rx: peer_rx,
        },
    )
}

#[async_trait]
impl SocketWriter for MemoryWriter {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(InteractiveError::ConnectionClosed)?;
        tx.send(frame)
            .map_err(|_| InteractiveError::Socket("memory peer is gone".into()))
    }

    async fn close(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }
}

#[async_trait]
impl SocketReader for MemoryReader {
    async fn recv(&mut self) -> Option<Result<Frame>> {
        self.rx.recv().await.map(Ok)
    }
}

impl MemoryPeer {
    /// Push a frame to the client.
    pub fn send(&self, frame: Frame) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(InteractiveError::ConnectionClosed)?;
        tx.send(frame)
            .map_err(|_| InteractiveError::Socket("memory client is gone".into()))
    }

    /// Push a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Frame::Text(text.into()))
    }

    /// Next frame written by the client, `None` once the client closed.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Frame already written by the client, if any.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// Close the server side. The client reader observes end of stream.
    pub fn close(&mut self) {
        self.tx = None;
    }
}
