//! Raw bidirectional frame socket, split into halves so the read loop can own
//! the reader while callers share the writer.

use async_trait::async_trait;

use interactive_core::encoding::Frame;
use interactive_core::error::Result;

/// Write half.
#[async_trait]
pub trait SocketWriter: Send {
    /// Send one frame.
    async fn send(&mut self, frame: Frame) -> Result<()>;

    /// Close the socket. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Read half.
#[async_trait]
pub trait SocketReader: Send {
    /// Next data frame, or `None` once the socket has closed.
    async fn recv(&mut self) -> Option<Result<Frame>>;
}
