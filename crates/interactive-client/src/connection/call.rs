use std::fmt;

use serde_json::Value;

use interactive_core::error::Result;
use interactive_core::protocol::{Method, Reply};

use super::Connection;

/// Server-initiated method taken off the inbound queue.
///
/// Holds a handle to its connection so it can be answered in place.
#[derive(Clone)]
pub struct IncomingCall {
    conn: Connection,
    method: Method,
}

impl IncomingCall {
    pub(crate) fn new(conn: Connection, method: Method) -> Self {
        Self { conn, method }
    }

    pub fn name(&self) -> &str {
        &self.method.method
    }

    pub fn params(&self) -> &Value {
        &self.method.params
    }

    pub fn id(&self) -> u64 {
        self.method.id
    }

    /// `true` when the peer expects no reply.
    pub fn discard(&self) -> bool {
        self.method.discard
    }

    pub fn envelope(&self) -> &Method {
        &self.method
    }

    pub fn into_envelope(self) -> Method {
        self.method
    }

    /// Answer with a result. No-op for discard calls.
    pub async fn reply_result(&self, result: Value) -> Result<()> {
        if self.skip_reply() {
            return Ok(());
        }
        self.conn.reply(Reply::ok(self.method.id, result)).await
    }

    /// Answer with an error payload. No-op for discard calls.
    pub async fn reply_error(&self, error: Value) -> Result<()> {
        if self.skip_reply() {
            return Ok(());
        }
        self.conn.reply(Reply::err(self.method.id, error)).await
    }

    fn skip_reply(&self) -> bool {
        if self.method.discard {
            tracing::debug!(method = %self.method.method, "reply to discard call skipped");
        }
        self.method.discard
    }
}

impl fmt::Debug for IncomingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingCall")
            .field("method", &self.method)
            .finish()
    }
}
