//! Wire envelopes (JSON).
//!
//! Every frame carries either a single envelope object or an array of them.
//! The `type` field discriminates `method` from `reply`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{InteractiveError, Result};

/// Method name the peer sends to complete the handshake.
pub const HELLO_METHOD: &str = "hello";

/// One wire-level message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// Request or notification.
    Method(Method),
    /// Answer to an earlier method.
    Reply(Reply),
}

impl Envelope {
    /// Sequence number carried by the envelope, if any.
    pub fn seq(&self) -> Option<u64> {
        match self {
            Envelope::Method(m) => m.seq,
            Envelope::Reply(r) => r.seq,
        }
    }

    /// Serialize to the plaintext wire form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| InteractiveError::Protocol(format!("envelope encode failed: {e}")))
    }
}

/// `method` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    /// Call id. Omitted by the peer for discard calls, in which case it is 0.
    #[serde(default)]
    pub id: u64,
    /// Method name.
    pub method: String,
    /// Arbitrary JSON parameters.
    #[serde(default)]
    pub params: Value,
    /// `true` when no reply is expected.
    #[serde(default)]
    pub discard: bool,
    /// Last sequence number observed by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl Method {
    pub fn is_hello(&self) -> bool {
        self.method == HELLO_METHOD
    }
}

/// `reply` envelope.
///
/// `result` and `error` keep key presence: a key sent as `null` decodes to
/// `Some(Value::Null)`, an absent key to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl Reply {
    /// Successful reply.
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
            seq: None,
        }
    }

    /// Failed reply.
    pub fn err(id: u64, error: Value) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
            seq: None,
        }
    }

    /// Collapse into the call outcome. The presence of `error` decides failure.
    pub fn into_outcome(self) -> Result<Value> {
        match self.error {
            Some(err) => Err(InteractiveError::Remote(err)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

fn present<'de, D>(d: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(d).map(Some)
}

/// Parse one plaintext frame into its envelopes, preserving order.
pub fn decode_packets(text: &str) -> Result<Vec<Envelope>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| InteractiveError::Protocol(format!("invalid envelope json: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| InteractiveError::Protocol(format!("invalid envelope: {e}")))
        })
        .collect()
}
