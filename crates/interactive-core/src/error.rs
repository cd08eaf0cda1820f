//! Shared error type across interactive crates.

use serde_json::Value;
use thiserror::Error;

/// Stable error codes (safe to match on, log, or surface to callers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Encoding or decoding a frame failed.
    Codec,
    /// Malformed or unexpected traffic from the peer.
    Protocol,
    /// The peer named a compression scheme we do not know.
    UnknownScheme,
    /// A call was not answered within its budget.
    Timeout,
    /// The peer replied with an error payload.
    Remote,
    /// The connection closed while work was outstanding.
    ConnectionClosed,
    /// The socket closed or failed before `hello` arrived.
    Handshake,
    /// Service discovery failed.
    Discovery,
    /// Discovery reported an empty server list.
    NoServersAvailable,
    /// A tracked field was assigned a value of the wrong shape.
    InvalidField,
    /// Raw socket failure.
    Socket,
    /// Invalid configuration.
    Config,
}

impl ErrorCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Codec => "CODEC",
            ErrorCode::Protocol => "PROTOCOL",
            ErrorCode::UnknownScheme => "UNKNOWN_SCHEME",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Remote => "REMOTE",
            ErrorCode::ConnectionClosed => "CONNECTION_CLOSED",
            ErrorCode::Handshake => "HANDSHAKE",
            ErrorCode::Discovery => "DISCOVERY",
            ErrorCode::NoServersAvailable => "NO_SERVERS_AVAILABLE",
            ErrorCode::InvalidField => "INVALID_FIELD",
            ErrorCode::Socket => "SOCKET",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, InteractiveError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum InteractiveError {
    #[error("codec: {0}")]
    Codec(String),
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("unknown compression scheme: {0}")]
    UnknownScheme(String),
    #[error("call timed out")]
    Timeout,
    #[error("remote error: {0}")]
    Remote(Value),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("discovery failed: {0}")]
    Discovery(String),
    #[error("no servers available")]
    NoServersAvailable,
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("socket: {0}")]
    Socket(String),
    #[error("config: {0}")]
    Config(String),
}

impl InteractiveError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            InteractiveError::Codec(_) => ErrorCode::Codec,
            InteractiveError::Protocol(_) => ErrorCode::Protocol,
            InteractiveError::UnknownScheme(_) => ErrorCode::UnknownScheme,
            InteractiveError::Timeout => ErrorCode::Timeout,
            InteractiveError::Remote(_) => ErrorCode::Remote,
            InteractiveError::ConnectionClosed => ErrorCode::ConnectionClosed,
            InteractiveError::Handshake(_) => ErrorCode::Handshake,
            InteractiveError::Discovery(_) => ErrorCode::Discovery,
            InteractiveError::NoServersAvailable => ErrorCode::NoServersAvailable,
            InteractiveError::InvalidField { .. } => ErrorCode::InvalidField,
            InteractiveError::Socket(_) => ErrorCode::Socket,
            InteractiveError::Config(_) => ErrorCode::Config,
        }
    }

    /// Remote error payload, when the peer replied with one.
    pub fn remote_payload(&self) -> Option<&Value> {
        match self {
            InteractiveError::Remote(v) => Some(v),
            _ => None,
        }
    }
}
