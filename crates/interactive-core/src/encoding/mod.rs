//! Wire encodings.
//!
//! An [`Encoding`] turns an outgoing plaintext JSON frame into wire bytes and
//! back. Both directions may fail with `InteractiveError::Codec`; the
//! connection treats that as a fallback signal rather than a fatal error.
//!
//! The scheme registry (`text`, `gzip`) must match the peer's. Unknown names
//! surface as `InteractiveError::UnknownScheme`.

mod gzip;
mod text;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::Deserialize;

use crate::error::{InteractiveError, Result};

pub use gzip::{GzipEncoding, DEFAULT_GZIP_LEVEL};
pub use text::TextEncoding;

/// One socket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame (already plaintext).
    Text(String),
    /// Binary frame (needs the active encoding to decode).
    Binary(Bytes),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(s) => s.len(),
            Frame::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Codec for application payloads.
pub trait Encoding: Send {
    /// Wire-negotiated scheme name.
    fn name(&self) -> &'static str;

    /// Encode one outgoing plaintext message.
    fn encode(&mut self, plaintext: &str) -> Result<Frame>;

    /// Decode one incoming binary frame.
    fn decode(&mut self, data: &[u8]) -> Result<String>;

    /// Whether this is the plain-text floor scheme.
    fn is_text(&self) -> bool {
        self.name() == Scheme::Text.name()
    }
}

impl fmt::Debug for dyn Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding").field("name", &self.name()).finish()
    }
}

/// Registered compression schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Text,
    Gzip,
}

impl Scheme {
    pub fn name(self) -> &'static str {
        match self {
            Scheme::Text => "text",
            Scheme::Gzip => "gzip",
        }
    }

    /// Fresh codec for this scheme.
    pub fn build(self, gzip_level: u32) -> Box<dyn Encoding> {
        match self {
            Scheme::Text => Box::new(TextEncoding),
            Scheme::Gzip => Box::new(GzipEncoding::with_level(gzip_level)),
        }
    }
}

impl FromStr for Scheme {
    type Err = InteractiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Scheme::Text),
            "gzip" => Ok(Scheme::Gzip),
            other => Err(InteractiveError::UnknownScheme(other.to_string())),
        }
    }
}

/// Build a codec for a registered scheme name.
pub fn from_name(name: &str, gzip_level: u32) -> Result<Box<dyn Encoding>> {
    Ok(name.parse::<Scheme>()?.build(gzip_level))
}
