//! Streaming gzip encoding.
//!
//! Frame layout: `varint(decompressed_len) || gzip stream chunk`.
//!
//! One gzip stream spans the whole lifetime of the negotiated encoding in each
//! direction. The compressor sync-flushes after every message, so each frame
//! carries everything needed to inflate its own payload, but the stream
//! header only appears in the first frame and the deflate window is shared.
//! Both halves therefore keep state across calls.

use std::io::Write;

use bytes::BytesMut;
use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;

use crate::error::{InteractiveError, Result};
use crate::protocol::varint::{get_varint, put_varint, varint_len};

use super::{Encoding, Frame};

/// zlib's default level.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Gzip codec with persistent compressor and decompressor state.
pub struct GzipEncoding {
    level: u32,
    // Created on the first encode so the gzip header follows the first
    // length prefix instead of preceding it.
    encoder: Option<GzEncoder<Vec<u8>>>,
    decoder: GzDecoder<Vec<u8>>,
    // Inflated bytes not yet claimed by a length prefix.
    inflated: BytesMut,
}

impl GzipEncoding {
    pub fn new() -> Self {
        Self::with_level(DEFAULT_GZIP_LEVEL)
    }

    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
            encoder: None,
            decoder: GzDecoder::new(Vec::new()),
            inflated: BytesMut::new(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for GzipEncoding {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GzipEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipEncoding")
            .field("level", &self.level)
            .field("encoder_started", &self.encoder.is_some())
            .field("inflated", &self.inflated.len())
            .finish()
    }
}

fn codec_err(what: &str, e: std::io::Error) -> InteractiveError {
    InteractiveError::Codec(format!("gzip {what} failed: {e}"))
}

impl Encoding for GzipEncoding {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn encode(&mut self, plaintext: &str) -> Result<Frame> {
        let data = plaintext.as_bytes();
        let level = self.level;
        let encoder = self
            .encoder
            .get_or_insert_with(|| GzEncoder::new(Vec::new(), Compression::new(level)));

        encoder.write_all(data).map_err(|e| codec_err("write", e))?;
        encoder.flush().map_err(|e| codec_err("flush", e))?;
        let chunk = std::mem::take(encoder.get_mut());

        let len = data.len() as u64;
        let mut out = BytesMut::with_capacity(varint_len(len) + chunk.len());
        put_varint(&mut out, len);
        out.extend_from_slice(&chunk);
        Ok(Frame::Binary(out.freeze()))
    }

    fn decode(&mut self, data: &[u8]) -> Result<String> {
        let mut buf = data;
        let declared = usize::try_from(get_varint(&mut buf)?)
            .map_err(|_| InteractiveError::Codec("declared length exceeds usize".into()))?;

        self.decoder
            .write_all(buf)
            .map_err(|e| codec_err("inflate", e))?;
        self.decoder.flush().map_err(|e| codec_err("inflate flush", e))?;
        let out = std::mem::take(self.decoder.get_mut());
        self.inflated.extend_from_slice(&out);

        if self.inflated.len() < declared {
            return Err(InteractiveError::Codec(format!(
                "frame declared {declared} bytes but stream yielded {}",
                self.inflated.len()
            )));
        }

        let payload = self.inflated.split_to(declared);
        String::from_utf8(payload.to_vec())
            .map_err(|e| InteractiveError::Codec(format!("gzip payload is not utf-8: {e}")))
    }
}
