use crate::error::{InteractiveError, Result};

use super::{Encoding, Frame};

/// Pass-through encoding: frames are sent as websocket text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoding;

impl Encoding for TextEncoding {
    fn name(&self) -> &'static str {
        "text"
    }

    fn encode(&mut self, plaintext: &str) -> Result<Frame> {
        Ok(Frame::Text(plaintext.to_owned()))
    }

    fn decode(&mut self, data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec())
            .map_err(|e| InteractiveError::Codec(format!("text frame is not utf-8: {e}")))
    }
}
