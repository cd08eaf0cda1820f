//! Decode-once inbound codec.
//!
//! - Text frames are plaintext and bypass the active encoding.
//! - Binary frames go through the active encoding exactly once.
//! - The resulting plaintext is parsed into envelopes (single or batched).
//!
//! The two steps stay separate because they fail differently: a codec error
//! triggers the text fallback, a protocol error only drops the frame.

use interactive_core::encoding::{Encoding, Frame};
use interactive_core::error::Result;
use interactive_core::protocol::{decode_packets, Envelope};

/// Plaintext carried by an inbound frame.
pub fn plaintext(frame: Frame, encoding: &mut dyn Encoding) -> Result<String> {
    match frame {
        Frame::Text(s) => Ok(s),
        Frame::Binary(b) => encoding.decode(&b),
    }
}

/// Envelopes carried by one plaintext frame, in order.
pub fn envelopes(text: &str) -> Result<Vec<Envelope>> {
    decode_packets(text)
}
