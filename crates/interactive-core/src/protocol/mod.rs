//! Protocol modules (envelopes + varint framing).
//!
//! - Envelopes: JSON `method` / `reply` messages, one object or a batch array
//!   per frame.
//! - Varint: little-endian base-128 length prefix used by compressed frames.
//!
//! All parsers are panic-free: malformed input is reported as
//! `InteractiveError` instead of panicking or indexing raw buffers.

pub mod envelope;
pub mod varint;

pub use envelope::{decode_packets, Envelope, Method, Reply, HELLO_METHOD};
