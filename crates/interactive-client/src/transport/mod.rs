//! Transport layer.
//!
//! Socket halves (websocket or in-memory) and the codec that turns an inbound
//! frame into envelopes once, before the connection routes them.

pub mod codec;
pub mod memory;
pub mod socket;
pub mod ws;

pub use socket::{SocketReader, SocketWriter};
