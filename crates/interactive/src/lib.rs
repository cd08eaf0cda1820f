//! Top-level facade crate for the interactive client.
//!
//! Re-exports the core protocol types and the client runtime so users can
//! depend on a single crate.

pub mod core {
    pub use interactive_core::*;
}

pub mod client {
    pub use interactive_client::*;
}

pub use interactive_client::{CallOptions, ClientConfig, Connection, Dispatcher, IncomingCall};
pub use interactive_core::{InteractiveError, Result};
