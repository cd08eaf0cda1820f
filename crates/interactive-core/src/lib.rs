//! interactive core: transport-agnostic protocol primitives, encodings, the
//! change-tracking model, and the shared error type.
//!
//! This crate defines the wire-level contracts shared by the client runtime
//! and any tooling that needs to speak the protocol. It intentionally carries
//! no socket or async-runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `InteractiveError`/`Result` so a
//! malformed frame from the peer never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod encoding;
pub mod error;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, InteractiveError, Result};
