//! Interactive client runtime.
//!
//! This crate puts the core protocol on a tokio runtime: socket halves
//! (websocket or in-memory), the [`Connection`] with its read loop and call
//! correlation, the inbound [`Dispatcher`], the discovery seam and strict
//! YAML configuration. It is consumed by the `interactive-tail` binary and
//! by integration tests.

pub mod config;
pub mod connection;
pub mod discovery;
pub mod dispatch;
pub mod transport;

pub use config::ClientConfig;
pub use connection::{CallOptions, Connection, ConnectionOptions, ConnectionState, IncomingCall};
pub use discovery::{Discovery, StaticDiscovery};
pub use dispatch::{handler_fn, CallHandler, Dispatcher};
