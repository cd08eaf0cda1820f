//! Server discovery boundary.
//!
//! The hosts listing is fetched elsewhere; this module only defines the
//! provider seam and how a listing body is interpreted.

use async_trait::async_trait;
use serde::Deserialize;

use interactive_core::error::{InteractiveError, Result};

/// Source of the websocket address to connect to.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn find(&self) -> Result<String>;
}

/// Always yields the same address.
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    address: String,
}

impl StaticDiscovery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn find(&self) -> Result<String> {
        Ok(self.address.clone())
    }
}

#[derive(Debug, Deserialize)]
struct HostEntry {
    address: String,
}

/// Pick the address from a hosts listing (`[{"address": ..}, ..]`).
/// The first entry wins.
pub fn select_address(body: &str) -> Result<String> {
    let hosts: Vec<HostEntry> = serde_json::from_str(body)
        .map_err(|e| InteractiveError::Discovery(format!("invalid hosts listing: {e}")))?;
    hosts
        .into_iter()
        .next()
        .map(|host| host.address)
        .ok_or(InteractiveError::NoServersAvailable)
}
