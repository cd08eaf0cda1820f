use std::time::Duration;

use serde::Deserialize;

use interactive_core::encoding::{Scheme, DEFAULT_GZIP_LEVEL};
use interactive_core::error::{InteractiveError, Result};

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Header naming the project version to join.
pub const PROJECT_VERSION_HEADER: &str = "X-Interactive-Version";
/// Header carrying the project share code.
pub const SHARECODE_HEADER: &str = "X-Interactive-Sharecode";
/// Header announcing the protocol version.
pub const PROTOCOL_VERSION_HEADER: &str = "X-Protocol-Version";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(InteractiveError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.connection.validate()?;

        Ok(())
    }

    /// Headers sent with the websocket upgrade request.
    pub fn handshake_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![(
            PROTOCOL_VERSION_HEADER.to_string(),
            self.connection.protocol_version.clone(),
        )];
        if let Some(token) = &self.auth.authorization {
            headers.push((AUTHORIZATION_HEADER.to_string(), token.clone()));
        }
        if let Some(id) = self.auth.project_version_id {
            headers.push((PROJECT_VERSION_HEADER.to_string(), id.to_string()));
        }
        if let Some(code) = &self.auth.project_sharecode {
            headers.push((SHARECODE_HEADER.to_string(), code.clone()));
        }
        headers
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            connection: ConnectionSection::default(),
            auth: AuthSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    /// Websocket URL. Optional when the address comes from discovery.
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// Scheme negotiated right after the handshake.
    #[serde(default)]
    pub compression: Scheme,

    #[serde(default = "default_gzip_level")]
    pub gzip_level: u32,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            address: None,
            protocol_version: default_protocol_version(),
            call_timeout_ms: default_call_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            compression: Scheme::default(),
            gzip_level: default_gzip_level(),
        }
    }
}

impl ConnectionSection {
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version.trim().is_empty() {
            return Err(InteractiveError::Config(
                "connection.protocol_version must not be empty".into(),
            ));
        }
        if !(100..=600000).contains(&self.call_timeout_ms) {
            return Err(InteractiveError::Config(
                "connection.call_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if !(100..=600000).contains(&self.handshake_timeout_ms) {
            return Err(InteractiveError::Config(
                "connection.handshake_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if self.gzip_level > 9 {
            return Err(InteractiveError::Config(
                "connection.gzip_level must be between 0 and 9".into(),
            ));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

fn default_protocol_version() -> String {
    "2.0".into()
}
fn default_call_timeout_ms() -> u64 {
    10000
}
fn default_handshake_timeout_ms() -> u64 {
    10000
}
fn default_gzip_level() -> u32 {
    DEFAULT_GZIP_LEVEL
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Full `Authorization` header value, e.g. `Bearer <token>`.
    #[serde(default)]
    pub authorization: Option<String>,

    #[serde(default)]
    pub project_version_id: Option<u64>,

    #[serde(default)]
    pub project_sharecode: Option<String>,
}
