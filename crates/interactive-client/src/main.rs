//! interactive-tail
//!
//! Connects with the YAML config, negotiates compression, and logs every
//! server-initiated method until the connection closes or Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use interactive_client::discovery::{Discovery, StaticDiscovery};
use interactive_client::config::ClientConfig;
use interactive_client::{config, handler_fn, Connection, Dispatcher};
use interactive_core::error::{InteractiveError, Result};

const CONFIG_ENV: &str = "INTERACTIVE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "interactive.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "interactive-tail failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;

    let discovery = discovery_for(&cfg)?;
    let conn = Connection::discover(discovery.as_ref(), &cfg).await?;
    tracing::info!(encoding = conn.encoding_name(), "interactive-tail connected");

    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.set_fallback(handler_fn("*", |call| async move {
        tracing::info!(
            method = %call.name(),
            id = call.id(),
            discard = call.discard(),
            params = %call.params(),
            "inbound method"
        );
        Ok(())
    }));
    let pump = Arc::clone(&dispatcher).pump_async(conn.clone());

    tokio::select! {
        _ = pump => tracing::info!("connection closed by peer"),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, closing");
            conn.close().await;
        }
    }
    Ok(())
}

/// The tail has no hosts listing of its own; it dials the configured address.
fn discovery_for(cfg: &ClientConfig) -> Result<Box<dyn Discovery>> {
    let address = cfg
        .connection
        .address
        .clone()
        .ok_or_else(|| InteractiveError::Config("connection.address is required".into()))?;
    Ok(Box::new(StaticDiscovery::new(address)))
}
