//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout carries the response stream.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` directives if set, else `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("Invalid log filter {:?}: {}", level, e))
}

/// Install the global subscriber. Plain text by default, JSON when asked.
pub fn init_logging(level: &str, json_logs: bool) -> Result<()> {
    let filter = env_filter(level)?;

    if json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| anyhow!("Failed to install subscriber: {}", e))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| anyhow!("Failed to install subscriber: {}", e))
    }
}
