//! FEMS Source Connector
//!
//! Streams channel values from a FEMS edge and prints every measurement
//! batch as a JSON line on stdout, ready to be piped into a collector.

mod sink;

use anyhow::Context;
use fems_connect_core::{FemsConfig, FemsRuntime};
use sink::JsonLinesSink;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = FemsConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.log_level);

    tracing::info!("Starting FEMS Source Connector");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Connector: {}", config.connector_name);

    // Create and run the runtime
    let mut runtime = FemsRuntime::new(&config).context("Invalid FEMS configuration")?;
    let sink = Arc::new(JsonLinesSink::new(tokio::io::stdout()));

    // Run until shutdown signal
    runtime.run_until_shutdown(sink).await?;

    tracing::info!("FEMS Source Connector stopped");
    Ok(())
}

/// Initialize tracing/logging
///
/// Logs go to stderr so stdout carries only measurements.
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}
