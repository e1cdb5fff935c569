//! Print channel values from a FEMS edge
//!
//! Usage:
//!   FEMS_URL=192.168.1.20:8085 \
//!   FEMS_CHANNELS=_sum/EssSoc,_sum/GridActivePower \
//!   cargo run --example print_channels

use fems_connect_core::{ConnectorResult, FemsConfig, FemsRuntime, Measurement};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> ConnectorResult<()> {
    // Load configuration from environment, with a local edge as fallback
    let mut config = FemsConfig::from_env().unwrap_or_else(|_| {
        println!("Using default configuration for testing");
        println!("To use custom settings, set environment variables:");
        println!("  FEMS_URL (default: localhost:8085)");
        println!("  FEMS_CHANNELS (default: _sum/EssSoc)");
        println!();

        FemsConfig::default()
    });

    if config.channels.is_empty() {
        config.channels = vec!["_sum/EssSoc".to_string()];
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Measurement>();

    let mut runtime = FemsRuntime::new(&config)?;
    runtime.start(Arc::new(tx))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(measurement) = rx.recv() => {
                println!("{}", measurement.to_json());
            }
        }
    }

    runtime.stop().await;
    Ok(())
}
