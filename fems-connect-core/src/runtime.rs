//! Runtime for managing the client lifecycle.
//!
//! The runtime handles:
//! - Configuration validation before anything touches the network
//! - Spawning the connection supervisor on a background task
//! - Shutdown: cancelling the supervisor and waiting for it to tear down
//!
//! Data is push driven, so [`FemsRuntime::gather`] has nothing to do.

mod supervisor;

pub use supervisor::{ConnectionState, Supervisor};

use crate::config::{ConnectionTarget, FemsConfig};
use crate::retry::ReconnectPolicy;
use crate::traits::MeasurementSink;
use crate::{ConnectorError, ConnectorMetrics, ConnectorResult};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runtime for the FEMS input (FEMS edge → sink)
pub struct FemsRuntime {
    target: ConnectionTarget,
    policy: ReconnectPolicy,
    metrics: Arc<ConnectorMetrics>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FemsRuntime {
    /// Create a new runtime, failing on invalid configuration
    pub fn new(config: &FemsConfig) -> ConnectorResult<Self> {
        let target = config.target()?;

        info!("Initializing FEMS Runtime");
        info!("Connector: {}", config.connector_name);
        info!("FEMS endpoint: {}", target.endpoint());
        info!("Channels: {:?}", target.channels());

        Ok(Self {
            target,
            policy: ReconnectPolicy::fixed(config.reconnect_delay()),
            metrics: Arc::new(ConnectorMetrics::new(&config.connector_name)),
            shutdown: CancellationToken::new(),
            task: None,
        })
    }

    /// Spawn the connection supervisor feeding `sink`
    pub fn start(&mut self, sink: Arc<dyn MeasurementSink>) -> ConnectorResult<()> {
        if self.is_running() {
            return Err(ConnectorError::config("FEMS runtime already running"));
        }

        info!("Start");
        self.shutdown = CancellationToken::new();

        let supervisor = Supervisor::new(
            self.target.clone(),
            self.policy,
            sink,
            self.metrics.clone(),
            self.shutdown.clone(),
        );
        self.task = Some(tokio::spawn(supervisor.run()));

        Ok(())
    }

    /// Request shutdown and wait for the supervisor to finish
    ///
    /// Any socket operation in flight fails immediately. Calling `stop` on a
    /// runtime that is not running is a no-op.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        info!("Stop");
        self.shutdown.cancel();

        if let Err(e) = task.await {
            error!("FEMS supervisor task failed: {}", e);
        }
    }

    /// Pull-based collection hook; all data arrives through push events
    pub fn gather(&self) -> ConnectorResult<()> {
        Ok(())
    }

    /// Whether a supervisor task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn metrics(&self) -> Arc<ConnectorMetrics> {
        self.metrics.clone()
    }

    /// Start, wait for Ctrl-C, then stop
    pub async fn run_until_shutdown(&mut self, sink: Arc<dyn MeasurementSink>) -> ConnectorResult<()> {
        self.start(sink)?;

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }

        self.stop().await;
        info!("FEMS Runtime stopped");
        Ok(())
    }
}

impl Drop for FemsRuntime {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
