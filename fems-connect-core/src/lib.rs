//! # FEMS Connect Core
//!
//! Streaming client for the JSON-RPC websocket of a FEMS (OpenEMS) edge.
//!
//! The client keeps one websocket open to the edge, logs in, subscribes to a
//! configured list of channels and turns every push event into a
//! measurement batch for a downstream sink. Any failure along the way closes
//! the connection and, after a fixed delay, starts over.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fems_connect_core::{FemsConfig, FemsRuntime, Fields, MeasurementSink};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct PrintSink;
//!
//! #[async_trait]
//! impl MeasurementSink for PrintSink {
//!     async fn add_fields(&self, source: &str, fields: Fields) {
//!         println!("{}: {:?}", source, fields);
//!     }
//! }
//!
//! # async fn example() -> fems_connect_core::ConnectorResult<()> {
//! let config = FemsConfig {
//!     url: "192.168.1.20:8085".to_string(),
//!     channels: vec!["_sum/GridActivePower".to_string()],
//!     ..FemsConfig::default()
//! };
//!
//! let mut runtime = FemsRuntime::new(&config)?;
//! runtime.start(Arc::new(PrintSink))?;
//! // ...
//! runtime.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection lifecycle
//!
//! `Idle → Connecting → Authenticating → Subscribing → Streaming → Closing`,
//! then back to `Connecting` after the reconnect delay, or `Terminated` once
//! [`FemsRuntime::stop`] was called. Stopping cancels whatever socket
//! operation is in flight.

mod config;
mod error;
pub mod handshake;
mod message;
mod metrics;
pub mod rpc;
mod retry;
mod runtime;
pub mod stream;
mod traits;
mod transport;

#[cfg(test)]
mod testing;

// Re-export public API
pub use config::{ConnectionTarget, FemsConfig, DEFAULT_PASSWORD};
pub use error::{ConnectorError, ConnectorResult};
pub use message::{
    EdgeRpcParams, Fields, Measurement, MeasurementBatch, PushEvent, PushPayload, SOURCE_NAME,
};
pub use crate::metrics::{ConnectorMetrics, MetricsSnapshot};
pub use retry::{ReconnectPolicy, DEFAULT_RECONNECT_DELAY};
pub use rpc::{RpcErrorBody, RpcRequest, RpcResponse};
pub use runtime::{ConnectionState, FemsRuntime, Supervisor};
pub use traits::{MeasurementSink, MessageTransport};
pub use transport::Session;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
