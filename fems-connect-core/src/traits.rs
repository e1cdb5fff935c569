//! Seams between the client and the outside world.

use crate::message::{Fields, Measurement};
use crate::ConnectorResult;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// A duplex text-message connection
///
/// Implemented by [`Session`](crate::Session) for the websocket. Each
/// operation may block until data arrives, the peer fails, or the shutdown
/// signal closes the connection underneath it.
#[async_trait]
pub trait MessageTransport: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> ConnectorResult<()>;

    /// Serialize `value` and send it as one text frame
    async fn send_json<V>(&mut self, value: &V) -> ConnectorResult<()>
    where
        V: Serialize + Sync,
    {
        let text = serde_json::to_string(value)?;
        self.send_text(text).await
    }

    /// Wait for the next data frame
    async fn recv_message(&mut self) -> ConnectorResult<String>;

    /// Close the connection. Safe to call more than once.
    async fn close(&mut self);

    /// Whether the owner asked the client to stop
    fn shutdown_requested(&self) -> bool;
}

/// Downstream accumulator receiving measurement batches
///
/// Called once per push event that carried at least one non-null channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementSink: Send + Sync {
    async fn add_fields(&self, source: &str, fields: Fields);
}

#[async_trait]
impl MeasurementSink for mpsc::UnboundedSender<Measurement> {
    async fn add_fields(&self, source: &str, fields: Fields) {
        if self.send(Measurement::new(source, fields)).is_err() {
            debug!("Measurement receiver dropped, discarding batch");
        }
    }
}
