//! JSON-lines output for measurement batches

use async_trait::async_trait;
use fems_connect_core::{Fields, Measurement, MeasurementSink};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::error;

/// Writes one JSON object per batch, newline separated
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> MeasurementSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn add_fields(&self, source: &str, fields: Fields) {
        let mut line = Measurement::new(source, fields).to_json().to_string();
        line.push('\n');

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            error!("Failed to write measurement: {}", e);
            return;
        }
        if let Err(e) = writer.flush().await {
            error!("Failed to flush measurement: {}", e);
        }
    }
}
