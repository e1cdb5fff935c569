//! Push event loop.
//!
//! After login and subscription the edge pushes channel values on its own.
//! Each frame becomes at most one measurement batch; a frame that cannot be
//! used is logged and skipped without touching the connection.

use crate::message::{MeasurementBatch, PushEvent, SOURCE_NAME};
use crate::traits::{MeasurementSink, MessageTransport};
use crate::ConnectorMetrics;
use tracing::{info, trace, warn};

/// Forward push events to `sink` until the connection fails or shutdown is requested
pub async fn run<T, S>(session: &mut T, sink: &S, metrics: &ConnectorMetrics)
where
    T: MessageTransport,
    S: MeasurementSink + ?Sized,
{
    loop {
        let raw = match session.recv_message().await {
            Ok(raw) => raw,
            Err(e) => {
                if !session.shutdown_requested() {
                    info!("read error: {}", e);
                }
                return;
            }
        };

        handle_frame(&raw, sink, metrics).await;
    }
}

/// Decode one frame and emit its batch. Returns whether a batch was emitted.
pub async fn handle_frame<S>(raw: &str, sink: &S, metrics: &ConnectorMetrics) -> bool
where
    S: MeasurementSink + ?Sized,
{
    let event = match PushEvent::decode(raw) {
        Ok(event) => event,
        Err(e) => {
            info!("{}. data was: {}", e, raw);
            metrics.record_malformed_event();
            return false;
        }
    };

    let batch = MeasurementBatch::from_event(event);
    trace!("FEMS RX: {:?}", batch.fields());

    for channel in batch.missing_channels() {
        warn!(
            "no data for channel '{}' received. This most likely means the channel does not exist.",
            channel
        );
        metrics.record_missing_channel();
    }

    if batch.is_empty() {
        warn!("No measurement data! Original message was: {}", raw);
        metrics.record_empty_event();
        return false;
    }

    metrics.record_batch(batch.len());
    sink.add_fields(SOURCE_NAME, batch.into_fields()).await;
    true
}
