//! Client metrics.
//!
//! Values are published through the `metrics` facade, so they reach whatever
//! recorder the embedding process installs. A local copy of the counters is
//! kept for [`ConnectorMetrics::snapshot`].

use metrics::{counter, gauge};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters for one client instance
#[derive(Debug)]
pub struct ConnectorMetrics {
    connector: String,
    connect_attempts: AtomicU64,
    batches: AtomicU64,
    fields: AtomicU64,
    missing_channels: AtomicU64,
    empty_events: AtomicU64,
    malformed_events: AtomicU64,
    connected: AtomicBool,
}

/// Point-in-time copy of [`ConnectorMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connect_attempts: u64,
    pub batches: u64,
    pub fields: u64,
    pub missing_channels: u64,
    pub empty_events: u64,
    pub malformed_events: u64,
    pub connected: bool,
}

impl ConnectorMetrics {
    pub fn new(connector_name: &str) -> Self {
        Self {
            connector: connector_name.to_string(),
            connect_attempts: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            fields: AtomicU64::new(0),
            missing_channels: AtomicU64::new(0),
            empty_events: AtomicU64::new(0),
            malformed_events: AtomicU64::new(0),
            connected: AtomicBool::new(false),
        }
    }

    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
        counter!("fems_connect_attempts_total", "connector" => self.connector.clone()).increment(1);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
        gauge!("fems_connected", "connector" => self.connector.clone())
            .set(if connected { 1.0 } else { 0.0 });
    }

    /// One batch handed to the sink
    pub fn record_batch(&self, field_count: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.fields.fetch_add(field_count as u64, Ordering::Relaxed);
        counter!("fems_batches_total", "connector" => self.connector.clone()).increment(1);
        counter!("fems_fields_total", "connector" => self.connector.clone())
            .increment(field_count as u64);
    }

    /// A channel reported as null
    pub fn record_missing_channel(&self) {
        self.missing_channels.fetch_add(1, Ordering::Relaxed);
        counter!("fems_missing_channels_total", "connector" => self.connector.clone()).increment(1);
    }

    /// A push event left with no values after dropping nulls
    pub fn record_empty_event(&self) {
        self.empty_events.fetch_add(1, Ordering::Relaxed);
        counter!("fems_empty_events_total", "connector" => self.connector.clone()).increment(1);
    }

    /// A push event that could not be decoded
    pub fn record_malformed_event(&self) {
        self.malformed_events.fetch_add(1, Ordering::Relaxed);
        counter!("fems_malformed_events_total", "connector" => self.connector.clone()).increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            fields: self.fields.load(Ordering::Relaxed),
            missing_channels: self.missing_channels.load(Ordering::Relaxed),
            empty_events: self.empty_events.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            connected: self.connected.load(Ordering::Relaxed),
        }
    }
}
