//! Push events received from the edge and the measurement records derived from them.

use crate::{ConnectorError, ConnectorResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Channel name → value mapping
pub type Fields = serde_json::Map<String, Value>;

/// Source tag every measurement batch is emitted under
pub const SOURCE_NAME: &str = "fems";

/// Unsolicited `edgeRpc` notification carrying current channel values
///
/// ```json
/// {"method":"edgeRpc","params":{"method":"currentData","payload":{"params":{"_sum/EssSoc":87}}}}
/// ```
///
/// Missing members decode as empty so that a well-formed but empty event is
/// reported as "no measurement data" rather than as a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    pub method: String,
    #[serde(default, rename = "params")]
    pub edge_rpc: EdgeRpcParams,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgeRpcParams {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub payload: PushPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub params: Option<Fields>,
}

impl PushEvent {
    /// Decode a raw text frame
    pub fn decode(raw: &str) -> ConnectorResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            ConnectorError::invalid_data(format!("could not parse received data: {}", e), raw)
        })
    }

    /// Channel values carried by the event
    pub fn into_params(self) -> Fields {
        self.edge_rpc.payload.params.unwrap_or_default()
    }
}

/// Non-null channel values of a single push event
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementBatch {
    fields: Fields,
    missing: Vec<String>,
}

impl MeasurementBatch {
    /// Split the event's values into measured fields and channels reported as null
    ///
    /// Only JSON `null` counts as missing; `0`, `false` and `""` are values.
    pub fn from_event(event: PushEvent) -> Self {
        let mut fields = event.into_params();
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(channel, _)| channel.clone())
            .collect();

        for channel in &missing {
            fields.remove(channel);
        }

        Self { fields, missing }
    }

    /// Channels the edge reported without data
    pub fn missing_channels(&self) -> &[String] {
        &self.missing
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

/// A measurement batch as handed to downstream pipelines
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub source: String,
    pub fields: Fields,
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    /// Stamp a batch with the current time
    pub fn new(source: impl Into<String>, fields: Fields) -> Self {
        Self {
            source: source.into(),
            fields,
            timestamp: Utc::now(),
        }
    }

    /// JSON representation: `{"name":..,"timestamp":..,"fields":{..}}`
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "name": self.source,
            "timestamp": self.timestamp.to_rfc3339(),
            "fields": self.fields,
        })
    }
}
