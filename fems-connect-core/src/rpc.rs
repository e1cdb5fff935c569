//! JSON-RPC envelopes spoken by the FEMS edge websocket.
//!
//! Every request carries a fresh UUID v4 id. The peer echoes the id in its
//! response, which is how a response is correlated with the request that
//! triggered it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const JSONRPC_VERSION: &str = "2.0";

pub const AUTHENTICATE_METHOD: &str = "authenticateWithPassword";
pub const SUBSCRIBE_CHANNELS_METHOD: &str = "subscribeChannels";
pub const EDGE_RPC_METHOD: &str = "edgeRpc";

/// Edge id of the local FEMS. The server expects a string here.
pub const LOCAL_EDGE_ID: &str = "0";

/// Outgoing request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: String,
    pub params: Value,
}

impl RpcRequest {
    /// Build a request with a fresh id
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            id: Uuid::new_v4().to_string(),
            params,
        }
    }

    /// `authenticateWithPassword` request
    pub fn authenticate(password: &str) -> Self {
        Self::new(AUTHENTICATE_METHOD, json!({ "password": password }))
    }

    /// `subscribeChannels` request wrapped in an `edgeRpc` envelope
    ///
    /// The peer answers the outer envelope, so the outer id is the one to
    /// correlate against.
    pub fn subscribe_channels(channels: &[String]) -> Self {
        let inner = Self::new(
            SUBSCRIBE_CHANNELS_METHOD,
            json!({ "count": 0, "channels": channels }),
        );

        Self::new(
            EDGE_RPC_METHOD,
            json!({ "edgeId": LOCAL_EDGE_ID, "payload": inner }),
        )
    }
}

/// Error object returned by the peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Incoming response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

impl RpcResponse {
    /// True only if this response answers the request with `expected_id`
    pub fn matches(&self, expected_id: &str) -> bool {
        self.id == expected_id
    }
}
