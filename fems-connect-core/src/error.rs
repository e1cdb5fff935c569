//! Error types for the FEMS client.
//!
//! Errors fall into four groups:
//! - **Configuration**: fatal, surfaced before any connection attempt
//! - **Transport**: connect/send/receive failures, recovered by reconnecting
//! - **Protocol**: malformed or uncorrelated responses and server-side RPC errors
//! - **Data**: push events that cannot be decoded, skipped without dropping the connection

use std::error::Error as StdError;
use thiserror::Error;

/// Result type used throughout the crate
pub type ConnectorResult<T> = Result<T, ConnectorError>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors raised by the FEMS client
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The websocket could not be opened
    #[error("Connect failed: {message}")]
    Connect {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Writing a frame to the websocket failed
    #[error("Send failed: {message}")]
    Send {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Reading a frame from the websocket failed
    #[error("Receive failed: {message}")]
    Receive {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The session has been closed, either locally or by shutdown
    #[error("Connection closed")]
    Closed,

    /// The peer answered with something we did not ask for
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The peer answered the request with an error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A frame could not be decoded
    #[error("Invalid data: {message}")]
    InvalidData { message: String, payload: Vec<u8> },

    /// A value could not be encoded for the wire
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ConnectorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a connect error carrying the underlying cause
    pub fn connect_with_source<E>(msg: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Connect {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a send error carrying the underlying cause
    pub fn send_with_source<E>(msg: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Send {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a receive error carrying the underlying cause
    pub fn receive_with_source<E>(msg: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Receive {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a receive error without an underlying cause
    pub fn receive(msg: impl Into<String>) -> Self {
        Self::Receive {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an invalid data error keeping the raw frame for diagnosis
    pub fn invalid_data(msg: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::InvalidData {
            message: msg.into(),
            payload: payload.into(),
        }
    }

    /// Whether the error came from the socket itself
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Send { .. } | Self::Receive { .. } | Self::Closed
        )
    }

    /// Whether the error is a startup configuration problem
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The raw frame attached to an invalid data error, lossily decoded
    pub fn payload_lossy(&self) -> Option<String> {
        match self {
            Self::InvalidData { payload, .. } => Some(String::from_utf8_lossy(payload).into_owned()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ConnectorError::Closed.is_transport());
        assert!(ConnectorError::receive("eof").is_transport());
        assert!(!ConnectorError::protocol("bad id").is_transport());
        assert!(ConnectorError::config("missing url").is_configuration());
        assert!(!ConnectorError::Rpc {
            code: 1,
            message: "bad password".to_string()
        }
        .is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = ConnectorError::Rpc {
            code: 1,
            message: "bad password".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error 1: bad password");
        assert_eq!(
            ConnectorError::config("FEMS URL missing").to_string(),
            "Configuration error: FEMS URL missing"
        );
    }

    #[test]
    fn test_invalid_data_keeps_payload() {
        let err = ConnectorError::invalid_data("not json", "{oops");
        assert_eq!(err.payload_lossy().as_deref(), Some("{oops"));
        assert_eq!(ConnectorError::Closed.payload_lossy(), None);
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ConnectorError::connect_with_source("dial ws://localhost:8085", io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("ws://localhost:8085"));
    }
}
