//! Connection supervisor.
//!
//! Drives one connection at a time through
//! `Idle → Connecting → Authenticating → Subscribing → Streaming → Closing`,
//! and from `Closing` either back to `Connecting` after the reconnect delay
//! or to `Terminated` once shutdown has been requested.

use crate::config::ConnectionTarget;
use crate::retry::ReconnectPolicy;
use crate::traits::{MeasurementSink, MessageTransport};
use crate::transport::Session;
use crate::{handshake, stream, ConnectorError, ConnectorMetrics};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle state of the supervised connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Authenticating,
    Subscribing,
    Streaming,
    Closing,
    Terminated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Closing => "closing",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Owns the session and reconnects it until shutdown
pub struct Supervisor {
    target: ConnectionTarget,
    policy: ReconnectPolicy,
    sink: Arc<dyn MeasurementSink>,
    metrics: Arc<ConnectorMetrics>,
    shutdown: CancellationToken,
    session: Option<Session>,
    attempts: u64,
}

impl Supervisor {
    pub fn new(
        target: ConnectionTarget,
        policy: ReconnectPolicy,
        sink: Arc<dyn MeasurementSink>,
        metrics: Arc<ConnectorMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            target,
            policy,
            sink,
            metrics,
            shutdown,
            session: None,
            attempts: 0,
        }
    }

    /// Run the state machine until it terminates
    pub async fn run(mut self) {
        let mut state = ConnectionState::Idle;

        while state != ConnectionState::Terminated {
            let next = self.transition(state).await;
            debug!("connection state {} -> {}", state, next);
            state = next;
        }

        info!("FEMS supervisor stopped after {} connection attempt(s)", self.attempts);
    }

    /// Perform the work of `state` and return the state that follows
    pub async fn transition(&mut self, state: ConnectionState) -> ConnectionState {
        match state {
            ConnectionState::Idle => ConnectionState::Connecting,
            ConnectionState::Connecting => self.connect().await,
            ConnectionState::Authenticating => {
                let Some(session) = self.session.as_mut() else {
                    return ConnectionState::Closing;
                };
                if handshake::authenticate(session, self.target.password()).await {
                    ConnectionState::Subscribing
                } else {
                    ConnectionState::Closing
                }
            }
            ConnectionState::Subscribing => {
                let Some(session) = self.session.as_mut() else {
                    return ConnectionState::Closing;
                };
                if handshake::subscribe(session, self.target.channels()).await {
                    ConnectionState::Streaming
                } else {
                    ConnectionState::Closing
                }
            }
            ConnectionState::Streaming => {
                if let Some(session) = self.session.as_mut() {
                    stream::run(session, self.sink.as_ref(), &self.metrics).await;
                }
                ConnectionState::Closing
            }
            ConnectionState::Closing => self.back_off().await,
            ConnectionState::Terminated => ConnectionState::Terminated,
        }
    }

    async fn connect(&mut self) -> ConnectionState {
        self.attempts += 1;
        self.metrics.record_connect_attempt();

        match Session::open(self.target.endpoint(), self.shutdown.clone()).await {
            Ok(session) => {
                self.session = Some(session);
                self.metrics.set_connected(true);
                ConnectionState::Authenticating
            }
            Err(ConnectorError::Closed) => ConnectionState::Closing,
            Err(e) => {
                error!("dial: {}", e);
                ConnectionState::Closing
            }
        }
    }

    /// Close whatever session is left, then wait out the reconnect delay
    async fn back_off(&mut self) -> ConnectionState {
        self.cleanup().await;

        if self.shutdown.is_cancelled() {
            return ConnectionState::Terminated;
        }

        let wait = self.policy.delay();
        warn!("Connection failure reconnecting in {:?}", wait);

        tokio::select! {
            _ = self.shutdown.cancelled() => ConnectionState::Terminated,
            _ = tokio::time::sleep(wait) => ConnectionState::Connecting,
        }
    }

    async fn cleanup(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        self.metrics.set_connected(false);
    }
}
