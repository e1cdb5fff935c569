//! Websocket session to the FEMS edge.
//!
//! A [`Session`] owns exactly one socket. It never retries; every failure is
//! returned to the caller as a [`ConnectorError`]. The shutdown token doubles
//! as the forced-close primitive: once cancelled, any operation that is
//! blocked on the socket returns [`ConnectorError::Closed`] and the socket is
//! dropped.

use crate::traits::MessageTransport;
use crate::{ConnectorError, ConnectorResult};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live connection plus the shutdown signal it observes
pub struct Session {
    endpoint: String,
    stream: Option<WsStream>,
    shutdown: CancellationToken,
}

impl Session {
    /// Dial `endpoint` (`ws://host:port`)
    pub async fn open(endpoint: &str, shutdown: CancellationToken) -> ConnectorResult<Self> {
        info!("Connecting to {}", endpoint);

        let connect = connect_async(endpoint);
        let (stream, _response) = tokio::select! {
            _ = shutdown.cancelled() => return Err(ConnectorError::Closed),
            result = connect => result.map_err(|e| {
                ConnectorError::connect_with_source(format!("dial {}", endpoint), e)
            })?,
        };

        debug!("Websocket handshake with {} complete", endpoint);

        Ok(Self {
            endpoint: endpoint.to_string(),
            stream: Some(stream),
            shutdown,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the socket is still held
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Drop the socket without the closing handshake, used when the peer
    /// can no longer be trusted to answer
    fn abandon(&mut self) {
        if self.stream.take().is_some() {
            info!("connection closed");
        }
    }
}

#[async_trait]
impl MessageTransport for Session {
    async fn send_text(&mut self, text: String) -> ConnectorResult<()> {
        let stream = self.stream.as_mut().ok_or(ConnectorError::Closed)?;
        trace!("FEMS TX: {} bytes", text.len());

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => Err(ConnectorError::Closed),
            sent = stream.send(Message::text(text)) => {
                sent.map_err(|e| ConnectorError::send_with_source("websocket write", e))
            }
        };

        if result.is_err() {
            self.abandon();
        }
        result
    }

    async fn recv_message(&mut self) -> ConnectorResult<String> {
        let result = loop {
            let stream = self.stream.as_mut().ok_or(ConnectorError::Closed)?;

            let next = tokio::select! {
                _ = self.shutdown.cancelled() => Err(ConnectorError::Closed),
                next = stream.next() => Ok(next),
            };

            let next = match next {
                Ok(next) => next,
                Err(e) => break Err(e),
            };

            match next {
                Some(Ok(Message::Text(text))) => break Ok(text.to_string()),
                Some(Ok(Message::Binary(bytes))) => {
                    break Ok(String::from_utf8_lossy(&bytes).into_owned())
                }
                Some(Ok(Message::Close(frame))) => {
                    break Err(ConnectorError::receive(format!(
                        "closed by peer: {:?}",
                        frame
                    )))
                }
                // tungstenite answers pings itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    break Err(ConnectorError::receive_with_source("websocket read", e))
                }
                None => break Err(ConnectorError::receive("stream ended")),
            }
        };

        if result.is_err() {
            self.abandon();
        }
        result
    }

    async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        if !self.shutdown.is_cancelled() {
            if let Err(e) = stream.close(None).await {
                debug!("Close handshake with {} failed: {}", self.endpoint, e);
            }
        }

        info!("connection closed");
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
