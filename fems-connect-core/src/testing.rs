//! In-memory transport and log capture for unit tests.

use crate::rpc::RpcRequest;
use crate::traits::MessageTransport;
use crate::{ConnectorError, ConnectorResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Reply produced from the last frame the client sent
pub(crate) type Reply = Box<dyn FnOnce(Option<&str>) -> ConnectorResult<String> + Send>;

/// Transport that answers from a script and records what was sent
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub replies: VecDeque<Reply>,
    pub sent: Vec<String>,
    pub fail_send: bool,
    pub shutdown: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fixed frame
    pub fn push_frame(&mut self, frame: impl Into<String>) -> &mut Self {
        let frame = frame.into();
        self.replies.push_back(Box::new(move |_: Option<&str>| Ok(frame)));
        self
    }

    /// Queue a read failure
    pub fn push_error(&mut self, err: ConnectorError) -> &mut Self {
        self.replies.push_back(Box::new(move |_: Option<&str>| Err(err)));
        self
    }

    /// Queue a response echoing the id of the last request sent
    pub fn push_echo(&mut self, error: Option<(i64, &str)>) -> &mut Self {
        let error = error.map(|(code, message)| serde_json::json!({"code": code, "message": message}));
        self.replies.push_back(Box::new(move |last: Option<&str>| {
            let request: RpcRequest = serde_json::from_str(last.unwrap_or("{}"))
                .map_err(|e| ConnectorError::protocol(e.to_string()))?;
            Ok(serde_json::json!({"jsonrpc": "2.0", "id": request.id, "error": error}).to_string())
        }));
        self
    }

    /// Requests decoded from the sent frames
    pub fn sent_requests(&self) -> Vec<RpcRequest> {
        self.sent
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }
}

#[async_trait]
impl MessageTransport for ScriptedTransport {
    async fn send_text(&mut self, text: String) -> ConnectorResult<()> {
        if self.fail_send && self.shutdown {
            return Err(ConnectorError::Closed);
        }
        if self.fail_send {
            return Err(ConnectorError::Send {
                message: "broken pipe".to_string(),
                source: None,
            });
        }
        self.sent.push(text);
        Ok(())
    }

    async fn recv_message(&mut self) -> ConnectorResult<String> {
        match self.replies.pop_front() {
            Some(reply) => reply(self.sent.last().map(String::as_str)),
            None => Err(ConnectorError::receive("script exhausted")),
        }
    }

    async fn close(&mut self) {}

    fn shutdown_requested(&self) -> bool {
        self.shutdown
    }
}

/// Formatted log output collected for the current thread
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events here until the guard drops
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Number of times `needle` was logged
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(self.0.clone())
    }
}

pub(crate) struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
