//! # Transport Strategies
//!
//! The connection seam between the supervisor and the outside world. The
//! strategy is chosen exactly once, at client construction: a usable
//! collector endpoint selects [`WsTransport`]; anything else degrades to
//! [`LogSink`], which consumes records at the same cadence with zero network
//! activity so the producer is unaffected either way.

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

/// Failures raised inside the transport layer.
///
/// These never cross into the producer context; the supervisor converts every
/// one of them into a reconnect attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
}

/// A one-way pipe for serialized state records.
///
/// `connect` establishes (or re-establishes) the underlying channel, `send`
/// transmits one record, and `close` tears the channel down before a
/// reconnect or shutdown. Implementations report failure through
/// [`TransportError`] so the supervisor can react; they never panic.
#[async_trait]
pub trait Transport: Send {
    /// Opens the underlying channel. Called before streaming begins and
    /// again after every disconnect.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Transmits one serialized record.
    async fn send(&mut self, payload: String) -> Result<(), TransportError>;

    /// Closes the underlying channel, if any. Infallible by contract.
    async fn close(&mut self);

    /// Short label for log lines.
    fn describe(&self) -> &'static str;
}

/// Persistent WebSocket connection to the collector.
pub struct WsTransport {
    url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WsTransport {
    /// `url` must already be validated as a `ws`/`wss` endpoint; see
    /// [`StreamClient::new`](super::client::StreamClient::new).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: None,
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        log::info!("connecting to collector: {}", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        log::info!("connected to collector");
        self.stream = Some(ws_stream);
        Ok(())
    }

    async fn send(&mut self, payload: String) -> Result<(), TransportError> {
        let ws_stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::Send("not connected".to_string()))?;
        ws_stream
            .send(WsMessage::Text(payload.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(mut ws_stream) = self.stream.take() {
            let _ = ws_stream.close(None).await;
        }
    }

    fn describe(&self) -> &'static str {
        "websocket"
    }
}

/// Degraded local sink used when no collector endpoint is available.
///
/// Every record is written through the `log` facade instead of the network,
/// preserving the consumption cadence and the supervisor contract.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl Transport for LogSink {
    async fn connect(&mut self) -> Result<(), TransportError> {
        log::info!("log sink active: state records will be logged, not transmitted");
        Ok(())
    }

    async fn send(&mut self, payload: String) -> Result<(), TransportError> {
        log::info!("send: {payload}");
        Ok(())
    }

    async fn close(&mut self) {}

    fn describe(&self) -> &'static str {
        "log-sink"
    }
}
