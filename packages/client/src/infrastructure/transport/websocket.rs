//! WebSocket link to a `quizcast-broker` relay.
//!
//! Speaks the JSON relay frames from [`quizcast_shared::relay`] over a
//! tokio-tungstenite client connection.
//!
//! With keepalive enabled the link pings the broker every interval and
//! treats the connection as gone when nothing at all (not even a pong) has
//! arrived for one and a half intervals. Without it a peer that vanished
//! without closing the TCP connection would never be noticed.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use quizcast_shared::relay::RelayFrame;
use tokio::{
    net::TcpStream,
    time::{self, Instant},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

use super::{BrokerLink, InboundFrame, QoS, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Broker link over a WebSocket relay
pub struct WsLink {
    url: String,
    keepalive: Option<Duration>,
    writer: Option<SplitSink<WsStream, Message>>,
    reader: Option<SplitStream<WsStream>>,
    last_seen: Instant,
    next_ping: Instant,
}

impl WsLink {
    /// Create a link for a relay endpoint such as `ws://127.0.0.1:8080/ws`.
    ///
    /// Keepalive is off until [`with_keepalive`](Self::with_keepalive).
    pub fn new(url: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            url: url.into(),
            keepalive: None,
            writer: None,
            reader: None,
            last_seen: now,
            next_ping: now,
        }
    }

    /// Ping every `interval`; `None` disables keepalive.
    pub fn with_keepalive(mut self, interval: Option<Duration>) -> Self {
        self.keepalive = interval.filter(|i| !i.is_zero());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn keepalive(&self) -> Option<Duration> {
        self.keepalive
    }

    /// Next message from the broker. `None` once the connection is gone,
    /// including a keepalive timeout.
    async fn next_message(&mut self) -> Option<Message> {
        let Some(interval) = self.keepalive else {
            let reader = self.reader.as_mut()?;
            return into_message(reader.next().await);
        };

        loop {
            let dead_at = self.last_seen + interval * 3 / 2;
            let reader = self.reader.as_mut()?;
            match time::timeout_at(self.next_ping.min(dead_at), reader.next()).await {
                Ok(item) => {
                    self.last_seen = Instant::now();
                    return into_message(item);
                }
                Err(_) => {
                    let now = Instant::now();
                    if now >= dead_at {
                        tracing::warn!(
                            "No traffic from the broker for {:?}, dropping the link",
                            now - self.last_seen
                        );
                        return None;
                    }
                    self.next_ping = now + interval;
                    let writer = self.writer.as_mut()?;
                    if let Err(e) = writer.send(Message::Ping(Default::default())).await {
                        tracing::warn!("Keepalive ping failed: {}", e);
                        return None;
                    }
                }
            }
        }
    }

    async fn send_frame(&mut self, frame: &RelayFrame) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;
        let json = frame
            .to_json()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        writer
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl BrokerLink for WsLink {
    async fn open(&mut self) -> Result<(), TransportError> {
        self.close().await;
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let (writer, reader) = stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        let now = Instant::now();
        self.last_seen = now;
        if let Some(interval) = self.keepalive {
            self.next_ping = now + interval;
        }
        tracing::debug!("WebSocket link open to {}", self.url);
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            // best effort, the peer may already be gone
            let _ = writer.close().await;
        }
        self.reader = None;
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.send_frame(&RelayFrame::Subscribe {
            topic: topic.to_string(),
        })
        .await
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), TransportError> {
        let payload = String::from_utf8(payload.to_vec())
            .map_err(|_| TransportError::SendFailed("payload is not valid UTF-8".to_string()))?;
        self.send_frame(&RelayFrame::Publish {
            topic: topic.to_string(),
            payload,
            qos: qos.level(),
        })
        .await
    }

    async fn recv(&mut self) -> Option<InboundFrame> {
        while let Some(msg) = self.next_message().await {
            match msg {
                Message::Text(text) => match RelayFrame::from_json(text.as_str()) {
                    Ok(RelayFrame::Message { topic, payload }) => {
                        return Some(InboundFrame {
                            topic,
                            payload: payload.into_bytes(),
                        });
                    }
                    Ok(other) => {
                        tracing::debug!("Ignoring unexpected relay frame: {:?}", other);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse relay frame: {}", e);
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Broker closed the WebSocket");
                    return None;
                }
                // Pongs only refresh `last_seen`
                _ => {}
            }
        }
        None
    }
}

fn into_message(item: Option<Result<Message, tungstenite::Error>>) -> Option<Message> {
    match item? {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::warn!("WebSocket error: {}", e);
            None
        }
    }
}
