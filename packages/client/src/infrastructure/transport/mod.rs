//! Transport Adapter.
//!
//! [`TransportAdapter`] owns a concrete [`BrokerLink`] and gives the layer
//! above a broker-agnostic view: connection-state events, inbound message
//! events, idempotent subscriptions and QoS 1 publishing. Subscriptions are
//! remembered and replayed on every (re)connect before `Connected` is
//! reported, because brokers forget them when a connection drops.

pub mod memory;
pub mod websocket;

use std::{
    collections::{BTreeSet, VecDeque},
    fmt, future,
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time;

use crate::domain::Publisher;

pub use memory::{MemoryBroker, MemoryLink};
pub use websocket::WsLink;

/// Transport errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The broker could not be reached or refused the connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation needs an open connection
    #[error("not connected to the broker")]
    NotConnected,

    /// A frame could not be sent on an open connection
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Lost,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Lost => "lost",
        };
        f.write_str(label)
    }
}

/// Delivery guarantee requested for a publish. Only levels >= 1 exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    pub fn level(&self) -> u8 {
        match self {
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

/// A raw delivery from the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Events surfaced by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(ConnectionState),
    Message(InboundFrame),
}

/// A concrete pub/sub client.
///
/// Delivery is at-least-once and may be duplicated or reordered.
#[async_trait]
pub trait BrokerLink: Send {
    /// Open a fresh connection, replacing any previous one.
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Close the connection. Closing a closed link is a no-op.
    async fn close(&mut self);

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    async fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS)
    -> Result<(), TransportError>;

    /// Wait for the next delivery. `None` once the connection is gone.
    async fn recv(&mut self) -> Option<InboundFrame>;
}

/// Broker-agnostic transport with subscription replay
pub struct TransportAdapter<L: BrokerLink> {
    link: L,
    state: ConnectionState,
    subscriptions: BTreeSet<String>,
    pending: VecDeque<TransportEvent>,
}

impl<L: BrokerLink> TransportAdapter<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: ConnectionState::Disconnected,
            subscriptions: BTreeSet::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Topics that are replayed on every connect.
    pub fn subscriptions(&self) -> &BTreeSet<String> {
        &self.subscriptions
    }

    /// Connect (or reconnect) and replay every remembered subscription.
    ///
    /// `Connected` is reported only after the replay succeeded. On failure
    /// the link is closed, the state becomes `Disconnected` and the error is
    /// returned.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.set_state(ConnectionState::Connecting);
        let result = self.open_and_resubscribe().await;
        self.finish_connect(result).await
    }

    /// Same as [`connect`](Self::connect), but an attempt that has not
    /// completed within `limit` fails with `ConnectionFailed`.
    pub async fn connect_within(&mut self, limit: Duration) -> Result<(), TransportError> {
        self.set_state(ConnectionState::Connecting);
        let result = match time::timeout(limit, self.open_and_resubscribe()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::ConnectionFailed(format!(
                "timed out after {limit:?}"
            ))),
        };
        self.finish_connect(result).await
    }

    async fn finish_connect(
        &mut self,
        result: Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        if let Err(e) = result {
            tracing::warn!("Broker connection failed: {}", e);
            self.link.close().await;
            self.set_state(ConnectionState::Disconnected);
            return Err(e);
        }

        tracing::info!(
            "Connected to broker ({} subscriptions restored)",
            self.subscriptions.len()
        );
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    async fn open_and_resubscribe(&mut self) -> Result<(), TransportError> {
        self.link.open().await?;
        for topic in &self.subscriptions {
            self.link.subscribe(topic).await?;
            tracing::debug!("Subscribed to '{}'", topic);
        }
        Ok(())
    }

    /// Close the link and report `Disconnected`.
    pub async fn disconnect(&mut self) {
        self.link.close().await;
        if self.state != ConnectionState::Disconnected {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Subscribe to a topic. Subscribing twice is a no-op.
    ///
    /// While disconnected the topic is only remembered; it is sent to the
    /// broker on the next connect.
    pub async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.subscriptions.insert(topic.to_string()) {
            return Ok(());
        }
        if self.is_connected() {
            self.link.subscribe(topic).await?;
            tracing::debug!("Subscribed to '{}'", topic);
        }
        Ok(())
    }

    /// Publish a payload. Reports only whether the local send went through.
    pub async fn publish_with(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.link.publish(topic, payload, qos).await
    }

    /// Next transport event.
    ///
    /// Queued state changes come first. While connected this waits on the
    /// link; a closed link turns into `StateChanged(Lost)`. While not
    /// connected and nothing is queued the future never resolves.
    pub async fn next_event(&mut self) -> TransportEvent {
        if let Some(event) = self.pending.pop_front() {
            return event;
        }
        if !self.is_connected() {
            return future::pending().await;
        }
        match self.link.recv().await {
            Some(frame) => TransportEvent::Message(frame),
            None => {
                tracing::warn!("Broker connection lost");
                self.link.close().await;
                self.state = ConnectionState::Lost;
                TransportEvent::StateChanged(ConnectionState::Lost)
            }
        }
    }

    /// Whether [`next_event`](Self::next_event) can make progress.
    pub fn has_events(&self) -> bool {
        !self.pending.is_empty() || self.is_connected()
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.pending.push_back(TransportEvent::StateChanged(state));
    }
}

#[async_trait]
impl<L: BrokerLink> Publisher for TransportAdapter<L> {
    async fn publish(&mut self, topic: String, payload: Vec<u8>) -> Result<(), TransportError> {
        self.publish_with(&topic, &payload, QoS::AtLeastOnce).await
    }
}
