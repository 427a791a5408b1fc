//! In-process broker.
//!
//! [`MemoryBroker`] routes publishes to subscribed [`MemoryLink`]s inside
//! one process. Besides embedding, it can misbehave on purpose: refuse new
//! connections, drop every live connection, and deliver each message twice
//! to exercise at-least-once handling.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use super::{BrokerLink, InboundFrame, QoS, TransportError};

type ConnectionId = u64;

struct ConnectionEntry {
    sender: mpsc::UnboundedSender<InboundFrame>,
    topics: HashSet<String>,
}

struct BrokerState {
    next_id: ConnectionId,
    connections: HashMap<ConnectionId, ConnectionEntry>,
    available: bool,
    duplicate_deliveries: bool,
    open_attempts: usize,
}

impl BrokerState {
    fn route(&self, topic: &str, payload: &[u8]) -> usize {
        let copies = if self.duplicate_deliveries { 2 } else { 1 };
        let mut delivered = 0;
        for (id, entry) in &self.connections {
            if !entry.topics.contains(topic) {
                continue;
            }
            for _ in 0..copies {
                let frame = InboundFrame {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                };
                if entry.sender.send(frame).is_err() {
                    tracing::warn!("Failed to deliver '{}' to connection {}", topic, id);
                } else {
                    delivered += 1;
                }
            }
        }
        delivered
    }
}

/// In-process pub/sub broker (cheap to clone, clones share state)
#[derive(Clone)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                next_id: 0,
                connections: HashMap::new(),
                available: true,
                duplicate_deliveries: false,
                open_attempts: 0,
            })),
        }
    }

    /// Create a new, unconnected link to this broker.
    pub fn link(&self) -> MemoryLink {
        MemoryLink {
            state: self.state.clone(),
            connection: None,
        }
    }

    /// Accept or refuse new connections.
    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// Deliver every message twice.
    pub async fn set_duplicate_deliveries(&self, enabled: bool) {
        self.state.lock().await.duplicate_deliveries = enabled;
    }

    /// Drop every live connection, as a broker restart would.
    pub async fn drop_connections(&self) {
        let mut state = self.state.lock().await;
        let dropped = state.connections.len();
        state.connections.clear();
        tracing::debug!("Dropped {} memory broker connections", dropped);
    }

    /// Publish a raw payload as if some other client had sent it.
    pub async fn inject(&self, topic: &str, payload: &[u8]) -> usize {
        self.state.lock().await.route(topic, payload)
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let state = self.state.lock().await;
        state
            .connections
            .values()
            .filter(|entry| entry.topics.contains(topic))
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Number of `open` calls seen, successful or not.
    pub async fn open_attempts(&self) -> usize {
        self.state.lock().await.open_attempts
    }
}

/// Link to a [`MemoryBroker`]
pub struct MemoryLink {
    state: Arc<Mutex<BrokerState>>,
    connection: Option<(ConnectionId, mpsc::UnboundedReceiver<InboundFrame>)>,
}

impl MemoryLink {
    fn connection_id(&self) -> Result<ConnectionId, TransportError> {
        self.connection
            .as_ref()
            .map(|(id, _)| *id)
            .ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl BrokerLink for MemoryLink {
    async fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.open_attempts += 1;
        if let Some((old, _)) = self.connection.take() {
            state.connections.remove(&old);
        }
        if !state.available {
            return Err(TransportError::ConnectionFailed(
                "memory broker is unavailable".to_string(),
            ));
        }

        let id = state.next_id;
        state.next_id += 1;
        let (sender, receiver) = mpsc::unbounded_channel();
        state.connections.insert(
            id,
            ConnectionEntry {
                sender,
                topics: HashSet::new(),
            },
        );
        self.connection = Some((id, receiver));
        Ok(())
    }

    async fn close(&mut self) {
        if let Some((id, _)) = self.connection.take() {
            self.state.lock().await.connections.remove(&id);
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let id = self.connection_id()?;
        let mut state = self.state.lock().await;
        let entry = state
            .connections
            .get_mut(&id)
            .ok_or_else(|| TransportError::SendFailed("connection closed by broker".to_string()))?;
        entry.topics.insert(topic.to_string());
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        _qos: QoS,
    ) -> Result<(), TransportError> {
        let id = self.connection_id()?;
        let state = self.state.lock().await;
        if !state.connections.contains_key(&id) {
            return Err(TransportError::SendFailed(
                "connection closed by broker".to_string(),
            ));
        }
        let delivered = state.route(topic, payload);
        tracing::debug!("Routed '{}' to {} subscribers", topic, delivered);
        Ok(())
    }

    async fn recv(&mut self) -> Option<InboundFrame> {
        match self.connection.as_mut() {
            Some((_, receiver)) => receiver.recv().await,
            None => None,
        }
    }
}
