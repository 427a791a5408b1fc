//! Core domain models for the relay broker.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::{
    error::RepositoryError,
    value_object::{ConnectionId, Timestamp, Topic},
};

/// A live client connection and the topics it listens on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub topics: BTreeSet<Topic>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            topics: BTreeSet::new(),
            connected_at,
        }
    }
}

/// Which connection listens on which exact topic.
///
/// Subscriptions live and die with their connection; nothing is retained
/// for clients that are gone.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionTable {
    connections: HashMap<ConnectionId, Connection>,
}

/// Aggregate broker counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    pub connections: usize,
    pub subscriptions: usize,
    /// Subscriber count per topic
    pub topics: BTreeMap<String, usize>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DuplicateConnection` if the id is taken
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), RepositoryError> {
        if self.connections.contains_key(&connection.id) {
            return Err(RepositoryError::DuplicateConnection(
                connection.id.to_string(),
            ));
        }
        self.connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Remove a connection together with its subscriptions
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Result<Connection, RepositoryError> {
        self.connections
            .remove(id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(id.to_string()))
    }

    /// Subscribe a connection to a topic. Returns `false` if it already was.
    pub fn subscribe(&mut self, id: &ConnectionId, topic: Topic) -> Result<bool, RepositoryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(id.to_string()))?;
        Ok(connection.topics.insert(topic))
    }

    /// Unsubscribe a connection from a topic. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: &ConnectionId, topic: &Topic) -> Result<bool, RepositoryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(id.to_string()))?;
        Ok(connection.topics.remove(topic))
    }

    /// Every connection subscribed to exactly `topic`, the publisher included.
    pub fn subscribers(&self, topic: &Topic) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|c| c.topics.contains(topic))
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn stats(&self) -> BrokerStats {
        let mut topics = BTreeMap::new();
        let mut subscriptions = 0;
        for connection in self.connections.values() {
            for topic in &connection.topics {
                *topics.entry(topic.as_str().to_string()).or_insert(0) += 1;
                subscriptions += 1;
            }
        }
        BrokerStats {
            connections: self.connections.len(),
            subscriptions,
            topics,
        }
    }
}
