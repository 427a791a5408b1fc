//! Repository trait（ドメイン層が定義するデータアクセスの抽象）

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    entity::{BrokerStats, Connection},
    error::RepositoryError,
    value_object::{ConnectionId, Timestamp, Topic},
};

/// Connection and subscription storage.
///
/// `sender` is the outbound channel of a connection's WebSocket task; it
/// carries serialized relay frames.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn add_connection(
        &self,
        id: ConnectionId,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError>;

    async fn remove_connection(&self, id: &ConnectionId) -> Result<Connection, RepositoryError>;

    async fn subscribe(&self, id: &ConnectionId, topic: Topic) -> Result<bool, RepositoryError>;

    async fn unsubscribe(&self, id: &ConnectionId, topic: &Topic)
    -> Result<bool, RepositoryError>;

    /// Outbound channels of every subscriber of `topic`
    async fn subscriber_senders(&self, topic: &Topic)
    -> Vec<(ConnectionId, UnboundedSender<String>)>;

    async fn stats(&self) -> BrokerStats;
}
