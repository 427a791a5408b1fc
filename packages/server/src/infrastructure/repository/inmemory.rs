//! InMemory Subscription Repository 実装
//!
//! ドメイン層が定義する SubscriptionRepository trait の具体的な実装。
//! 購読テーブル（ドメインモデル）と WebSocket の送信チャンネルを 1 つのロックで管理します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::domain::{
    BrokerStats, Connection, ConnectionId, RepositoryError, SubscriptionRepository,
    SubscriptionTable, Timestamp, Topic,
};

#[derive(Default)]
struct Inner {
    table: SubscriptionTable,
    senders: HashMap<ConnectionId, UnboundedSender<String>>,
}

/// インメモリ Subscription Repository 実装
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    inner: Mutex<Inner>,
}

impl InMemorySubscriptionRepository {
    /// 新しい InMemorySubscriptionRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn add_connection(
        &self,
        id: ConnectionId,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        inner
            .table
            .add_connection(Connection::new(id.clone(), connected_at))?;
        inner.senders.insert(id, sender);
        Ok(())
    }

    async fn remove_connection(&self, id: &ConnectionId) -> Result<Connection, RepositoryError> {
        let mut inner = self.inner.lock().await;
        inner.senders.remove(id);
        inner.table.remove_connection(id)
    }

    async fn subscribe(&self, id: &ConnectionId, topic: Topic) -> Result<bool, RepositoryError> {
        self.inner.lock().await.table.subscribe(id, topic)
    }

    async fn unsubscribe(
        &self,
        id: &ConnectionId,
        topic: &Topic,
    ) -> Result<bool, RepositoryError> {
        self.inner.lock().await.table.unsubscribe(id, topic)
    }

    async fn subscriber_senders(
        &self,
        topic: &Topic,
    ) -> Vec<(ConnectionId, UnboundedSender<String>)> {
        let inner = self.inner.lock().await;
        inner
            .table
            .subscribers(topic)
            .into_iter()
            .filter_map(|id| {
                let sender = inner.senders.get(&id)?.clone();
                Some((id, sender))
            })
            .collect()
    }

    async fn stats(&self) -> BrokerStats {
        self.inner.lock().await.table.stats()
    }
}
