//! UseCase: クライアント接続処理

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{
    ConnectionId, ConnectionIdFactory, SubscriptionRepository, Timestamp,
};

use super::error::ConnectError;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SubscriptionRepository>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - このクライアントへのメッセージ送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 採番された接続 ID
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(
        &self,
        sender: UnboundedSender<String>,
    ) -> Result<ConnectionId, ConnectError> {
        let id = ConnectionIdFactory::generate();
        self.repository
            .add_connection(id.clone(), sender, Timestamp::now())
            .await?;
        Ok(id)
    }
}
