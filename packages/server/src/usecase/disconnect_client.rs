//! UseCase: クライアント切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, RepositoryError, SubscriptionRepository};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SubscriptionRepository>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    /// クライアント切断を実行
    ///
    /// 接続とその購読をすべて削除し、削除した購読数を返す
    pub async fn execute(&self, id: &ConnectionId) -> Result<usize, RepositoryError> {
        let connection = self.repository.remove_connection(id).await?;
        Ok(connection.topics.len())
    }
}
