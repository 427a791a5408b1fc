//! UseCase: リレーフレーム処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayFrameUseCase::execute() メソッド
//! - subscribe / unsubscribe / publish フレームの処理と配送
//!
//! ### なぜこのテストが必要か
//! - publish は完全一致するトピックの全購読者（送信者自身を含む）に配送されなければならない
//! - 不正なトピックやクライアントからの message フレームは拒否する
//!
//! ### どのような状況を想定しているか
//! - 正常系：購読・配送・購読解除
//! - 異常系：ワイルドカードを含むトピック、message フレーム
//! - エッジケース：購読者がいないトピックへの publish

use std::sync::Arc;

use quizcast_shared::relay::RelayFrame;

use crate::domain::{ConnectionId, SubscriptionRepository, Topic};

use super::error::RelayError;

/// What a processed frame did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Subscribed { topic: Topic, added: bool },
    Unsubscribed { topic: Topic, removed: bool },
    Published { topic: Topic, delivered: usize },
}

/// リレーフレーム処理のユースケース
pub struct RelayFrameUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SubscriptionRepository>,
}

impl RelayFrameUseCase {
    /// 新しい RelayFrameUseCase を作成
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    /// フレーム処理を実行
    ///
    /// # Arguments
    ///
    /// * `from` - フレームを送ってきた接続
    /// * `frame` - 受信したフレーム
    pub async fn execute(
        &self,
        from: &ConnectionId,
        frame: RelayFrame,
    ) -> Result<FrameOutcome, RelayError> {
        match frame {
            RelayFrame::Subscribe { topic } => {
                let topic = Topic::new(topic)?;
                let added = self.repository.subscribe(from, topic.clone()).await?;
                tracing::debug!("'{}' subscribed to '{}'", from, topic);
                Ok(FrameOutcome::Subscribed { topic, added })
            }
            RelayFrame::Unsubscribe { topic } => {
                let topic = Topic::new(topic)?;
                let removed = self.repository.unsubscribe(from, &topic).await?;
                tracing::debug!("'{}' unsubscribed from '{}'", from, topic);
                Ok(FrameOutcome::Unsubscribed { topic, removed })
            }
            RelayFrame::Publish {
                topic,
                payload,
                qos,
            } => {
                let topic = Topic::new(topic)?;
                let delivered = self.deliver(&topic, payload).await?;
                tracing::debug!(
                    "'{}' published to '{}' (qos {}), delivered to {} subscribers",
                    from,
                    topic,
                    qos,
                    delivered
                );
                Ok(FrameOutcome::Published { topic, delivered })
            }
            RelayFrame::Message { .. } => Err(RelayError::UnexpectedFrame("message")),
        }
    }

    /// 購読者全員（送信者を含む）に message フレームを送る
    async fn deliver(&self, topic: &Topic, payload: String) -> Result<usize, RelayError> {
        let message = RelayFrame::Message {
            topic: topic.as_str().to_string(),
            payload,
        }
        .to_json()
        .map_err(|e| RelayError::Encode(e.to_string()))?;

        let mut delivered = 0;
        for (id, sender) in self.repository.subscriber_senders(topic).await {
            if sender.send(message.clone()).is_err() {
                tracing::warn!("Failed to deliver '{}' to connection '{}'", topic, id);
            } else {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionIdFactory, Timestamp, ValueObjectError},
        infrastructure::repository::InMemorySubscriptionRepository,
    };
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    async fn connect(
        repository: &Arc<InMemorySubscriptionRepository>,
    ) -> (ConnectionId, UnboundedReceiver<String>) {
        let id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        repository
            .add_connection(id.clone(), tx, Timestamp::new(0))
            .await
            .unwrap();
        (id, rx)
    }

    fn subscribe(topic: &str) -> RelayFrame {
        RelayFrame::Subscribe {
            topic: topic.to_string(),
        }
    }

    fn publish(topic: &str, payload: &str) -> RelayFrame {
        RelayFrame::Publish {
            topic: topic.to_string(),
            payload: payload.to_string(),
            qos: 1,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber_including_sender() {
        // テスト項目: publish は送信者自身を含む全購読者に届く
        // given (前提条件):
        let repository = Arc::new(InMemorySubscriptionRepository::new());
        let usecase = RelayFrameUseCase::new(repository.clone());
        let (alice, mut alice_rx) = connect(&repository).await;
        let (bob, mut bob_rx) = connect(&repository).await;
        let (_carol, mut carol_rx) = connect(&repository).await;
        usecase.execute(&alice, subscribe("room/chat")).await.unwrap();
        usecase.execute(&bob, subscribe("room/chat")).await.unwrap();

        // when (操作):
        let outcome = usecase
            .execute(&alice, publish("room/chat", "{\"message\":\"hi\"}"))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(matches!(
            outcome,
            FrameOutcome::Published { delivered: 2, .. }
        ));
        let expected = RelayFrame::Message {
            topic: "room/chat".to_string(),
            payload: "{\"message\":\"hi\"}".to_string(),
        };
        for rx in [&mut alice_rx, &mut bob_rx] {
            let text = rx.recv().await.unwrap();
            assert_eq!(RelayFrame::from_json(&text).unwrap(), expected);
        }
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        // テスト項目: 購読者がいないトピックへの publish は 0 件配送
        let repository = Arc::new(InMemorySubscriptionRepository::new());
        let usecase = RelayFrameUseCase::new(repository.clone());
        let (alice, _rx) = connect(&repository).await;

        let outcome = usecase.execute(&alice, publish("nobody", "x")).await;

        assert_eq!(
            outcome,
            Ok(FrameOutcome::Published {
                topic: Topic::new("nobody".to_string()).unwrap(),
                delivered: 0
            })
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        // テスト項目: 購読解除後は配送されない
        let repository = Arc::new(InMemorySubscriptionRepository::new());
        let usecase = RelayFrameUseCase::new(repository.clone());
        let (alice, mut rx) = connect(&repository).await;
        usecase.execute(&alice, subscribe("t")).await.unwrap();

        usecase
            .execute(
                &alice,
                RelayFrame::Unsubscribe {
                    topic: "t".to_string(),
                },
            )
            .await
            .unwrap();
        usecase.execute(&alice, publish("t", "x")).await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_frames_are_rejected() {
        // テスト項目: ワイルドカードのトピックと message フレームは拒否される
        let repository = Arc::new(InMemorySubscriptionRepository::new());
        let usecase = RelayFrameUseCase::new(repository.clone());
        let (alice, _rx) = connect(&repository).await;

        let wildcard = usecase.execute(&alice, subscribe("mcq/#")).await;
        let message = usecase
            .execute(
                &alice,
                RelayFrame::Message {
                    topic: "t".to_string(),
                    payload: "x".to_string(),
                },
            )
            .await;

        assert_eq!(
            wildcard,
            Err(RelayError::InvalidTopic(ValueObjectError::TopicWildcard(
                "mcq/#".to_string()
            )))
        );
        assert_eq!(message, Err(RelayError::UnexpectedFrame("message")));
    }
}
