//! UseCase: チャット送信処理

use crate::{
    domain::{
        ChatMessage, ClientIdentity, MessageContent, Publisher, QuizMessage, Timestamp,
    },
    infrastructure::MessageCodec,
};

use super::error::SendChatError;

/// チャット送信のユースケース
///
/// Local echo is not applied here. The message shows up in the chat log
/// when the broker delivers it back on the chat topic.
pub struct SendChatUseCase<'a> {
    codec: &'a MessageCodec,
    publisher: &'a mut dyn Publisher,
}

impl<'a> SendChatUseCase<'a> {
    /// 新しい SendChatUseCase を作成
    pub fn new(codec: &'a MessageCodec, publisher: &'a mut dyn Publisher) -> Self {
        Self { codec, publisher }
    }

    /// チャット送信を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - 送信者の ID
    /// * `username` - 表示名
    /// * `text` - 本文（前後の空白は除去される）
    pub async fn execute(
        &mut self,
        identity: &ClientIdentity,
        username: &str,
        text: &str,
    ) -> Result<ChatMessage, SendChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendChatError::EmptyMessage);
        }
        let content = MessageContent::new(text.to_string())?;
        let message = ChatMessage::new(
            username.to_string(),
            identity.clone(),
            content,
            Timestamp::now(),
        );

        let encoded = self.codec.encode(&QuizMessage::Chat(message.clone()))?;
        self.publisher
            .publish(encoded.topic, encoded.payload)
            .await?;

        tracing::debug!("Sent chat message as {}", username);
        Ok(message)
    }
}
