//! UseCase: 再同期（late joiner 向け）
//!
//! - RequestResyncUseCase: 接続直後に現在の質問を要求する
//! - RespondResyncUseCase: broadcaster が要求に応えて現在の質問を再配信する

use crate::{
    domain::{Publisher, Question, QuizMessage, ResyncRequest, SessionStore},
    infrastructure::MessageCodec,
};

use super::error::ResyncError;

/// 再同期要求のユースケース
pub struct RequestResyncUseCase<'a> {
    codec: &'a MessageCodec,
    publisher: &'a mut dyn Publisher,
}

impl<'a> RequestResyncUseCase<'a> {
    pub fn new(codec: &'a MessageCodec, publisher: &'a mut dyn Publisher) -> Self {
        Self { codec, publisher }
    }

    /// Publish `{action: get_current_question}` on the request topic.
    ///
    /// Fire-and-forget: nothing waits for a reply.
    pub async fn execute(&mut self) -> Result<(), ResyncError> {
        let encoded = self
            .codec
            .encode(&QuizMessage::Request(ResyncRequest::current_question()))?;
        self.publisher
            .publish(encoded.topic, encoded.payload)
            .await?;
        tracing::debug!("Requested current question");
        Ok(())
    }
}

/// 再同期要求への応答のユースケース
pub struct RespondResyncUseCase<'a> {
    store: &'a SessionStore,
    codec: &'a MessageCodec,
    publisher: &'a mut dyn Publisher,
}

impl<'a> RespondResyncUseCase<'a> {
    pub fn new(
        store: &'a SessionStore,
        codec: &'a MessageCodec,
        publisher: &'a mut dyn Publisher,
    ) -> Self {
        Self {
            store,
            codec,
            publisher,
        }
    }

    /// Republish the current question, if there is one.
    ///
    /// Returns the republished question, or `None` when no question has
    /// been asked yet.
    pub async fn execute(
        &mut self,
        request: ResyncRequest,
    ) -> Result<Option<Question>, ResyncError> {
        let store = self.store;
        let Some(question) = store.current_question() else {
            tracing::debug!("Resync request ({:?}) ignored: no current question", request.action);
            return Ok(None);
        };
        let encoded = self
            .codec
            .encode(&QuizMessage::Question(question.clone()))?;
        self.publisher
            .publish(encoded.topic, encoded.payload)
            .await?;
        tracing::info!("Republished question {} for a late joiner", question.id());
        Ok(Some(question.clone()))
    }
}
