//! UseCase: 受信メッセージの反映処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ApplyInboundUseCase::execute() メソッド
//! - トピックとペイロードのデコード、Store への反映
//!
//! ### なぜこのテストが必要か
//! - 配信は at-least-once であり、重複・順不同を前提に冪等に反映する必要がある
//! - 不正なペイロードは破棄され、状態を変更してはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：質問・チャット・回答・再同期要求の受信
//! - 異常系：不正なペイロード、名前空間外のトピック
//! - エッジケース：同じ質問・回答の重複受信

use crate::{
    domain::{
        AnswerMessage, AnswerTally, ChatMessage, QuestionId, QuizMessage, ResyncRequest,
        SessionStore,
    },
    infrastructure::{CodecError, MessageCodec},
};

/// What applying one inbound delivery did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEffect {
    /// A question arrived; `inserted` is false for a duplicate
    QuestionApplied {
        question_id: QuestionId,
        inserted: bool,
    },
    ChatAppended(ChatMessage),
    /// An answer arrived; `counted` is false for a redelivery
    AnswerObserved {
        answer: AnswerMessage,
        counted: bool,
        tally: AnswerTally,
    },
    ResyncRequested(ResyncRequest),
    /// The delivery could not be decoded and was dropped
    Discarded(CodecError),
}

/// 受信メッセージ反映のユースケース
pub struct ApplyInboundUseCase<'a> {
    store: &'a mut SessionStore,
    codec: &'a MessageCodec,
}

impl<'a> ApplyInboundUseCase<'a> {
    /// 新しい ApplyInboundUseCase を作成
    pub fn new(store: &'a mut SessionStore, codec: &'a MessageCodec) -> Self {
        Self { store, codec }
    }

    /// 受信メッセージの反映を実行
    ///
    /// Decoding failures never mutate the store; they are logged and
    /// returned as [`InboundEffect::Discarded`].
    pub fn execute(&mut self, topic: &str, payload: &[u8]) -> InboundEffect {
        let message = match self.codec.decode(topic, payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Discarding delivery on '{}': {}", topic, e);
                return InboundEffect::Discarded(e);
            }
        };

        match message {
            QuizMessage::Question(question) => {
                let question_id = question.id().clone();
                let inserted = self.store.add_question(question);
                if inserted {
                    tracing::info!("New question {}", question_id);
                } else {
                    tracing::debug!("Duplicate question {} ignored", question_id);
                }
                InboundEffect::QuestionApplied {
                    question_id,
                    inserted,
                }
            }
            QuizMessage::Chat(message) => {
                self.store.append_chat(message.clone());
                InboundEffect::ChatAppended(message)
            }
            QuizMessage::Answer(answer) => {
                let counted = self.store.record_answer(&answer);
                let tally = self.store.tally(&answer.question_id);
                InboundEffect::AnswerObserved {
                    answer,
                    counted,
                    tally,
                }
            }
            QuizMessage::Request(request) => InboundEffect::ResyncRequested(request),
        }
    }
}
