//! UseCase: 質問配信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastQuestionUseCase::execute() メソッド
//! - ロール判定、下書きの検証、ID 採番、publish 後のローカル反映
//!
//! ### なぜこのテストが必要か
//! - 質問を配信できるのは broadcaster のみ
//! - publish に失敗した質問はローカル履歴にも入れない
//!
//! ### どのような状況を想定しているか
//! - 正常系：配信成功で履歴・現在の質問が更新される
//! - 異常系：participant からの配信、不正な下書き、publish 失敗

use crate::{
    domain::{
        Publisher, Question, QuestionDraft, QuestionIdFactory, QuizMessage, Role,
        SessionStore, Timestamp,
    },
    infrastructure::MessageCodec,
};

use super::error::BroadcastError;

/// 質問配信のユースケース
pub struct BroadcastQuestionUseCase<'a> {
    store: &'a mut SessionStore,
    codec: &'a MessageCodec,
    publisher: &'a mut dyn Publisher,
    id_factory: &'a mut QuestionIdFactory,
}

impl<'a> BroadcastQuestionUseCase<'a> {
    /// 新しい BroadcastQuestionUseCase を作成
    pub fn new(
        store: &'a mut SessionStore,
        codec: &'a MessageCodec,
        publisher: &'a mut dyn Publisher,
        id_factory: &'a mut QuestionIdFactory,
    ) -> Self {
        Self {
            store,
            codec,
            publisher,
            id_factory,
        }
    }

    /// 質問配信を実行
    ///
    /// # Arguments
    ///
    /// * `role` - このクライアントのロール
    /// * `draft` - 入力された質問の下書き
    ///
    /// # Returns
    ///
    /// * `Ok(Question)` - publish 済みでローカル履歴に追加された質問
    /// * `Err(BroadcastError)` - 拒否または publish 失敗（状態は変更されない）
    pub async fn execute(
        &mut self,
        role: Role,
        draft: QuestionDraft,
    ) -> Result<Question, BroadcastError> {
        // 1. ロール判定
        if role != Role::Broadcaster {
            return Err(BroadcastError::NotPermitted);
        }

        // 2. 検証と ID 採番
        let now = Timestamp::now();
        let id = self.id_factory.generate(now)?;
        let question = draft.into_question(id, now)?;

        // 3. publish（成功した場合のみローカルに反映）
        let encoded = self.codec.encode(&QuizMessage::Question(question.clone()))?;
        self.publisher
            .publish(encoded.topic, encoded.payload)
            .await?;

        self.store.add_question(question.clone());
        tracing::info!(
            "Broadcast question {} ({} options)",
            question.id(),
            question.options().len()
        );
        Ok(question)
    }
}
