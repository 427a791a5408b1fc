//! UseCase: 回答提出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitAnswerUseCase::execute() メソッド
//! - 提出可否の判定、正誤判定（集合の完全一致）、提出記録と Answer の publish
//!
//! ### なぜこのテストが必要か
//! - (質問 ID, ロールタグ) ごとに提出は最大 1 回でなければならない
//! - 部分点は存在せず、上位集合・部分集合はいずれも不正解
//! - publish 失敗は記録を取り消さず、報告のみ行う
//!
//! ### どのような状況を想定しているか
//! - 正常系：正解・不正解の提出（Scenario A / B）
//! - 異常系：二重提出（Scenario C）、未選択、未知の質問、範囲外の選択肢
//! - エッジケース：未接続時の提出

use std::collections::BTreeSet;

use crate::{
    domain::{
        AnswerMessage, ClientIdentity, Publisher, QuestionId, QuizMessage, RoleTag,
        SessionStore, SubmissionKey, SubmissionRecord, Timestamp,
    },
    infrastructure::{MessageCodec, TransportError},
};

use super::error::SubmitAnswerError;

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub record: SubmissionRecord,
    pub answer: AnswerMessage,
    /// Why the answer could not be published, if it could not
    pub publish_error: Option<TransportError>,
}

impl SubmissionOutcome {
    pub fn is_correct(&self) -> bool {
        self.record.is_correct
    }

    pub fn is_published(&self) -> bool {
        self.publish_error.is_none()
    }
}

/// 回答提出のユースケース
pub struct SubmitAnswerUseCase<'a> {
    store: &'a mut SessionStore,
    codec: &'a MessageCodec,
    publisher: &'a mut dyn Publisher,
}

impl<'a> SubmitAnswerUseCase<'a> {
    /// 新しい SubmitAnswerUseCase を作成
    pub fn new(
        store: &'a mut SessionStore,
        codec: &'a MessageCodec,
        publisher: &'a mut dyn Publisher,
    ) -> Self {
        Self {
            store,
            codec,
            publisher,
        }
    }

    /// 回答提出を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - このクライアントの ID
    /// * `question_id` - 回答する質問
    /// * `role` - 提出元の UI（mcq / chat）
    /// * `selected` - 選択した選択肢のインデックス集合
    ///
    /// # Returns
    ///
    /// * `Ok(SubmissionOutcome)` - 記録済み（publish 失敗は outcome 内に報告）
    /// * `Err(SubmitAnswerError)` - 拒否（状態は変更されない）
    pub async fn execute(
        &mut self,
        identity: &ClientIdentity,
        question_id: QuestionId,
        role: RoleTag,
        selected: BTreeSet<usize>,
    ) -> Result<SubmissionOutcome, SubmitAnswerError> {
        let key = SubmissionKey::new(question_id.clone(), role);

        // 1. 提出可否の判定
        if self.store.has_submitted(&key) {
            return Err(SubmitAnswerError::AlreadySubmitted { question_id, role });
        }
        if selected.is_empty() {
            return Err(SubmitAnswerError::NoSelection);
        }
        let question = self
            .store
            .question(&question_id)
            .ok_or_else(|| SubmitAnswerError::UnknownQuestion(question_id.clone()))?;
        if let Some(index) = question.first_out_of_range(&selected) {
            return Err(SubmitAnswerError::OptionOutOfRange {
                index,
                len: question.options().len(),
            });
        }

        // 2. 正誤判定と記録
        let is_correct = question.grade(&selected);
        let submitted_at = Timestamp::now();
        let record = SubmissionRecord {
            selected_options: selected.clone(),
            is_correct,
            submitted_at,
        };
        if !self.store.record_submission(key, record.clone()) {
            return Err(SubmitAnswerError::AlreadySubmitted { question_id, role });
        }

        // 3. Answer の publish（失敗しても記録は残す）
        let answer = AnswerMessage {
            question_id,
            user_id: identity.clone(),
            selected_options: selected,
            is_correct,
            role,
            timestamp: submitted_at,
        };
        let publish_error = match self.codec.encode(&QuizMessage::Answer(answer.clone())) {
            Ok(encoded) => self
                .publisher
                .publish(encoded.topic, encoded.payload)
                .await
                .err(),
            Err(e) => Some(TransportError::SendFailed(e.to_string())),
        };
        if let Some(e) = &publish_error {
            tracing::warn!(
                "Answer to {} recorded but not published: {}",
                answer.question_id,
                e
            );
        }

        Ok(SubmissionOutcome {
            record,
            answer,
            publish_error,
        })
    }
}
