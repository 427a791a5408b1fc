//! Notifications and read-only views handed to the collaborator

use std::collections::{BTreeMap, HashMap};

use crate::{
    domain::{
        AnswerMessage, AnswerTally, ChatMessage, ClientIdentity, Question, QuestionId, Role,
        RoleTag, SubmissionKey, SubmissionRecord, TopicKind,
    },
    infrastructure::ConnectionState,
};

/// Synchronization state of a session.
///
/// `Uninitialized -> Connecting -> Synced -> (Lost -> Connecting)*`. A
/// failed connect before the first sync goes back to `Uninitialized`; after
/// it, every failure or drop is `Lost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Connecting,
    Synced,
    Lost,
}

/// Notifications emitted by a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The question history should be re-rendered. Also sent for duplicates.
    HistoryChanged {
        history: Vec<Question>,
        current: Option<QuestionId>,
    },
    ChatAppended(ChatMessage),
    ConnectionStateChanged(ConnectionState),
    /// Outcome of a local submission. `is_correct` is set only when accepted.
    SubmissionResult {
        question_id: QuestionId,
        role: RoleTag,
        accepted: bool,
        is_correct: Option<bool>,
    },
    /// A new answer was counted for a question
    AnswerReceived {
        answer: AnswerMessage,
        tally: AnswerTally,
    },
    /// A publish attempt failed; nothing is retried
    PublishFailed { kind: TopicKind, reason: String },
}

/// Point-in-time copy of a session's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: ClientIdentity,
    pub role: Role,
    pub connection: ConnectionState,
    pub sync: SyncState,
    pub history: Vec<Question>,
    pub current: Option<Question>,
    pub submissions: BTreeMap<SubmissionKey, SubmissionRecord>,
    pub chat: Vec<ChatMessage>,
    pub tallies: HashMap<QuestionId, AnswerTally>,
}

impl SessionSnapshot {
    pub fn submission(&self, question_id: &QuestionId, role: RoleTag) -> Option<&SubmissionRecord> {
        self.submissions
            .get(&SubmissionKey::new(question_id.clone(), role))
    }

    pub fn has_submitted(&self, question_id: &QuestionId, role: RoleTag) -> bool {
        self.submission(question_id, role).is_some()
    }

    pub fn tally(&self, question_id: &QuestionId) -> AnswerTally {
        self.tallies.get(question_id).copied().unwrap_or_default()
    }
}
