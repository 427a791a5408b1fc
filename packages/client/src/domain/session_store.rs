//! Session State Store.
//!
//! The client-local view of the classroom. Pure in-memory state: it never
//! talks to the transport, and only the synchronization core mutates it.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{
    entity::{AnswerMessage, AnswerTally, ChatMessage, Question, SubmissionKey, SubmissionRecord},
    value_object::{ClientIdentity, QuestionId, RoleTag},
};

/// Client-local session state
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    /// Questions in first-arrival order
    history: Vec<Question>,
    /// Ids already present in `history`
    known: HashSet<QuestionId>,
    /// Most recently accepted question
    current: Option<QuestionId>,
    /// Local submissions, at most one per key
    submissions: BTreeMap<SubmissionKey, SubmissionRecord>,
    /// Chat log in arrival order
    chat: Vec<ChatMessage>,
    /// Answer tallies per question
    tallies: HashMap<QuestionId, AnswerTally>,
    /// Answers already counted in a tally
    counted_answers: HashSet<(QuestionId, ClientIdentity, RoleTag)>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a question unless its id was already seen.
    ///
    /// Returns `true` when the question was inserted (it then becomes the
    /// current question) and `false` for a duplicate, which leaves the
    /// first copy untouched.
    pub fn add_question(&mut self, question: Question) -> bool {
        if !self.known.insert(question.id().clone()) {
            return false;
        }
        self.current = Some(question.id().clone());
        self.history.push(question);
        true
    }

    /// Record a local submission.
    ///
    /// Returns `false` without touching the existing record when one is
    /// already stored for `key`.
    pub fn record_submission(&mut self, key: SubmissionKey, record: SubmissionRecord) -> bool {
        if self.submissions.contains_key(&key) {
            return false;
        }
        self.submissions.insert(key, record);
        true
    }

    /// Append a chat message to the log.
    pub fn append_chat(&mut self, message: ChatMessage) {
        self.chat.push(message);
    }

    /// Count an observed answer in its question's tally.
    ///
    /// Redeliveries of the same `(question, user, surface)` answer are
    /// ignored and return `false`.
    pub fn record_answer(&mut self, answer: &AnswerMessage) -> bool {
        let key = (
            answer.question_id.clone(),
            answer.user_id.clone(),
            answer.role,
        );
        if !self.counted_answers.insert(key) {
            return false;
        }
        let tally = self.tallies.entry(answer.question_id.clone()).or_default();
        tally.total += 1;
        if answer.is_correct {
            tally.correct += 1;
        }
        true
    }

    pub fn history(&self) -> &[Question] {
        &self.history
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.history.iter().find(|q| q.id() == id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref().and_then(|id| self.question(id))
    }

    pub fn submission(&self, key: &SubmissionKey) -> Option<&SubmissionRecord> {
        self.submissions.get(key)
    }

    pub fn has_submitted(&self, key: &SubmissionKey) -> bool {
        self.submissions.contains_key(key)
    }

    /// Every local submission, ordered by key.
    pub fn submissions(&self) -> &BTreeMap<SubmissionKey, SubmissionRecord> {
        &self.submissions
    }

    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn tally(&self, id: &QuestionId) -> AnswerTally {
        self.tallies.get(id).copied().unwrap_or_default()
    }

    pub fn tallies(&self) -> &HashMap<QuestionId, AnswerTally> {
        &self.tallies
    }
}
