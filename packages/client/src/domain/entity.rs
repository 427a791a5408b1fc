//! Core domain models for the quiz session.

use std::collections::BTreeSet;

use super::{
    error::QuestionError,
    value_object::{ClientIdentity, MessageContent, QuestionId, RoleTag, Timestamp},
};

/// Minimum number of options a question must offer
pub const MIN_OPTIONS: usize = 2;

/// A multiple-choice question.
///
/// Immutable once created. `options` has at least [`MIN_OPTIONS`] entries
/// and every index in `correct_answers` points into `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    timestamp: Timestamp,
    text: String,
    options: Vec<String>,
    correct_answers: BTreeSet<usize>,
}

impl Question {
    /// Create a question, checking the structural invariants.
    ///
    /// # Errors
    ///
    /// * `QuestionError::TooFewOptions` - fewer than two options
    /// * `QuestionError::CorrectAnswerOutOfRange` - a correct index has no option
    pub fn new(
        id: QuestionId,
        timestamp: Timestamp,
        text: String,
        options: Vec<String>,
        correct_answers: BTreeSet<usize>,
    ) -> Result<Self, QuestionError> {
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                min: MIN_OPTIONS,
                actual: options.len(),
            });
        }
        if let Some(&index) = correct_answers.iter().find(|&&i| i >= options.len()) {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index,
                len: options.len(),
            });
        }
        Ok(Self {
            id,
            timestamp,
            text,
            options,
            correct_answers,
        })
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answers(&self) -> &BTreeSet<usize> {
        &self.correct_answers
    }

    /// Grade a selection.
    ///
    /// Correct only when the selection equals the correct set exactly; a
    /// subset, a superset or any wrong option scores `false`.
    pub fn grade(&self, selected: &BTreeSet<usize>) -> bool {
        selected == &self.correct_answers
    }

    /// First selected index that has no matching option, if any.
    pub fn first_out_of_range(&self, selected: &BTreeSet<usize>) -> Option<usize> {
        selected.iter().copied().find(|&i| i >= self.options.len())
    }
}

/// A question as typed by the broadcaster, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answers: BTreeSet<usize>,
}

impl QuestionDraft {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answers: BTreeSet<usize>,
    ) -> Self {
        Self {
            text: text.into(),
            options,
            correct_answers,
        }
    }

    /// Validate the draft and turn it into a [`Question`].
    ///
    /// Text and options are trimmed. Blank options are rejected rather than
    /// dropped so that correct indices keep pointing at the options the
    /// broadcaster saw.
    ///
    /// # Errors
    ///
    /// Any [`QuestionError`] describing the first problem found.
    pub fn into_question(
        self,
        id: QuestionId,
        timestamp: Timestamp,
    ) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let options: Vec<String> = self
            .options
            .iter()
            .map(|option| option.trim().to_string())
            .collect();
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                min: MIN_OPTIONS,
                actual: options.len(),
            });
        }
        if let Some(index) = options.iter().position(String::is_empty) {
            return Err(QuestionError::BlankOption { index });
        }
        if self.correct_answers.is_empty() {
            return Err(QuestionError::NoCorrectAnswer);
        }
        Question::new(id, timestamp, text, options, self.correct_answers)
    }
}

/// Key of a local submission: one per question per UI surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionKey {
    pub question_id: QuestionId,
    pub role: RoleTag,
}

impl SubmissionKey {
    pub fn new(question_id: QuestionId, role: RoleTag) -> Self {
        Self { question_id, role }
    }
}

/// The local client's answer to a question on one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub selected_options: BTreeSet<usize>,
    pub is_correct: bool,
    pub submitted_at: Timestamp,
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub username: String,
    pub user_id: ClientIdentity,
    pub text: MessageContent,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        username: String,
        user_id: ClientIdentity,
        text: MessageContent,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            username,
            user_id,
            text,
            timestamp,
        }
    }
}

/// An answer as published on the answers topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerMessage {
    pub question_id: QuestionId,
    pub user_id: ClientIdentity,
    pub selected_options: BTreeSet<usize>,
    pub is_correct: bool,
    pub role: RoleTag,
    pub timestamp: Timestamp,
}

/// Actions a resync request may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    GetCurrentQuestion,
}

/// Late-joiner resynchronization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResyncRequest {
    pub action: RequestAction,
}

impl ResyncRequest {
    pub fn current_question() -> Self {
        Self {
            action: RequestAction::GetCurrentQuestion,
        }
    }
}

/// Running answer tally for one question (broadcaster side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerTally {
    /// Distinct (user, surface) answers seen
    pub total: usize,
    /// How many of them were correct
    pub correct: usize,
}
