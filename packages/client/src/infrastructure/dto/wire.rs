//! Wire DTOs for the four message kinds.
//!
//! Field names follow the classroom front-end that shares the broker:
//! camelCase keys, question text under `question`, chat text under
//! `message`, the role tag under `section` and RFC 3339 timestamps.

use serde::{Deserialize, Serialize};

/// Question published on `T/questions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestionDto {
    pub id: String,
    pub timestamp: String, // RFC 3339
    pub question: String,
    pub options: Vec<String>,
    pub correct_answers: Vec<usize>,
}

/// Answer published on `T/answers`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnswerDto {
    pub question_id: String,
    pub user_id: String,
    pub selected_options: Vec<usize>,
    pub is_correct: bool,
    pub section: String,
    pub timestamp: String, // RFC 3339
}

/// Chat message published on `T/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatMessageDto {
    pub username: String,
    pub user_id: String,
    pub message: String,
    pub timestamp: String, // RFC 3339
}

/// Request actions understood on `T/request`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestActionDto {
    GetCurrentQuestion,
}

/// Resync request published on `T/request`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDto {
    pub action: RequestActionDto,
}
