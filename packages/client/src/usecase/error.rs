//! UseCase 層のエラー定義

use thiserror::Error;

use crate::{
    domain::{QuestionError, QuestionId, RoleTag, ValueObjectError},
    infrastructure::{CodecError, TransportError},
};

/// Errors returned by a local answer submission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitAnswerError {
    /// A submission already exists for this question on this surface
    #[error("question {question_id} was already answered from the {role} view")]
    AlreadySubmitted {
        question_id: QuestionId,
        role: RoleTag,
    },

    /// Nothing was selected
    #[error("select at least one option")]
    NoSelection,

    /// The question is not in the local history
    #[error("question {0} is unknown")]
    UnknownQuestion(QuestionId),

    /// A selected index has no option
    #[error("option {index} does not exist (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },
}

/// Errors returned by a question broadcast
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// Only the broadcaster role may publish questions
    #[error("only the broadcaster may publish questions")]
    NotPermitted,

    /// The draft failed validation
    #[error("invalid broadcast: {0}")]
    InvalidBroadcast(#[from] QuestionError),

    /// An id could not be generated
    #[error("failed to generate question id: {0}")]
    Identity(#[from] ValueObjectError),

    /// The question could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The publish attempt failed; the question was not applied locally
    #[error("failed to broadcast question: {0}")]
    Publish(#[from] TransportError),
}

/// Errors returned when sending a chat message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendChatError {
    /// Message is empty after trimming
    #[error("chat message cannot be empty")]
    EmptyMessage,

    /// Message failed validation
    #[error("invalid chat message: {0}")]
    Invalid(#[from] ValueObjectError),

    /// The message could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The publish attempt failed
    #[error("failed to send chat message: {0}")]
    Publish(#[from] TransportError),
}

/// Errors returned by a resync request or response
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResyncError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to publish resync message: {0}")]
    Publish(#[from] TransportError),
}
