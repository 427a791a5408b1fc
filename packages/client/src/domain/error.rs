//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ClientIdentity validation error
    #[error("ClientIdentity cannot be empty")]
    ClientIdentityEmpty,

    /// ClientIdentity too long error
    #[error("ClientIdentity cannot exceed {max} characters (got {actual})")]
    ClientIdentityTooLong { max: usize, actual: usize },

    /// QuestionId validation error
    #[error("QuestionId cannot be empty")]
    QuestionIdEmpty,

    /// QuestionId too long error
    #[error("QuestionId cannot exceed {max} characters (got {actual})")]
    QuestionIdTooLong { max: usize, actual: usize },

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    /// BaseTopic validation error
    #[error("BaseTopic cannot be empty")]
    BaseTopicEmpty,

    /// BaseTopic contains a wildcard or a stray separator
    #[error("BaseTopic is invalid: {0}")]
    BaseTopicInvalid(String),

    /// RoleTag parse error
    #[error("unknown role tag '{0}' (expected 'mcq' or 'chat')")]
    RoleTagUnknown(String),
}

/// Errors related to Question invariants
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionError {
    /// Question text is empty after trimming
    #[error("question text cannot be empty")]
    EmptyText,

    /// Not enough options
    #[error("a question needs at least {min} options (got {actual})")]
    TooFewOptions { min: usize, actual: usize },

    /// An option is blank
    #[error("option {index} is blank")]
    BlankOption { index: usize },

    /// No correct answer selected
    #[error("at least one correct answer must be selected")]
    NoCorrectAnswer,

    /// A correct answer index points past the options
    #[error("correct answer index {index} is out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },
}
