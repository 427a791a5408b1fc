//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// ConnectionId invalid format error (not a valid UUID format)
    #[error("ConnectionId must be a valid UUID format (got: {0})")]
    ConnectionIdInvalidFormat(String),

    /// Topic validation error
    #[error("Topic cannot be empty")]
    TopicEmpty,

    /// Topic too long error
    #[error("Topic cannot exceed {max} characters (got {actual})")]
    TopicTooLong { max: usize, actual: usize },

    /// Wildcards are not routed by this broker
    #[error("Topic cannot contain wildcards (got: {0})")]
    TopicWildcard(String),
}

/// Errors related to Repository operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Connection is not registered
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Connection id is already registered
    #[error("Connection already registered: {0}")]
    DuplicateConnection(String),
}
