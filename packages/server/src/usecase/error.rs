//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// 接続登録時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("failed to register connection: {0}")]
    Repository(#[from] RepositoryError),
}

/// リレーフレーム処理時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Topic failed validation
    #[error("invalid topic: {0}")]
    InvalidTopic(#[from] ValueObjectError),

    /// The sending connection is not registered
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Clients may not send `message` frames
    #[error("unexpected '{0}' frame from client")]
    UnexpectedFrame(&'static str),

    /// The outgoing frame could not be serialized
    #[error("failed to encode frame: {0}")]
    Encode(String),
}
