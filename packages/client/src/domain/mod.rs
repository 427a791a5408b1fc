//! Domain layer for the quiz session.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod message;
pub mod port;
pub mod session_store;
pub mod topic;
pub mod value_object;

pub use entity::{
    AnswerMessage, AnswerTally, ChatMessage, MIN_OPTIONS, Question, QuestionDraft, RequestAction,
    ResyncRequest, SubmissionKey, SubmissionRecord,
};
pub use error::{QuestionError, ValueObjectError};
pub use factory::{ClientIdentityFactory, QuestionIdFactory};
pub use message::QuizMessage;
pub use port::Publisher;
pub use session_store::SessionStore;
pub use topic::{BaseTopic, DEFAULT_BASE_TOPIC, TopicKind, TopicSet};
pub use value_object::{ClientIdentity, MessageContent, QuestionId, Role, RoleTag, Timestamp};
