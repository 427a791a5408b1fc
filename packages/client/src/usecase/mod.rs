//! UseCase layer
//!
//! Each use case borrows the session state it needs for a single call:
//! the store, the codec and the outbound [`Publisher`](crate::domain::Publisher).

pub mod apply_inbound;
pub mod broadcast_question;
pub mod error;
pub mod resync;
pub mod send_chat;
pub mod submit_answer;

pub use apply_inbound::{ApplyInboundUseCase, InboundEffect};
pub use broadcast_question::BroadcastQuestionUseCase;
pub use error::{BroadcastError, ResyncError, SendChatError, SubmitAnswerError};
pub use resync::{RequestResyncUseCase, RespondResyncUseCase};
pub use send_chat::SendChatUseCase;
pub use submit_answer::{SubmissionOutcome, SubmitAnswerUseCase};
