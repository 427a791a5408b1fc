//! The four message kinds carried over the topic namespace.

use super::{
    entity::{AnswerMessage, ChatMessage, Question, ResyncRequest},
    topic::TopicKind,
};

/// A decoded broker message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizMessage {
    Question(Question),
    Answer(AnswerMessage),
    Chat(ChatMessage),
    Request(ResyncRequest),
}

impl QuizMessage {
    /// The topic this kind of message travels on.
    pub fn kind(&self) -> TopicKind {
        match self {
            Self::Question(_) => TopicKind::Questions,
            Self::Answer(_) => TopicKind::Answers,
            Self::Chat(_) => TopicKind::Chat,
            Self::Request(_) => TopicKind::Request,
        }
    }
}
