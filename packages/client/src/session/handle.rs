//! Collaborator-facing handle to a running session

use std::collections::BTreeSet;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{ChatMessage, Question, QuestionDraft, QuestionId, RoleTag},
    usecase::{BroadcastError, SendChatError, SubmissionOutcome, SubmitAnswerError},
};

use super::event::SessionSnapshot;

/// Errors returned by [`SessionHandle`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session runner has stopped
    #[error("session is closed")]
    Closed,

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    SubmitAnswer(#[from] SubmitAnswerError),

    #[error(transparent)]
    SendChat(#[from] SendChatError),
}

/// Commands processed by the session runner, one at a time
pub(crate) enum Command {
    Broadcast {
        draft: QuestionDraft,
        reply: oneshot::Sender<Result<Question, BroadcastError>>,
    },
    SubmitAnswer {
        question_id: QuestionId,
        role: RoleTag,
        selected: BTreeSet<usize>,
        reply: oneshot::Sender<Result<SubmissionOutcome, SubmitAnswerError>>,
    },
    SendChat {
        text: String,
        reply: oneshot::Sender<Result<ChatMessage, SendChatError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    /// Broadcast a question (broadcaster role only).
    pub async fn submit_broadcast(
        &self,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answers: BTreeSet<usize>,
    ) -> Result<Question, SessionError> {
        let draft = QuestionDraft::new(text, options, correct_answers);
        let result = self
            .request(|reply| Command::Broadcast { draft, reply })
            .await?;
        Ok(result?)
    }

    /// Submit an answer for `question_id` from the `role` surface.
    pub async fn submit_answer(
        &self,
        question_id: QuestionId,
        role: RoleTag,
        selected: BTreeSet<usize>,
    ) -> Result<SubmissionOutcome, SessionError> {
        let result = self
            .request(|reply| Command::SubmitAnswer {
                question_id,
                role,
                selected,
                reply,
            })
            .await?;
        Ok(result?)
    }

    pub async fn submit_chat(&self, text: impl Into<String>) -> Result<ChatMessage, SessionError> {
        let text = text.into();
        let result = self
            .request(|reply| Command::SendChat { text, reply })
            .await?;
        Ok(result?)
    }

    /// Copy of the current session state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the session and wait until it has disconnected.
    ///
    /// Shutting down a stopped session is not an error.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        match self.request(|reply| Command::Shutdown { reply }).await {
            Ok(()) | Err(SessionError::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }
}
