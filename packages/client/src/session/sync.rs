//! Synchronization Core.
//!
//! Turns connection changes, inbound deliveries and local commands into
//! store mutations, publishes and [`SessionEvent`]s. It owns the store but
//! never the transport: every call that may publish borrows a
//! [`Publisher`] from the runner.

use std::collections::BTreeSet;

use tokio::sync::mpsc;

use crate::{
    domain::{
        ChatMessage, ClientIdentity, Publisher, Question, QuestionDraft, QuestionId,
        QuestionIdFactory, RoleTag, SessionStore, TopicKind, TopicSet,
    },
    infrastructure::{ConnectionState, MessageCodec},
    usecase::{
        ApplyInboundUseCase, BroadcastError, BroadcastQuestionUseCase, InboundEffect,
        RequestResyncUseCase, RespondResyncUseCase, SendChatError, SendChatUseCase,
        SubmissionOutcome, SubmitAnswerError, SubmitAnswerUseCase,
    },
};

use super::{
    config::SessionConfig,
    event::{SessionEvent, SessionSnapshot, SyncState},
};

pub struct SyncCore {
    config: SessionConfig,
    identity: ClientIdentity,
    store: SessionStore,
    codec: MessageCodec,
    question_ids: QuestionIdFactory,
    sync: SyncState,
    has_synced: bool,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SyncCore {
    pub fn new(
        config: SessionConfig,
        identity: ClientIdentity,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let codec = MessageCodec::new(TopicSet::new(config.base_topic.clone()));
        Self {
            config,
            identity,
            store: SessionStore::new(),
            codec,
            question_ids: QuestionIdFactory::new(),
            sync: SyncState::Uninitialized,
            has_synced: false,
            events,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Topics this session listens on.
    ///
    /// Everyone hears questions, chat and answers; only a broadcaster that
    /// answers resync requests listens on the request topic.
    pub fn subscriptions(&self) -> Vec<String> {
        let topics = self.codec.topics();
        TopicKind::ALL
            .into_iter()
            .filter(|kind| *kind != TopicKind::Request || self.config.answers_resync())
            .map(|kind| topics.topic(kind))
            .collect()
    }

    /// React to a connection state change reported by the transport.
    pub async fn on_connection_state(
        &mut self,
        state: ConnectionState,
        publisher: &mut dyn Publisher,
    ) {
        let next = match state {
            ConnectionState::Connecting => SyncState::Connecting,
            ConnectionState::Connected => SyncState::Synced,
            ConnectionState::Lost => SyncState::Lost,
            // A session that never synced has nothing to lose yet.
            ConnectionState::Disconnected if !self.has_synced => SyncState::Uninitialized,
            ConnectionState::Disconnected => SyncState::Lost,
        };
        if next == SyncState::Synced {
            self.has_synced = true;
        }
        if next != self.sync {
            tracing::debug!("Sync state {:?} -> {:?}", self.sync, next);
        }
        self.sync = next;
        self.notify(SessionEvent::ConnectionStateChanged(state));

        if next == SyncState::Synced && self.config.resync_on_connect {
            let result = RequestResyncUseCase::new(&self.codec, publisher)
                .execute()
                .await;
            if let Err(e) = result {
                tracing::warn!("Resync request failed: {}", e);
                self.publish_failed(TopicKind::Request, e.to_string());
            }
        }
    }

    /// Apply one inbound delivery.
    pub async fn on_message(&mut self, topic: &str, payload: &[u8], publisher: &mut dyn Publisher) {
        let effect = ApplyInboundUseCase::new(&mut self.store, &self.codec).execute(topic, payload);
        match effect {
            InboundEffect::QuestionApplied { .. } => self.notify_history(),
            InboundEffect::ChatAppended(message) => {
                self.notify(SessionEvent::ChatAppended(message));
            }
            InboundEffect::AnswerObserved {
                answer,
                counted,
                tally,
            } => {
                if counted {
                    self.notify(SessionEvent::AnswerReceived { answer, tally });
                }
            }
            InboundEffect::ResyncRequested(request) => {
                if !self.config.answers_resync() {
                    return;
                }
                let result = RespondResyncUseCase::new(&self.store, &self.codec, publisher)
                    .execute(request)
                    .await;
                if let Err(e) = result {
                    tracing::warn!("Failed to answer resync request: {}", e);
                    self.publish_failed(TopicKind::Questions, e.to_string());
                }
            }
            InboundEffect::Discarded(_) => {}
        }
    }

    /// Broadcast a new question (broadcaster only).
    pub async fn broadcast(
        &mut self,
        draft: QuestionDraft,
        publisher: &mut dyn Publisher,
    ) -> Result<Question, BroadcastError> {
        let result = BroadcastQuestionUseCase::new(
            &mut self.store,
            &self.codec,
            publisher,
            &mut self.question_ids,
        )
        .execute(self.config.role, draft)
        .await;

        match &result {
            Ok(_) => self.notify_history(),
            Err(BroadcastError::Publish(e)) => {
                self.publish_failed(TopicKind::Questions, e.to_string());
            }
            Err(e) => tracing::debug!("Broadcast rejected: {}", e),
        }
        result
    }

    /// Submit the local answer to a question from one UI surface.
    pub async fn submit_answer(
        &mut self,
        question_id: QuestionId,
        role: RoleTag,
        selected: BTreeSet<usize>,
        publisher: &mut dyn Publisher,
    ) -> Result<SubmissionOutcome, SubmitAnswerError> {
        let result = SubmitAnswerUseCase::new(&mut self.store, &self.codec, publisher)
            .execute(&self.identity, question_id.clone(), role, selected)
            .await;

        let is_correct = result.as_ref().ok().map(SubmissionOutcome::is_correct);
        self.notify(SessionEvent::SubmissionResult {
            question_id,
            role,
            accepted: result.is_ok(),
            is_correct,
        });
        if let Ok(SubmissionOutcome {
            publish_error: Some(e),
            ..
        }) = &result
        {
            self.publish_failed(TopicKind::Answers, e.to_string());
        }
        result
    }

    /// Send a chat message. It reaches the local log through the broker echo.
    pub async fn send_chat(
        &mut self,
        text: &str,
        publisher: &mut dyn Publisher,
    ) -> Result<ChatMessage, SendChatError> {
        let result = SendChatUseCase::new(&self.codec, publisher)
            .execute(&self.identity, &self.config.username, text)
            .await;
        if let Err(SendChatError::Publish(e)) = &result {
            self.publish_failed(TopicKind::Chat, e.to_string());
        }
        result
    }

    pub fn snapshot(&self, connection: ConnectionState) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            role: self.config.role,
            connection,
            sync: self.sync,
            history: self.store.history().to_vec(),
            current: self.store.current_question().cloned(),
            submissions: self.store.submissions().clone(),
            chat: self.store.chat_log().to_vec(),
            tallies: self.store.tallies().clone(),
        }
    }

    fn notify_history(&self) {
        self.notify(SessionEvent::HistoryChanged {
            history: self.store.history().to_vec(),
            current: self.store.current_question().map(|q| q.id().clone()),
        });
    }

    fn publish_failed(&self, kind: TopicKind, reason: String) {
        self.notify(SessionEvent::PublishFailed { kind, reason });
    }

    fn notify(&self, event: SessionEvent) {
        // The collaborator may have stopped listening; the session keeps going.
        let _ = self.events.send(event);
    }
}
