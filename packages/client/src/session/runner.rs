//! Session runner.
//!
//! One tokio task per session owns the transport, the synchronization core
//! and the reconnect timer, and handles commands, transport events and
//! timer expiry strictly one at a time. A connect attempt never blocks
//! commands: it runs as one more branch of the loop.

use std::{future, ops::ControlFlow};

use async_trait::async_trait;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    domain::{ClientIdentity, ClientIdentityFactory, Publisher, ValueObjectError},
    infrastructure::{
        BrokerLink, ConnectionState, TransportAdapter, TransportError, TransportEvent,
    },
};

use super::{
    config::SessionConfig,
    sync::SyncCore,
    event::SessionEvent,
    handle::{Command, SessionHandle},
    reconnect::ReconnectPolicy,
};

const COMMAND_BUFFER: usize = 64;

/// Entry point for starting sessions
pub struct Session;

impl Session {
    /// Start a session with a freshly generated client identity.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<L>(
        config: SessionConfig,
        link: L,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), ValueObjectError>
    where
        L: BrokerLink + 'static,
    {
        let identity = ClientIdentityFactory::generate()?;
        let (handle, events, _task) = Self::spawn_with_identity(config, identity, link);
        Ok((handle, events))
    }

    /// Start a session with a given identity.
    pub fn spawn_with_identity<L>(
        config: SessionConfig,
        identity: ClientIdentity,
        link: L,
    ) -> (
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
        JoinHandle<()>,
    )
    where
        L: BrokerLink + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tracing::info!(
            "Starting {:?} session as {} on '{}'",
            config.role,
            identity,
            config.base_topic
        );
        let runner = SessionRunner {
            reconnect: ReconnectPolicy::new(config.reconnect_backoff),
            core: SyncCore::new(config, identity, event_tx),
            transport: TransportAdapter::new(link),
            commands: command_rx,
        };
        let task = tokio::spawn(runner.run());

        (SessionHandle::new(command_tx), event_rx, task)
    }
}

struct SessionRunner<L: BrokerLink> {
    core: SyncCore,
    transport: TransportAdapter<L>,
    reconnect: ReconnectPolicy,
    commands: mpsc::Receiver<Command>,
}

impl<L: BrokerLink> SessionRunner<L> {
    async fn run(mut self) {
        for topic in self.core.subscriptions() {
            // Not connected yet: the adapter only remembers the topic.
            if let Err(e) = self.transport.subscribe(&topic).await {
                tracing::warn!("Failed to register subscription '{}': {}", topic, e);
            }
        }

        let reply = self.serve().await;
        self.teardown().await;
        if let Some(reply) = reply {
            let _ = reply.send(());
        }
        tracing::info!("Session {} stopped", self.core.identity());
    }

    /// Main loop. Returns the shutdown reply when stopped through a handle.
    async fn serve(&mut self) -> Option<oneshot::Sender<()>> {
        if let ControlFlow::Break(reply) = self.connect_serving().await {
            return reply;
        }

        loop {
            let deadline = self.reconnect.deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => return Some(reply),
                    Some(command) => self.handle_command(command).await,
                    None => return None,
                },
                event = self.transport.next_event(), if self.transport.has_events() => {
                    self.handle_transport_event(event).await;
                }
                _ = wait_until(deadline) => {
                    self.reconnect.begin_attempt();
                    tracing::info!("Reconnecting to broker");
                    if let ControlFlow::Break(reply) = self.connect_serving().await {
                        return reply;
                    }
                }
            }
        }
    }

    /// One connect attempt, bounded by the configured timeout.
    ///
    /// Commands keep being answered while the attempt runs; anything they
    /// publish fails with `NotConnected`. A shutdown drops the attempt.
    async fn connect_serving(&mut self) -> ControlFlow<Option<oneshot::Sender<()>>> {
        let limit = self.core.config().connect_timeout;
        let result = {
            let attempt = self.transport.connect_within(limit);
            tokio::pin!(attempt);
            loop {
                tokio::select! {
                    result = &mut attempt => break result,
                    command = self.commands.recv() => match command {
                        Some(Command::Shutdown { reply }) => return ControlFlow::Break(Some(reply)),
                        Some(command) => {
                            dispatch(
                                &mut self.core,
                                command,
                                &mut Offline,
                                ConnectionState::Connecting,
                            )
                            .await;
                        }
                        None => return ControlFlow::Break(None),
                    },
                }
            }
        };

        self.reconnect.finish_attempt();
        if result.is_err() {
            self.schedule_reconnect();
        }
        ControlFlow::Continue(())
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect.schedule(Instant::now()) {
            tracing::info!(
                "Next reconnect attempt in {:?}",
                self.reconnect.backoff()
            );
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::StateChanged(state) => {
                self.core
                    .on_connection_state(state, &mut self.transport)
                    .await;
                if state == ConnectionState::Lost {
                    self.schedule_reconnect();
                }
            }
            TransportEvent::Message(frame) => {
                self.core
                    .on_message(&frame.topic, &frame.payload, &mut self.transport)
                    .await;
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        let connection = self.transport.state();
        dispatch(&mut self.core, command, &mut self.transport, connection).await;
    }

    async fn teardown(&mut self) {
        self.reconnect.cancel();
        self.transport.disconnect().await;
        // Flush the final state change to the collaborator.
        while self.transport.has_events() {
            let event = self.transport.next_event().await;
            self.handle_transport_event(event).await;
        }
    }
}

async fn dispatch(
    core: &mut SyncCore,
    command: Command,
    publisher: &mut dyn Publisher,
    connection: ConnectionState,
) {
    match command {
        Command::Broadcast { draft, reply } => {
            let _ = reply.send(core.broadcast(draft, publisher).await);
        }
        Command::SubmitAnswer {
            question_id,
            role,
            selected,
            reply,
        } => {
            let result = core
                .submit_answer(question_id, role, selected, publisher)
                .await;
            let _ = reply.send(result);
        }
        Command::SendChat { text, reply } => {
            let _ = reply.send(core.send_chat(&text, publisher).await);
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(core.snapshot(connection));
        }
        Command::Shutdown { reply } => {
            let _ = reply.send(());
        }
    }
}

/// Publisher used while a connect attempt holds the transport
struct Offline;

#[async_trait]
impl Publisher for Offline {
    async fn publish(&mut self, _topic: String, _payload: Vec<u8>) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
