//! `MatchroomServer` builder and server loop.
//!
//! This is the entry point for running Matchroom. One task owns the
//! registry and the [`Director`] and applies [`ServerCommand`]s one at a
//! time; a second task drains the delivery queue into the [`Transport`].
//! Deliveries never block event processing.

use std::sync::Arc;

use matchroom_protocol::{Delivery, Inbound};
use matchroom_registry::{MemoryRegistry, Registry};
use matchroom_room::{Director, FinishedRoom, LobbyStatus};
use matchroom_transport::Transport;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::handler::handle_inbound;
use crate::{AppConfig, MatchroomError};

/// State owned by the event task.
pub(crate) struct ServerState<R: Registry> {
    pub(crate) registry: R,
    pub(crate) director: Director,
    pub(crate) outbox: mpsc::UnboundedSender<Delivery>,
    pub(crate) config: AppConfig,
    pub(crate) transcripts: Option<mpsc::UnboundedSender<FinishedRoom>>,
}

/// Commands sent to the server task through its channel.
///
/// The `oneshot::Sender` in `Lobby` is a "reply channel": the caller
/// sends the command and waits for the answer on it.
#[derive(Debug)]
pub enum ServerCommand {
    /// An event from the chat API.
    Inbound(Inbound),

    /// Request the current lobby counts.
    Lobby { reply: oneshot::Sender<LobbyStatus> },

    /// Stop after the commands already queued.
    Shutdown,
}

/// Builder for configuring a Matchroom server.
///
/// # Example
///
/// ```rust,ignore
/// use matchroom::prelude::*;
///
/// let server = MatchroomServerBuilder::new()
///     .config(AppConfig::load("matchroom.toml")?)
///     .registry(MemoryRegistry::new())
///     .build(my_transport);
/// let handle = server.handle();
/// tokio::spawn(server.run());
/// handle.submit(Inbound::text(ParticipantId(1), "/lobby")).await?;
/// ```
pub struct MatchroomServerBuilder<R: Registry = MemoryRegistry> {
    config: AppConfig,
    registry: R,
    transcripts: Option<mpsc::UnboundedSender<FinishedRoom>>,
}

impl MatchroomServerBuilder<MemoryRegistry> {
    /// Creates a builder with default settings and an empty in-memory
    /// registry.
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            registry: MemoryRegistry::new(),
            transcripts: None,
        }
    }
}

impl Default for MatchroomServerBuilder<MemoryRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Registry> MatchroomServerBuilder<R> {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the participant registry.
    pub fn registry<R2: Registry>(self, registry: R2) -> MatchroomServerBuilder<R2> {
        MatchroomServerBuilder {
            config: self.config,
            registry,
            transcripts: self.transcripts,
        }
    }

    /// Every finished room is also sent here, for persistence.
    pub fn transcript_sink(mut self, sink: mpsc::UnboundedSender<FinishedRoom>) -> Self {
        self.transcripts = Some(sink);
        self
    }

    /// Wires the director to the delivery queue and returns the server.
    pub fn build<T: Transport>(self, transport: T) -> MatchroomServer<R, T> {
        let (outbox, deliveries) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::channel(self.config.command_channel_size.max(1));

        let director = Director::new(
            self.config.room.clone(),
            self.config.prompt_book(),
            Arc::new(outbox.clone()),
        );
        let state = ServerState {
            registry: self.registry,
            director,
            outbox,
            config: self.config,
            transcripts: self.transcripts,
        };

        MatchroomServer {
            state,
            transport: Arc::new(transport),
            commands,
            deliveries,
            handle: ServerHandle {
                sender: commands_tx,
            },
        }
    }
}

/// A Matchroom server, ready to run.
///
/// Get a [`ServerHandle`] first, then spawn [`run()`](Self::run).
pub struct MatchroomServer<R: Registry, T: Transport> {
    state: ServerState<R>,
    transport: Arc<T>,
    commands: mpsc::Receiver<ServerCommand>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    handle: ServerHandle,
}

impl<R: Registry, T: Transport> MatchroomServer<R, T> {
    /// A handle for submitting events. Cheap to clone.
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Runs the event loop until [`ServerHandle::shutdown`] is called or
    /// every handle is dropped, then waits for queued deliveries to finish.
    pub async fn run(self) -> Result<(), MatchroomError> {
        let Self {
            mut state,
            transport,
            mut commands,
            deliveries,
            handle,
        } = self;
        // Only external handles keep the loop alive.
        drop(handle);

        let delivery_task = tokio::spawn(deliver_all(deliveries, transport));
        tracing::info!("Matchroom server running");

        while let Some(command) = commands.recv().await {
            match command {
                ServerCommand::Inbound(event) => handle_inbound(&mut state, event),
                ServerCommand::Lobby { reply } => {
                    let _ = reply.send(state.director.lobby());
                }
                ServerCommand::Shutdown => break,
            }
        }

        tracing::info!(
            waiting = state.director.pool().len(),
            rooms = state.director.room_count(),
            "Matchroom server stopping"
        );
        // Dropping the state closes the delivery queue.
        drop(state);
        if let Err(e) = delivery_task.await {
            tracing::error!(error = %e, "delivery task panicked");
        }
        Ok(())
    }
}

/// Sends every queued delivery in its own task. Returns once the queue is
/// closed and all sends have completed.
async fn deliver_all<T: Transport>(
    mut deliveries: mpsc::UnboundedReceiver<Delivery>,
    transport: Arc<T>,
) {
    let mut in_flight = JoinSet::new();
    while let Some(delivery) = deliveries.recv().await {
        let transport = Arc::clone(&transport);
        in_flight.spawn(async move {
            let to = delivery.to;
            if let Err(e) = transport.deliver(delivery).await {
                tracing::error!(participant = %to, error = %e, "delivery failed");
            }
        });
        while in_flight.try_join_next().is_some() {}
    }
    while in_flight.join_next().await.is_some() {}
}

/// Cloneable entry point for feeding the server.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// Queues an inbound event.
    pub async fn submit(&self, event: Inbound) -> Result<(), MatchroomError> {
        self.send(ServerCommand::Inbound(event)).await
    }

    /// Current lobby counts. Answered after every event queued before it.
    pub async fn lobby(&self) -> Result<LobbyStatus, MatchroomError> {
        let (reply, rx) = oneshot::channel();
        self.send(ServerCommand::Lobby { reply }).await?;
        rx.await.map_err(|_| MatchroomError::Shutdown)
    }

    /// Asks the server to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), MatchroomError> {
        self.send(ServerCommand::Shutdown).await
    }

    async fn send(&self, command: ServerCommand) -> Result<(), MatchroomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| MatchroomError::Shutdown)
    }
}
