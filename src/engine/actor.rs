// Serialized access to a ChatEngine from multi-threaded code
//
// One tokio task owns the engine and drains a single queue, so events and
// user actions are applied strictly in arrival order and never interleave.

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{ChatEngine, EngineSnapshot, UserAction};
use crate::models::UserId;
use crate::protocol::ServerEvent;
use crate::transport::Transport;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine task has stopped")]
    Stopped,
}

enum Command {
    Event(ServerEvent),
    Frame(String),
    Action(UserAction),
    Snapshot(oneshot::Sender<EngineSnapshot>),
    UnreadFor(UserId, oneshot::Sender<u32>),
}

/// Cloneable handle to an engine running on its own task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

/// Move `engine` onto a tokio task. The task ends, returning the engine,
/// once every handle has been dropped.
pub fn spawn<T>(engine: ChatEngine<T>, capacity: usize) -> (EngineHandle, JoinHandle<ChatEngine<T>>)
where
    T: Transport + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(engine, rx));
    (EngineHandle { tx }, task)
}

async fn run<T: Transport>(
    mut engine: ChatEngine<T>,
    mut rx: mpsc::Receiver<Command>,
) -> ChatEngine<T> {
    info!("Engine task started for user {}", engine.user_id());
    while let Some(command) = rx.recv().await {
        // Nothing below awaits, so a command is handled start to finish
        match command {
            Command::Event(event) => engine.handle_event(event),
            Command::Frame(text) => {
                // Already logged by the engine; the next frame is unaffected
                let _ = engine.ingest_frame(&text);
            }
            Command::Action(action) => engine.apply(action),
            Command::Snapshot(reply) => {
                if reply.send(engine.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
            }
            Command::UnreadFor(contact_id, reply) => {
                let _ = reply.send(engine.unread_for(contact_id));
            }
        }
    }
    info!("Engine task stopped");
    engine
}

impl EngineHandle {
    async fn send(&self, command: Command) -> Result<(), EngineError> {
        self.tx.send(command).await.map_err(|_| {
            warn!("Engine queue closed");
            EngineError::Stopped
        })
    }

    pub async fn push_event(&self, event: ServerEvent) -> Result<(), EngineError> {
        self.send(Command::Event(event)).await
    }

    /// Queue a raw wire frame; decoding happens on the engine task.
    pub async fn push_frame(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.send(Command::Frame(text.into())).await
    }

    pub async fn act(&self, action: UserAction) -> Result<(), EngineError> {
        self.send(Command::Action(action)).await
    }

    /// Read every model after all previously queued commands have been applied.
    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| EngineError::Stopped)
    }

    pub async fn unread_for(&self, contact_id: UserId) -> Result<u32, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::UnreadFor(contact_id, reply_tx)).await?;
        reply_rx.await.map_err(|_| EngineError::Stopped)
    }
}
