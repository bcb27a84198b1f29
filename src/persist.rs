//! Background persistence.
//!
//! Mutations never wait on storage: every new game value is queued and a
//! single worker writes them to the store in order. Failures are logged and
//! the in-memory game carries on.

use crate::store::GameStore;
use crate::types::{Game, GameId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum PersistCommand {
    Save(Box<Game>),
    Delete(GameId),
    /// Answered once every earlier command has been handled
    Flush(oneshot::Sender<()>),
}

/// Cheap handle for queueing writes
#[derive(Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistHandle {
    pub fn save(&self, game: &Game) {
        self.send(PersistCommand::Save(Box::new(game.clone())));
    }

    pub fn delete(&self, id: &str) {
        self.send(PersistCommand::Delete(id.to_string()));
    }

    /// Wait until everything queued so far has reached the store
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(PersistCommand::Flush(tx));
        // a stopped worker drops the sender, which also ends the wait
        let _ = rx.await;
    }

    fn send(&self, command: PersistCommand) {
        if self.tx.send(command).is_err() {
            tracing::error!("Persistence worker is gone; change not saved");
        }
    }
}

/// Spawn the worker that drains the save queue into `store`
pub fn spawn_persistence_worker(store: Arc<dyn GameStore>) -> PersistHandle {
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                PersistCommand::Save(game) => {
                    if let Err(e) = store.save_game(&game).await {
                        tracing::error!("Failed to save game {}: {}", game.id, e);
                    }
                }
                PersistCommand::Delete(id) => {
                    if let Err(e) = store.delete_game(&id).await {
                        tracing::error!("Failed to delete game {}: {}", id, e);
                    }
                }
                PersistCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("Persistence worker stopped");
    });

    PersistHandle { tx }
}
