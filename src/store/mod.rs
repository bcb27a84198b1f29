//! Persistence backends for game documents.
//!
//! Every backend stores whole games keyed by id (last write wins). Only the
//! live backend can push updates to subscribers; the others hand out an inert
//! subscription.

mod file;
mod live;
mod memory;

pub use file::{FileStore, GameArchive, ARCHIVE_SCHEMA_VERSION};
pub use live::LiveStore;
pub use memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::types::Game;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data could not be read: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("archive schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
}

/// Stream of full-game snapshots for one game.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<Game>>,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<Game>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A subscription that never delivers anything
    pub fn unsupported() -> Self {
        Self { rx: None }
    }

    pub fn is_live(&self) -> bool {
        self.rx.is_some()
    }

    /// Wait for the next snapshot. Returns `None` once the game's channel is
    /// closed; never resolves for an unsupported subscription. A receiver that
    /// fell behind skips straight to the newest snapshot.
    pub async fn recv(&mut self) -> Option<Game> {
        let rx = match &mut self.rx {
            Some(rx) => rx,
            None => return std::future::pending().await,
        };
        loop {
            match rx.recv().await {
                Ok(game) => return Some(game),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Live subscriber skipped {} stale snapshots", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

/// Trait that all persistence backends must implement
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Insert or replace a whole game
    async fn save_game(&self, game: &Game) -> StoreResult<()>;

    /// All stored games, newest first
    async fn load_games(&self) -> StoreResult<Vec<Game>>;

    async fn load_game(&self, id: &str) -> StoreResult<Option<Game>>;

    async fn delete_game(&self, id: &str) -> StoreResult<()>;

    /// Follow a game's updates
    async fn subscribe(&self, _id: &str) -> Subscription {
        Subscription::unsupported()
    }

    /// Whether `subscribe` delivers updates
    fn supports_live(&self) -> bool {
        false
    }

    /// Get the name of this backend
    fn name(&self) -> &str;
}

const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 6;

/// Generate a shareable join code. Codes are not checked for collisions.
pub fn create_game_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Order games newest first, breaking ties by id for a stable listing
pub(crate) fn sort_newest_first(games: &mut [Game]) {
    games.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

pub(crate) fn find_index(games: &[Game], id: &str) -> Option<usize> {
    games.iter().position(|g| g.id == id)
}

/// Build the backend selected by configuration
pub fn build_store(config: &Config) -> Arc<dyn GameStore> {
    let base: Arc<dyn GameStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::new(config.data_file.clone())),
    };

    if config.live_sync {
        tracing::info!("Live sync enabled on top of {} store", base.name());
        Arc::new(LiveStore::new(base))
    } else {
        tracing::info!("Using {} store without live sync", base.name());
        base
    }
}
