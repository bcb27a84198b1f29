use super::{GameStore, StoreResult, Subscription};
use crate::types::{Game, GameId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Snapshots buffered per subscriber before it starts skipping
const CHANNEL_CAPACITY: usize = 16;

/// Backend with push updates: wraps another store and publishes every saved
/// game to the subscribers of that game's id.
pub struct LiveStore {
    inner: Arc<dyn GameStore>,
    channels: RwLock<HashMap<GameId, broadcast::Sender<Game>>>,
}

impl LiveStore {
    pub fn new(inner: Arc<dyn GameStore>) -> Self {
        Self {
            inner,
            channels: RwLock::new(HashMap::new()),
        }
    }

    async fn publish(&self, game: &Game) {
        let mut channels = self.channels.write().await;
        let abandoned = match channels.get(&game.id) {
            Some(tx) => tx.send(game.clone()).is_err(),
            None => false,
        };
        if abandoned {
            // every viewer is gone
            channels.remove(&game.id);
        }
    }

    /// Number of open subscriptions for a game
    pub async fn subscriber_count(&self, id: &str) -> usize {
        self.channels
            .read()
            .await
            .get(id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl GameStore for LiveStore {
    async fn save_game(&self, game: &Game) -> StoreResult<()> {
        self.inner.save_game(game).await?;
        self.publish(game).await;
        Ok(())
    }

    async fn load_games(&self) -> StoreResult<Vec<Game>> {
        self.inner.load_games().await
    }

    async fn load_game(&self, id: &str) -> StoreResult<Option<Game>> {
        self.inner.load_game(id).await
    }

    async fn delete_game(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_game(id).await?;
        // dropping the sender ends every subscription to this game
        self.channels.write().await.remove(id);
        Ok(())
    }

    async fn subscribe(&self, id: &str) -> Subscription {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Subscription::new(tx.subscribe())
    }

    fn supports_live(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "live"
    }
}
