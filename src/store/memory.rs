use super::{sort_newest_first, GameStore, StoreResult};
use crate::types::{Game, GameId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Ephemeral backend, mostly for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    games: RwLock<HashMap<GameId, Game>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn save_game(&self, game: &Game) -> StoreResult<()> {
        self.games
            .write()
            .await
            .insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn load_games(&self) -> StoreResult<Vec<Game>> {
        let mut games: Vec<Game> = self.games.read().await.values().cloned().collect();
        sort_newest_first(&mut games);
        Ok(games)
    }

    async fn load_game(&self, id: &str) -> StoreResult<Option<Game>> {
        Ok(self.games.read().await.get(id).cloned())
    }

    async fn delete_game(&self, id: &str) -> StoreResult<()> {
        self.games.write().await.remove(id);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameSetup;
    use crate::types::GameRules;
    use chrono::{Duration, Utc};

    fn game(offset_minutes: i64) -> Game {
        GameSetup {
            player_names: vec!["Alice".to_string(), "Bob".to_string()],
            total_rounds: 5,
            rules: GameRules::default(),
        }
        .create_game(None, Utc::now() + Duration::minutes(offset_minutes))
        .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let store = MemoryStore::new();
        let mut g = game(0);
        store.save_game(&g).await.unwrap();

        g.name = "Renamed".to_string();
        store.save_game(&g).await.unwrap();

        let games = store.load_games().await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Renamed");

        store.delete_game(&g.id).await.unwrap();
        assert!(store.load_game(&g.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_games_listed_newest_first() {
        let store = MemoryStore::new();
        let older = game(-10);
        let newer = game(0);
        store.save_game(&older).await.unwrap();
        store.save_game(&newer).await.unwrap();

        let ids: Vec<_> = store
            .load_games()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }
}
