use super::{AppState, ViewerError};
use crate::store::Subscription;
use crate::types::Game;

impl AppState {
    /// Find a game by its join code and start following it.
    ///
    /// Without a live-capable store a found game is still returned, with an
    /// inert subscription.
    pub async fn join_live(&self, code: &str) -> Result<(Game, Subscription), ViewerError> {
        let code = code.trim().to_uppercase();
        self.persistence.flush().await;

        let games = self.store.load_games().await?;
        let found = games
            .into_iter()
            .find(|g| g.game_code.as_deref() == Some(code.as_str()));

        let game = match found {
            Some(game) => game,
            None if !self.live_enabled() => return Err(ViewerError::LiveUnavailable),
            None => return Err(ViewerError::GameNotFound(code)),
        };

        let subscription = self.store.subscribe(&game.id).await;
        if !subscription.is_live() {
            tracing::info!("Live updates unavailable for {}; sending one snapshot", code);
        }

        // reload so a save between lookup and subscribe is not missed
        let game = self.store.load_game(&game.id).await?.unwrap_or(game);
        tracing::info!("Viewer joined game {} via code {}", game.id, code);
        Ok((game, subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameSetup;
    use crate::store::{LiveStore, MemoryStore};
    use crate::types::GameRules;
    use chrono::Utc;
    use std::sync::Arc;

    fn setup() -> GameSetup {
        GameSetup {
            player_names: vec!["Alice".into(), "Bob".into()],
            total_rounds: 3,
            rules: GameRules::default(),
        }
    }

    #[tokio::test]
    async fn test_viewer_follows_scorer() {
        let state = AppState::new(Arc::new(LiveStore::new(Arc::new(MemoryStore::new()))));
        let game = state.start_game(setup()).await.unwrap();
        let code = game.game_code.clone().unwrap();

        let (snapshot, mut sub) = state.join_live(&code.to_lowercase()).await.unwrap();
        assert_eq!(snapshot.id, game.id);
        assert!(sub.is_live());

        state.set_bid(&game.players[0].id, 1).await.unwrap();
        let update = sub.recv().await.unwrap();
        assert_eq!(update.open_round.unwrap().players[0].bid, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let state = AppState::new(Arc::new(LiveStore::new(Arc::new(MemoryStore::new()))));
        let err = state.join_live("zzzzzz").await.unwrap_err();
        assert_eq!(err.code(), "GAME_NOT_FOUND");
        assert!(err.to_string().contains("\"ZZZZZZ\""));
    }

    #[tokio::test]
    async fn test_without_live_store() {
        let state = AppState::in_memory();
        let err = state.join_live("ABC123").await.unwrap_err();
        assert_eq!(err.code(), "LIVE_UNAVAILABLE");

        // a coded game saved elsewhere is still shown once
        let game = setup()
            .create_game(Some("ABC123".to_string()), Utc::now())
            .unwrap();
        state.store.save_game(&game).await.unwrap();
        let (snapshot, sub) = state.join_live("ABC123").await.unwrap();
        assert_eq!(snapshot, game);
        assert!(!sub.is_live());
    }
}
