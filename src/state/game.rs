use super::{AppState, StateError};
use crate::engine::{self, EngineError, EngineResult, GameSetup};
use crate::store::create_game_code;
use crate::types::*;
use chrono::Utc;

impl AppState {
    /// Get current game
    pub async fn get_game(&self) -> Option<Game> {
        self.game.read().await.clone()
    }

    /// Set up a new game and make it the one being scored
    pub async fn start_game(&self, setup: GameSetup) -> Result<Game, StateError> {
        let code = self.live_enabled().then(create_game_code);
        let game = setup.create_game(code, Utc::now())?;

        tracing::info!(
            "Starting game {} with {} players over {} rounds (code: {:?})",
            game.id,
            game.players.len(),
            game.total_rounds,
            game.game_code
        );

        let mut slot = self.game.write().await;
        if let Some(previous) = slot.as_ref() {
            tracing::info!("Replacing unfinished game {}", previous.id);
        }
        *slot = Some(game.clone());
        self.persistence.save(&game);
        Ok(game)
    }

    /// Pick a stored game back up where it was left
    pub async fn resume_game(&self, id: &str) -> Result<Game, StateError> {
        let game = self.stored_game(id).await?;
        engine::validate_game(&game).map_err(StateError::InvalidDocument)?;
        if engine::is_finished(&game) {
            return Err(EngineError::GameComplete.into());
        }

        tracing::info!("Resuming game {} at round {}", game.id, game.current_round);
        *self.game.write().await = Some(game.clone());
        Ok(game)
    }

    /// Score the open round. When that was the last round the finished game
    /// is returned and no game is active afterwards.
    pub async fn complete_round(&self) -> Result<Game, StateError> {
        let mut slot = self.game.write().await;
        let current = slot.as_ref().ok_or(StateError::NoActiveGame)?;
        let next = engine::complete_round(current, Utc::now())?;

        self.persistence.save(&next);
        *slot = if next.is_complete {
            None
        } else {
            Some(next.clone())
        };
        Ok(next)
    }

    /// Stop scoring the active game. It stays in storage and can be resumed.
    pub async fn abandon_game(&self) -> Result<GameId, StateError> {
        let game = self
            .game
            .write()
            .await
            .take()
            .ok_or(StateError::NoActiveGame)?;
        tracing::info!(
            "Abandoned game {} at round {}",
            game.id,
            game.current_round
        );
        Ok(game.id)
    }

    /// Replace the active game with the result of `f` and queue it for saving
    pub(super) async fn apply<F>(&self, f: F) -> Result<Game, StateError>
    where
        F: FnOnce(&Game) -> EngineResult<Game>,
    {
        let mut slot = self.game.write().await;
        let current = slot.as_ref().ok_or(StateError::NoActiveGame)?;
        let next = f(current)?;
        // queued under the lock so saves keep mutation order
        self.persistence.save(&next);
        *slot = Some(next.clone());
        Ok(next)
    }

    /// Like `apply`, for changes confined to the open round
    pub(super) async fn apply_to_round<F>(&self, f: F) -> Result<Game, StateError>
    where
        F: FnOnce(&Round, &GameRules) -> EngineResult<Round>,
    {
        self.apply(|game| {
            let round = engine::current_round(game)?;
            let next = f(&round, &game.rules)?;
            Ok(engine::replace_open_round(game, next, Utc::now()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LiveStore, MemoryStore};
    use std::sync::Arc;

    fn setup(names: &[&str], total_rounds: u32) -> GameSetup {
        GameSetup {
            player_names: names.iter().map(|n| n.to_string()).collect(),
            total_rounds,
            rules: GameRules::default(),
        }
    }

    #[tokio::test]
    async fn test_start_game_persists() {
        let state = AppState::in_memory();
        let game = state.start_game(setup(&["Alice", "Bob"], 3)).await.unwrap();
        assert!(game.game_code.is_none());
        assert!(!game.is_live);

        state.persistence.flush().await;
        assert_eq!(state.store.load_game(&game.id).await.unwrap(), Some(game));
    }

    #[tokio::test]
    async fn test_start_game_with_live_store_gets_code() {
        let store = Arc::new(LiveStore::new(Arc::new(MemoryStore::new())));
        let state = AppState::new(store);
        let game = state.start_game(setup(&["Alice", "Bob"], 3)).await.unwrap();
        assert!(game.is_live);
        assert_eq!(game.game_code.as_ref().map(|c| c.len()), Some(6));
    }

    #[tokio::test]
    async fn test_rejected_setup_keeps_state() {
        let state = AppState::in_memory();
        let err = state.start_game(setup(&["Alice"], 0)).await.unwrap_err();
        match err {
            StateError::Setup(e) => assert_eq!(e.errors.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(state.get_game().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_intent_leaves_game_unchanged() {
        let state = AppState::in_memory();
        let game = state.start_game(setup(&["Alice", "Bob"], 3)).await.unwrap();

        // tricks cannot be entered during bidding
        let err = state.set_tricks(&game.players[0].id, 1).await.unwrap_err();
        assert_eq!(err.code(), "WRONG_PHASE");
        assert_eq!(state.get_game().await, Some(game));
    }

    #[tokio::test]
    async fn test_last_round_clears_active_game() {
        let state = AppState::in_memory();
        let game = state.start_game(setup(&["Alice", "Bob"], 1)).await.unwrap();
        let (a, b) = (game.players[0].id.clone(), game.players[1].id.clone());

        state.set_bid(&a, 1).await.unwrap();
        state.set_bid(&b, 0).await.unwrap();
        state.complete_bidding().await.unwrap();
        state.set_tricks(&a, 1).await.unwrap();
        state.set_tricks(&b, 0).await.unwrap();

        let finished = state.complete_round().await.unwrap();
        assert!(finished.is_complete);
        assert_eq!(finished.players[0].score, 30);
        assert_eq!(finished.players[1].score, 20);
        assert!(state.get_game().await.is_none());

        state.persistence.flush().await;
        let stored = state.store.load_game(&finished.id).await.unwrap().unwrap();
        assert!(stored.is_complete);
        assert!(stored.open_round.is_none());
    }

    #[tokio::test]
    async fn test_abandon_and_resume() {
        let state = AppState::in_memory();
        let game = state.start_game(setup(&["Alice", "Bob"], 3)).await.unwrap();
        state.set_bid(&game.players[0].id, 2).await.unwrap();

        assert_eq!(state.abandon_game().await.unwrap(), game.id);
        assert!(state.get_game().await.is_none());
        assert!(matches!(
            state.abandon_game().await,
            Err(StateError::NoActiveGame)
        ));

        let resumed = state.resume_game(&game.id).await.unwrap();
        let round = resumed.open_round.unwrap();
        assert_eq!(round.players[0].bid, Some(2));
    }

    #[tokio::test]
    async fn test_resume_unknown_or_finished_game() {
        let state = AppState::in_memory();
        assert!(matches!(
            state.resume_game("missing").await,
            Err(StateError::NotFound(_))
        ));

        let mut game = setup(&["Alice", "Bob"], 1)
            .create_game(None, Utc::now())
            .unwrap();
        game.open_round = None;
        game.is_complete = true;
        state.store.save_game(&game).await.unwrap();
        // complete but without its round history
        assert!(matches!(
            state.resume_game(&game.id).await,
            Err(StateError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_resume_refuses_unplayable_open_round() {
        let state = AppState::in_memory();
        let mut game = setup(&["Alice", "Bob"], 4)
            .create_game(None, Utc::now())
            .unwrap();
        if let Some(round) = game.open_round.as_mut() {
            round.phase = RoundPhase::Complete;
            round.cards_in_hand = 50;
            round.players[0].bid = Some(40);
        }
        state.store.save_game(&game).await.unwrap();

        assert!(matches!(
            state.resume_game(&game.id).await,
            Err(StateError::InvalidDocument(_))
        ));
        assert!(state.get_game().await.is_none());
    }

    #[tokio::test]
    async fn test_intents_without_game() {
        let state = AppState::in_memory();
        assert!(matches!(
            state.complete_round().await,
            Err(StateError::NoActiveGame)
        ));
        assert!(matches!(
            state.increment_bid("p").await,
            Err(StateError::NoActiveGame)
        ));
    }
}
