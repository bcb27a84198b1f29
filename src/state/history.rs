//! Stored games: listing, import and removal

use super::{AppState, StateError};
use crate::engine::{self, standings};
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the game history list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub player_count: usize,
    pub rounds_played: usize,
    pub total_rounds: u32,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_code: Option<String>,
    /// Leader by replayed total; the winner once the game is complete
    pub winner: Option<String>,
    pub winning_score: Option<i64>,
}

impl GameSummary {
    pub fn new(game: &Game) -> Self {
        let leader = standings(game).into_iter().next();
        Self {
            id: game.id.clone(),
            name: game.name.clone(),
            created_at: game.created_at,
            updated_at: game.updated_at,
            player_count: game.players.len(),
            rounds_played: game.rounds.len(),
            total_rounds: game.total_rounds,
            is_complete: game.is_complete,
            game_code: game.game_code.clone(),
            winning_score: leader.as_ref().map(|s| s.total),
            winner: leader.map(|s| s.name),
        }
    }
}

impl AppState {
    /// Every stored game, newest first
    pub async fn list_games(&self) -> Result<Vec<GameSummary>, StateError> {
        self.persistence.flush().await;
        let games = self.store.load_games().await?;
        Ok(games.iter().map(GameSummary::new).collect())
    }

    /// A stored game as of the last queued save
    pub async fn stored_game(&self, id: &str) -> Result<Game, StateError> {
        self.persistence.flush().await;
        self.store
            .load_game(id)
            .await?
            .ok_or_else(|| StateError::NotFound(id.to_string()))
    }

    /// Store a game document from outside, after checking it is consistent.
    /// The game being scored cannot be replaced this way.
    pub async fn import_game(&self, game: Game) -> Result<Game, StateError> {
        engine::validate_game(&game).map_err(StateError::InvalidDocument)?;

        let slot = self.game.read().await;
        if slot.as_ref().is_some_and(|active| active.id == game.id) {
            tracing::warn!("Refusing to import over the active game {}", game.id);
            return Err(StateError::GameInProgress(game.id));
        }
        tracing::info!("Importing game {} ({})", game.id, game.name);
        self.persistence.save(&game);
        drop(slot);

        self.persistence.flush().await;
        Ok(game)
    }

    /// Remove a stored game. Deleting the game being scored also ends it.
    pub async fn delete_game(&self, id: &str) -> Result<(), StateError> {
        let mut slot = self.game.write().await;
        if slot.as_ref().is_some_and(|g| g.id == id) {
            tracing::info!("Deleting the active game {}", id);
            *slot = None;
        }
        self.persistence.delete(id);
        drop(slot);
        self.persistence.flush().await;
        Ok(())
    }
}
