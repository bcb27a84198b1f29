use super::{AppState, StateError};
use crate::engine::{self, PenaltyRequest};
use crate::types::*;
use chrono::Utc;

impl AppState {
    /// Record a penalty for the round being played. A blank description
    /// changes nothing and returns the game as it was.
    pub async fn add_penalty(
        &self,
        player_id: &str,
        request: PenaltyRequest,
    ) -> Result<Game, StateError> {
        let mut slot = self.game.write().await;
        let current = slot.as_ref().ok_or(StateError::NoActiveGame)?;

        match engine::record_penalty(current, player_id, request, Utc::now())? {
            Some(next) => {
                tracing::debug!("Penalty recorded for {} in game {}", player_id, next.id);
                self.persistence.save(&next);
                *slot = Some(next.clone());
                Ok(next)
            }
            None => Ok(current.clone()),
        }
    }

    pub async fn reset_penalty_multiplier(&self, player_id: &str) -> Result<Game, StateError> {
        self.apply(|game| engine::reset_penalty_multiplier(game, player_id, Utc::now()))
            .await
    }
}
