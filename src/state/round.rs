//! Bid and trick entry for the open round

use super::{AppState, StateError};
use crate::engine::BidCorrection;
use crate::types::*;

impl AppState {
    pub async fn increment_bid(&self, player_id: &str) -> Result<Game, StateError> {
        self.apply_to_round(|round, _| round.increment_bid(player_id))
            .await
    }

    pub async fn decrement_bid(&self, player_id: &str) -> Result<Game, StateError> {
        self.apply_to_round(|round, _| round.decrement_bid(player_id))
            .await
    }

    pub async fn set_bid(&self, player_id: &str, bid: u32) -> Result<Game, StateError> {
        self.apply_to_round(|round, _| round.set_bid(player_id, bid))
            .await
    }

    pub async fn increment_tricks(&self, player_id: &str) -> Result<Game, StateError> {
        self.apply_to_round(|round, _| round.increment_tricks(player_id))
            .await
    }

    pub async fn decrement_tricks(&self, player_id: &str) -> Result<Game, StateError> {
        self.apply_to_round(|round, _| round.decrement_tricks(player_id))
            .await
    }

    pub async fn set_tricks(&self, player_id: &str, tricks: u32) -> Result<Game, StateError> {
        self.apply_to_round(|round, _| round.set_tricks(player_id, tricks))
            .await
    }

    pub async fn correct_bid(
        &self,
        player_id: &str,
        direction: BidCorrection,
    ) -> Result<Game, StateError> {
        self.apply_to_round(|round, rules| round.correct_bid(player_id, direction, rules))
            .await
    }

    pub async fn set_voided_trick(&self, voided: bool) -> Result<Game, StateError> {
        self.apply_to_round(|round, rules| round.set_voided_trick(voided, rules))
            .await
    }

    /// Move from bidding to trick counting once the bidding gate passes
    pub async fn complete_bidding(&self) -> Result<Game, StateError> {
        self.apply_to_round(|round, rules| round.complete_bidding(rules))
            .await
    }
}
