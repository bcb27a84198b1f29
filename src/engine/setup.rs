use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Game parameters chosen on the setup screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSetup {
    pub player_names: Vec<String>,
    pub total_rounds: u32,
    #[serde(default)]
    pub rules: GameRules,
}

/// Setup was rejected; every message applies and should be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid game setup: {}", .errors.join("; "))]
pub struct SetupError {
    pub errors: Vec<String>,
}

impl GameSetup {
    /// Collect every problem with the setup (empty when valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let trimmed: Vec<&str> = self.player_names.iter().map(|n| n.trim()).collect();

        if trimmed.iter().filter(|n| !n.is_empty()).count() < MIN_PLAYERS {
            errors.push("You need at least 2 players".to_string());
        }

        if trimmed.len() > MAX_PLAYERS {
            errors.push(format!("At most {} players can play", MAX_PLAYERS));
        }

        if trimmed.iter().any(|n| n.is_empty()) {
            errors.push("All player names must be filled".to_string());
        }

        let unique: HashSet<String> = trimmed.iter().map(|n| n.to_lowercase()).collect();
        if unique.len() != trimmed.len() {
            errors.push("Player names must be unique".to_string());
        }

        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&self.total_rounds) {
            errors.push(format!(
                "Total rounds must be between {} and {}",
                MIN_ROUNDS, MAX_ROUNDS
            ));
        }

        errors
    }

    /// Build a new game with round 1 dealt, or the full list of problems.
    pub fn create_game(
        &self,
        game_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Game, SetupError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SetupError { errors });
        }

        let players: Vec<Player> = self
            .player_names
            .iter()
            .map(|name| Player::new(name.trim()))
            .collect();
        let first_round = Round::deal(1, self.total_rounds, &players);

        Ok(Game {
            id: ulid::Ulid::new().to_string(),
            name: format!("Wizard Game - {}", now.format("%Y-%m-%d")),
            players,
            rounds: Vec::new(),
            current_round: 1,
            total_rounds: self.total_rounds,
            is_complete: false,
            rules: self.rules.clone(),
            created_at: now,
            updated_at: now,
            is_live: game_code.is_some(),
            game_code,
            open_round: Some(first_round),
        })
    }
}
