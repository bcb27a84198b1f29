use super::{EngineError, EngineResult};
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A penalty as entered at the table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PenaltyRequest {
    pub kind: PenaltyKind,
    pub description: String,
    /// Point delta; `None` takes the suggested default for the player
    #[serde(default)]
    pub points: Option<i64>,
}

/// Default penalty for a player: -10, doubling with every earlier penalty.
/// Saturates instead of overflowing for absurd multipliers.
pub fn suggested_penalty(multiplier: u32) -> i64 {
    let exponent = multiplier.saturating_sub(1);
    2i64.checked_pow(exponent)
        .and_then(|factor| factor.checked_mul(-10))
        .unwrap_or(i64::MIN)
}

/// Record a penalty against a player for the round being played.
///
/// The points count toward the player's score immediately and the player's
/// multiplier escalates. A blank description is ignored and yields `None`.
/// Points that would push the score past the `i64` range are refused.
pub fn record_penalty(
    game: &Game,
    player_id: &str,
    request: PenaltyRequest,
    now: DateTime<Utc>,
) -> EngineResult<Option<Game>> {
    if game.is_complete {
        return Err(EngineError::GameComplete);
    }
    let index = game
        .player_index(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;

    let description = request.description.trim();
    if description.is_empty() {
        tracing::debug!("Ignoring penalty with empty description for {}", player_id);
        return Ok(None);
    }

    let mut next = game.clone();
    let player = &mut next.players[index];
    let points = request
        .points
        .unwrap_or_else(|| suggested_penalty(player.penalty_multiplier));

    player.penalties.push(Penalty {
        id: ulid::Ulid::new().to_string(),
        kind: request.kind,
        description: description.to_string(),
        points,
        round_number: game.current_round,
        timestamp: now,
    });
    player.score = player
        .score
        .checked_add(points)
        .ok_or_else(|| EngineError::ScoreOverflow(player_id.to_string()))?;
    player.penalty_multiplier = player.penalty_multiplier.saturating_add(1);
    next.updated_at = now;

    Ok(Some(next))
}

/// Put a player's multiplier back to 1. Recorded penalties are kept.
pub fn reset_penalty_multiplier(
    game: &Game,
    player_id: &str,
    now: DateTime<Utc>,
) -> EngineResult<Game> {
    let index = game
        .player_index(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;

    let mut next = game.clone();
    next.players[index].penalty_multiplier = 1;
    next.updated_at = now;
    Ok(next)
}
