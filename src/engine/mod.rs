//! Round & scoring engine.
//!
//! Everything in here is synchronous and side-effect free: operations borrow
//! the current `Game` or `Round` and hand back a replacement value, so a
//! rejected intent never leaves a half-applied state behind.

mod game;
mod penalty;
mod round;
mod schedule;
mod score;
mod setup;

pub use game::{complete_round, current_round, is_finished, replace_open_round, validate_game};
pub use penalty::{record_penalty, reset_penalty_multiplier, suggested_penalty, PenaltyRequest};
pub use round::BidCorrection;
pub use schedule::{cards_in_hand, dealer_index};
pub use score::{round_score, score_progression, standings, PlayerProgression, Standing};
pub use setup::{GameSetup, SetupError};

use crate::types::{PlayerId, RoundPhase};

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Reasons a phase gate refuses to let the round advance.
///
/// Only the house-rule violation is meant to be shown to players; the other
/// variants are ordinary "not finished yet" states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateBlock {
    #[error("not every player has a bid")]
    MissingBids,

    #[error("Cannot complete bidding: Total bids ({total}) equals round number ({round_number})")]
    RoundNumberBid { total: u32, round_number: u32 },

    #[error("not every player has a tricks count")]
    MissingTricks,

    #[error("tricks total is {total}, expected {expected}")]
    TrickTotal { total: u32, expected: u32 },
}

impl GateBlock {
    /// Message for the table, if this block is one players need to act on
    pub fn user_message(&self) -> Option<String> {
        match self {
            GateBlock::RoundNumberBid { .. } => Some(self.to_string()),
            _ => None,
        }
    }
}

/// Errors that can occur while applying an intent to a game
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("player {0} is not part of this game")]
    UnknownPlayer(PlayerId),

    #[error("round is in {actual:?} phase, expected {expected:?}")]
    WrongPhase {
        expected: RoundPhase,
        actual: RoundPhase,
    },

    #[error("value {value} is outside 0..={max}")]
    OutOfRange { value: u32, max: u32 },

    #[error("{0} is only available in the 25 Year edition")]
    EditionOnly(&'static str),

    #[error("the bid correction was already used this round")]
    BidCorrectionUsed,

    #[error(transparent)]
    Blocked(#[from] GateBlock),

    #[error("game is already complete")]
    GameComplete,

    #[error("score of player {0} would overflow")]
    ScoreOverflow(PlayerId),
}
