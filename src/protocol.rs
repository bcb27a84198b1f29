use crate::engine::{
    self, score_progression, standings, suggested_penalty, BidCorrection, GameSetup,
    PlayerProgression, Standing,
};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    // Scorer-only messages
    StartGame(GameSetup),
    ResumeGame {
        game_id: GameId,
    },
    IncrementBid {
        player_id: PlayerId,
    },
    DecrementBid {
        player_id: PlayerId,
    },
    SetBid {
        player_id: PlayerId,
        bid: u32,
    },
    IncrementTricks {
        player_id: PlayerId,
    },
    DecrementTricks {
        player_id: PlayerId,
    },
    SetTricks {
        player_id: PlayerId,
        tricks: u32,
    },
    CorrectBid {
        player_id: PlayerId,
        direction: BidCorrection,
    },
    SetVoidedTrick {
        voided: bool,
    },
    CompleteBidding,
    CompleteRound,
    AddPenalty {
        player_id: PlayerId,
        kind: PenaltyKind,
        description: String,
        /// Omitted to take the suggested amount
        #[serde(default)]
        points: Option<i64>,
    },
    ResetPenaltyMultiplier {
        player_id: PlayerId,
    },
    AbandonGame,
    // Any role
    GetState,
    JoinLive {
        game_code: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        /// Whether games get a code viewers can join with
        live_enabled: bool,
        game: Option<GameView>,
        server_now: String,
    },
    GameState {
        view: GameView,
    },
    SetupRejected {
        errors: Vec<String>,
    },
    GameEnded {
        game: Game,
        standings: Vec<Standing>,
        progression: Vec<PlayerProgression>,
    },
    GameAbandoned {
        game_id: GameId,
    },
    LiveSnapshot {
        view: GameView,
    },
    LiveError {
        code: String,
        msg: String,
    },
    Error {
        code: String,
        msg: String,
    },
}

/// A game plus everything the score sheet derives from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameView {
    pub game: Game,
    /// Absent once the game is complete
    pub round: Option<RoundView>,
    pub standings: Vec<Standing>,
    /// Next default penalty per player
    pub suggested_penalties: HashMap<PlayerId, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundView {
    pub round: Round,
    pub bid_total: u32,
    pub trick_total: u32,
    pub expected_tricks: u32,
    pub can_complete_bidding: bool,
    pub can_complete_round: bool,
    /// Shown to the table when the bidding gate refuses on the house rule
    pub house_rule_message: Option<String>,
}

impl RoundView {
    pub fn new(round: Round, rules: &GameRules) -> Self {
        let bidding = round.check_bidding(rules);
        let in_bidding = round.phase == RoundPhase::Bidding;
        let house_rule_message = match &bidding {
            Err(block) if in_bidding => block.user_message(),
            _ => None,
        };
        Self {
            bid_total: round.bid_total(),
            trick_total: round.trick_total(),
            expected_tricks: round.expected_tricks(),
            can_complete_bidding: in_bidding && bidding.is_ok(),
            can_complete_round: round.phase == RoundPhase::Tricks && round.check_tricks().is_ok(),
            house_rule_message,
            round,
        }
    }
}

impl GameView {
    pub fn new(game: &Game) -> Self {
        let round = engine::current_round(game)
            .ok()
            .map(|round| RoundView::new(round, &game.rules));
        Self {
            round,
            standings: standings(game),
            suggested_penalties: game
                .players
                .iter()
                .map(|p| (p.id.clone(), suggested_penalty(p.penalty_multiplier)))
                .collect(),
            game: game.clone(),
        }
    }
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }

    pub fn game_state(game: &Game) -> Self {
        ServerMessage::GameState {
            view: GameView::new(game),
        }
    }

    /// Final results for a finished game
    pub fn game_ended(game: &Game) -> Self {
        ServerMessage::GameEnded {
            game: game.clone(),
            standings: standings(game),
            progression: score_progression(game),
        }
    }
}
