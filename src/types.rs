use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;
pub type PlayerId = String;
pub type PenaltyId = String;

/// Smallest and largest number of rounds a game may be set up with
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 20;

/// Player count limits offered by the setup screen
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Edition {
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// 25 Year Anniversary edition: adds the bomb (voided trick) and the
    /// 9¾ cloud (one ±1 bid correction per round).
    #[serde(rename = "25year")]
    TwentyFiveYear,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomRules {
    /// Total of all bids may not equal the round number
    #[serde(default)]
    pub no_round_number_bid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    pub edition: Edition,
    #[serde(default)]
    pub custom_rules: CustomRules,
}

impl GameRules {
    pub fn is_twenty_five_year(&self) -> bool {
        self.edition == Edition::TwentyFiveYear
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    WrongPlay,
    WrongDeal,
    WrongBid,
    #[serde(rename = "other_mistake")]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Penalty {
    pub id: PenaltyId,
    #[serde(rename = "type")]
    pub kind: PenaltyKind,
    pub description: String,
    pub points: i64,
    pub round_number: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Completed round deltas plus every recorded penalty
    pub score: i64,
    #[serde(default)]
    pub penalties: Vec<Penalty>,
    #[serde(default = "default_penalty_multiplier")]
    pub penalty_multiplier: u32,
}

fn default_penalty_multiplier() -> u32 {
    1
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.into(),
            score: 0,
            penalties: Vec::new(),
            penalty_multiplier: 1,
        }
    }

    /// Sum of penalty points logged against one round, clamped to `i64`
    pub fn penalty_points_for_round(&self, round_number: u32) -> i64 {
        self.penalties
            .iter()
            .filter(|p| p.round_number == round_number)
            .fold(0i64, |sum, p| sum.saturating_add(p.points))
    }

    pub fn penalty_points(&self) -> i64 {
        self.penalties
            .iter()
            .fold(0i64, |sum, p| sum.saturating_add(p.points))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    #[default]
    Bidding,
    Tricks,
    Complete,
}

/// A player's entry within one round. `None` means "not yet entered".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundPlayer {
    pub id: PlayerId,
    pub name: String,
    pub bid: Option<u32>,
    pub tricks: Option<u32>,
    pub is_dealer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_number: u32,
    pub cards_in_hand: u32,
    pub players: Vec<RoundPlayer>,
    pub is_complete: bool,
    pub dealer_index: usize,
    #[serde(default)]
    pub phase: RoundPhase,
    /// 25 Year edition bomb: one trick of this round doesn't count
    #[serde(default)]
    pub voided_trick: bool,
    /// 25 Year edition cloud: the ±1 bid correction has been spent
    #[serde(default)]
    pub bid_correction_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub players: Vec<Player>,
    /// Completed rounds in play order
    pub rounds: Vec<Round>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub is_complete: bool,
    pub rules: GameRules,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Six character join code for live viewers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_code: Option<String>,
    #[serde(default)]
    pub is_live: bool,
    /// The round currently being played, persisted so it can be resumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_round: Option<Round>,
}

impl Game {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Enters bids, tricks and penalties for the table
    Scorer,
    /// Read-only spectator following a live game
    Viewer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edition_wire_names() {
        assert_eq!(
            serde_json::to_string(&Edition::TwentyFiveYear).unwrap(),
            "\"25year\""
        );
        assert_eq!(
            serde_json::from_str::<Edition>("\"standard\"").unwrap(),
            Edition::Standard
        );
    }

    #[test]
    fn test_penalty_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&PenaltyKind::Other).unwrap(),
            "\"other_mistake\""
        );
        assert_eq!(
            serde_json::from_str::<PenaltyKind>("\"wrong_deal\"").unwrap(),
            PenaltyKind::WrongDeal
        );
    }

    #[test]
    fn test_player_missing_multiplier_defaults_to_one() {
        let json = r#"{"id":"p1","name":"Alice","score":-10}"#;
        let player: Player = serde_json::from_str(json).unwrap();
        assert_eq!(player.penalty_multiplier, 1);
        assert!(player.penalties.is_empty());
    }
}
