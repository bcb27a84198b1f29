use super::schedule::{cards_in_hand, dealer_index};
use super::{EngineError, EngineResult, GateBlock};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Direction of the 25 Year edition ±1 bid correction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BidCorrection {
    Up,
    Down,
}

impl Round {
    /// Deal a fresh round: hand size and dealer follow from the round number,
    /// nobody has bid or taken tricks yet.
    pub fn deal(round_number: u32, total_rounds: u32, players: &[Player]) -> Self {
        let dealer = dealer_index(round_number, players.len());
        Self {
            round_number,
            cards_in_hand: cards_in_hand(round_number, total_rounds),
            players: players
                .iter()
                .enumerate()
                .map(|(index, p)| RoundPlayer {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    bid: None,
                    tricks: None,
                    is_dealer: index == dealer,
                })
                .collect(),
            is_complete: false,
            dealer_index: dealer,
            phase: RoundPhase::Bidding,
            voided_trick: false,
            bid_correction_used: false,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&RoundPlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn bid_total(&self) -> u32 {
        self.players.iter().filter_map(|p| p.bid).sum()
    }

    pub fn trick_total(&self) -> u32 {
        self.players.iter().filter_map(|p| p.tricks).sum()
    }

    /// Tricks that must be accounted for before the round can close
    pub fn expected_tricks(&self) -> u32 {
        if self.voided_trick {
            self.cards_in_hand.saturating_sub(1)
        } else {
            self.cards_in_hand
        }
    }

    pub fn increment_bid(&self, player_id: &str) -> EngineResult<Round> {
        self.step_bid(player_id, 1)
    }

    pub fn decrement_bid(&self, player_id: &str) -> EngineResult<Round> {
        self.step_bid(player_id, -1)
    }

    pub fn set_bid(&self, player_id: &str, bid: u32) -> EngineResult<Round> {
        self.require_phase(RoundPhase::Bidding)?;
        let bid = self.in_range(bid)?;
        self.with_player(player_id, |p| p.bid = Some(bid))
    }

    pub fn increment_tricks(&self, player_id: &str) -> EngineResult<Round> {
        self.step_tricks(player_id, 1)
    }

    pub fn decrement_tricks(&self, player_id: &str) -> EngineResult<Round> {
        self.step_tricks(player_id, -1)
    }

    pub fn set_tricks(&self, player_id: &str, tricks: u32) -> EngineResult<Round> {
        self.require_phase(RoundPhase::Tricks)?;
        let tricks = self.in_range(tricks)?;
        self.with_player(player_id, |p| p.tricks = Some(tricks))
    }

    /// The 9¾ cloud: one player's bid moves by one during the tricks phase,
    /// once per round.
    pub fn correct_bid(
        &self,
        player_id: &str,
        direction: BidCorrection,
        rules: &GameRules,
    ) -> EngineResult<Round> {
        if !rules.is_twenty_five_year() {
            return Err(EngineError::EditionOnly("the bid correction"));
        }
        self.require_phase(RoundPhase::Tricks)?;
        if self.bid_correction_used {
            return Err(EngineError::BidCorrectionUsed);
        }

        let delta = match direction {
            BidCorrection::Up => 1,
            BidCorrection::Down => -1,
        };
        let cards = self.cards_in_hand;
        let mut next = self.with_player(player_id, |p| p.bid = Some(step(p.bid, delta, cards)))?;
        next.bid_correction_used = true;
        Ok(next)
    }

    /// The bomb: toggled while counting tricks.
    pub fn set_voided_trick(&self, voided: bool, rules: &GameRules) -> EngineResult<Round> {
        if !rules.is_twenty_five_year() {
            return Err(EngineError::EditionOnly("the voided trick"));
        }
        self.require_phase(RoundPhase::Tricks)?;
        Ok(Round {
            voided_trick: voided,
            ..self.clone()
        })
    }

    /// Gate between bidding and trick counting
    pub fn check_bidding(&self, rules: &GameRules) -> Result<(), GateBlock> {
        if self.players.iter().any(|p| p.bid.is_none()) {
            return Err(GateBlock::MissingBids);
        }
        if rules.custom_rules.no_round_number_bid {
            let total = self.bid_total();
            if total == self.round_number {
                return Err(GateBlock::RoundNumberBid {
                    total,
                    round_number: self.round_number,
                });
            }
        }
        Ok(())
    }

    /// Gate between trick counting and scoring
    pub fn check_tricks(&self) -> Result<(), GateBlock> {
        if self.players.iter().any(|p| p.tricks.is_none()) {
            return Err(GateBlock::MissingTricks);
        }
        let total = self.trick_total();
        let expected = self.expected_tricks();
        if total != expected {
            return Err(GateBlock::TrickTotal { total, expected });
        }
        Ok(())
    }

    pub fn complete_bidding(&self, rules: &GameRules) -> EngineResult<Round> {
        self.require_phase(RoundPhase::Bidding)?;
        self.check_bidding(rules)?;
        Ok(Round {
            phase: RoundPhase::Tricks,
            ..self.clone()
        })
    }

    /// Close the round after the tricks gate passes
    pub(super) fn close(&self) -> EngineResult<Round> {
        self.require_phase(RoundPhase::Tricks)?;
        self.check_tricks()?;
        Ok(Round {
            phase: RoundPhase::Complete,
            is_complete: true,
            ..self.clone()
        })
    }

    fn step_bid(&self, player_id: &str, delta: i32) -> EngineResult<Round> {
        self.require_phase(RoundPhase::Bidding)?;
        let cards = self.cards_in_hand;
        self.with_player(player_id, |p| p.bid = Some(step(p.bid, delta, cards)))
    }

    fn step_tricks(&self, player_id: &str, delta: i32) -> EngineResult<Round> {
        self.require_phase(RoundPhase::Tricks)?;
        let cards = self.cards_in_hand;
        self.with_player(player_id, |p| p.tricks = Some(step(p.tricks, delta, cards)))
    }

    fn require_phase(&self, expected: RoundPhase) -> EngineResult<()> {
        if self.phase != expected {
            return Err(EngineError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn in_range(&self, value: u32) -> EngineResult<u32> {
        if value > self.cards_in_hand {
            return Err(EngineError::OutOfRange {
                value,
                max: self.cards_in_hand,
            });
        }
        Ok(value)
    }

    fn with_player(
        &self,
        player_id: &str,
        update: impl FnOnce(&mut RoundPlayer),
    ) -> EngineResult<Round> {
        let mut next = self.clone();
        let player = next
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;
        update(player);
        Ok(next)
    }
}

/// Move an entry by one, clamped to `0..=max`. An empty entry counts as zero.
fn step(current: Option<u32>, delta: i32, max: u32) -> u32 {
    let base = current.unwrap_or(0);
    if delta >= 0 {
        base.saturating_add(delta.unsigned_abs()).min(max)
    } else {
        base.saturating_sub(delta.unsigned_abs())
    }
}
