use super::schedule::{cards_in_hand, dealer_index};
use super::score::{round_score, standings};
use super::{EngineError, EngineResult};
use crate::types::*;
use chrono::{DateTime, Utc};

/// The round being played: the persisted open round when it belongs to the
/// current round number, otherwise a freshly dealt one.
pub fn current_round(game: &Game) -> EngineResult<Round> {
    if is_finished(game) {
        return Err(EngineError::GameComplete);
    }
    match &game.open_round {
        Some(round) if round.round_number == game.current_round => Ok(round.clone()),
        _ => Ok(Round::deal(
            game.current_round,
            game.total_rounds,
            &game.players,
        )),
    }
}

pub fn is_finished(game: &Game) -> bool {
    game.is_complete || game.current_round > game.total_rounds
}

/// Swap in an updated open round
pub fn replace_open_round(game: &Game, round: Round, now: DateTime<Utc>) -> Game {
    Game {
        open_round: Some(round),
        updated_at: now,
        ..game.clone()
    }
}

/// Score the open round and move the game forward.
///
/// Penalties were added to the players' scores when they were recorded, so
/// only the bid/tricks delta is applied here. After the last round the game
/// is marked complete and no new round is dealt.
pub fn complete_round(game: &Game, now: DateTime<Utc>) -> EngineResult<Game> {
    let closed = current_round(game)?.close()?;

    let mut next = game.clone();
    for player in next.players.iter_mut() {
        let entry = closed
            .player(&player.id)
            .ok_or_else(|| EngineError::UnknownPlayer(player.id.clone()))?;
        let delta = round_score(entry.bid.unwrap_or(0), entry.tricks.unwrap_or(0));
        player.score = player
            .score
            .checked_add(delta)
            .ok_or_else(|| EngineError::ScoreOverflow(player.id.clone()))?;
    }

    next.rounds.push(closed);
    next.current_round += 1;
    next.updated_at = now;

    if next.current_round > next.total_rounds {
        next.is_complete = true;
        next.open_round = None;
        tracing::info!("Game {} complete after {} rounds", next.id, next.total_rounds);
    } else {
        next.open_round = Some(Round::deal(
            next.current_round,
            next.total_rounds,
            &next.players,
        ));
    }

    Ok(next)
}

/// Structural checks for a game document coming from storage or an import.
pub fn validate_game(game: &Game) -> Result<(), String> {
    if game.players.len() < MIN_PLAYERS {
        return Err(format!("Game '{}' has fewer than 2 players", game.id));
    }
    if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&game.total_rounds) {
        return Err(format!(
            "Game '{}' has {} total rounds, expected {}..={}",
            game.id, game.total_rounds, MIN_ROUNDS, MAX_ROUNDS
        ));
    }

    let expected_rounds = if game.is_complete {
        game.total_rounds as usize
    } else {
        game.current_round.saturating_sub(1) as usize
    };
    if game.rounds.len() != expected_rounds {
        return Err(format!(
            "Game '{}' has {} completed rounds but is on round {}",
            game.id,
            game.rounds.len(),
            game.current_round
        ));
    }

    for (index, round) in game.rounds.iter().enumerate() {
        if round.round_number as usize != index + 1 {
            return Err(format!(
                "Round at position {} is numbered {}",
                index + 1,
                round.round_number
            ));
        }
        if !round.is_complete {
            return Err(format!("Round {} is in history but not complete", round.round_number));
        }
        if round.players.len() != game.players.len()
            || game.players.iter().any(|p| round.player(&p.id).is_none())
        {
            return Err(format!(
                "Round {} does not list the game's players",
                round.round_number
            ));
        }
    }

    if let Some(round) = &game.open_round {
        validate_open_round(game, round)?;
    }

    if let Some(player) = game.players.iter().find(|p| p.penalty_multiplier == 0) {
        return Err(format!("Player '{}' has a penalty multiplier of 0", player.id));
    }

    for line in standings(game) {
        if let Some(player) = game.player(&line.player_id) {
            if player.score != line.total {
                return Err(format!(
                    "Player '{}' has stored score {} but the round history adds up to {}",
                    player.id, player.score, line.total
                ));
            }
        }
    }

    Ok(())
}

/// The open round must be the one `current_round` would deal, with entries
/// that fit in the hand.
fn validate_open_round(game: &Game, round: &Round) -> Result<(), String> {
    if is_finished(game) {
        return Err("A finished game still has an open round".to_string());
    }
    if round.round_number != game.current_round {
        return Err(format!(
            "Open round is numbered {} but the game is on round {}",
            round.round_number, game.current_round
        ));
    }

    let expected_cards = cards_in_hand(round.round_number, game.total_rounds);
    if round.cards_in_hand != expected_cards {
        return Err(format!(
            "Open round deals {} cards, expected {}",
            round.cards_in_hand, expected_cards
        ));
    }
    let expected_dealer = dealer_index(round.round_number, game.players.len());
    if round.dealer_index != expected_dealer {
        return Err(format!(
            "Open round has dealer {}, expected {}",
            round.dealer_index, expected_dealer
        ));
    }

    if round.players.len() != game.players.len()
        || round
            .players
            .iter()
            .zip(&game.players)
            .any(|(entry, player)| entry.id != player.id)
    {
        return Err("Open round does not list the game's players".to_string());
    }

    if round.is_complete || round.phase == RoundPhase::Complete {
        return Err("Open round is already complete".to_string());
    }

    for entry in &round.players {
        let over = [entry.bid, entry.tricks]
            .into_iter()
            .flatten()
            .find(|value| *value > round.cards_in_hand);
        if let Some(value) = over {
            return Err(format!(
                "Player '{}' has {} in a round of {} cards",
                entry.id, value, round.cards_in_hand
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{record_penalty, GameSetup, PenaltyRequest};

    fn new_game(total_rounds: u32) -> Game {
        GameSetup {
            player_names: vec!["Alice".to_string(), "Bob".to_string()],
            total_rounds,
            rules: GameRules::default(),
        }
        .create_game(None, Utc::now())
        .unwrap()
    }

    /// Drive the open round through bidding and tricks with fixed entries
    fn play(game: &Game, bids: &[u32], tricks: &[u32]) -> Game {
        let mut round = current_round(game).unwrap();
        for (p, bid) in game.players.iter().zip(bids) {
            round = round.set_bid(&p.id, *bid).unwrap();
        }
        round = round.complete_bidding(&game.rules).unwrap();
        for (p, t) in game.players.iter().zip(tricks) {
            round = round.set_tricks(&p.id, *t).unwrap();
        }
        let game = replace_open_round(game, round, Utc::now());
        complete_round(&game, Utc::now()).unwrap()
    }

    #[test]
    fn test_complete_round_scores_and_advances() {
        let game = new_game(4);
        let game = play(&game, &[1, 0], &[1, 0]);

        assert_eq!(game.current_round, 2);
        assert_eq!(game.rounds.len(), 1);
        assert!(game.rounds[0].is_complete);
        assert_eq!(game.players[0].score, 30);
        assert_eq!(game.players[1].score, 20);

        let next = game.open_round.as_ref().unwrap();
        assert_eq!(next.round_number, 2);
        assert_eq!(next.cards_in_hand, 2);
        assert!(next.players[1].is_dealer);
        assert!(validate_game(&game).is_ok());
    }

    #[test]
    fn test_last_round_completes_game() {
        let game = new_game(1);
        let game = play(&game, &[1, 1], &[1, 0]);

        assert!(game.is_complete);
        assert_eq!(game.current_round, 2);
        assert_eq!(game.rounds.len(), 1);
        assert!(game.open_round.is_none());
        assert_eq!(current_round(&game), Err(EngineError::GameComplete));
        assert!(validate_game(&game).is_ok());
    }

    #[test]
    fn test_complete_round_requires_tricks_phase() {
        let game = new_game(4);
        assert!(matches!(
            complete_round(&game, Utc::now()),
            Err(EngineError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_penalties_are_counted_once() {
        let game = new_game(4);
        let alice = game.players[0].id.clone();
        let game = record_penalty(
            &game,
            &alice,
            PenaltyRequest {
                kind: PenaltyKind::WrongBid,
                description: "bid out of turn".to_string(),
                points: None,
            },
            Utc::now(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(game.players[0].score, -10);

        let game = play(&game, &[1, 0], &[1, 0]);
        assert_eq!(game.players[0].score, 20);
        assert_eq!(standings(&game)[0].total, 20);
        assert!(validate_game(&game).is_ok());
    }

    #[test]
    fn test_current_round_deals_when_open_round_is_stale() {
        let mut game = new_game(4);
        let stale = game.open_round.clone().unwrap();
        game.current_round = 2;
        game.rounds.push(Round {
            is_complete: true,
            phase: RoundPhase::Complete,
            ..stale
        });

        let round = current_round(&game).unwrap();
        assert_eq!(round.round_number, 2);
        assert!(round.players.iter().all(|p| p.bid.is_none()));
    }

    #[test]
    fn test_validate_rejects_tampered_score() {
        let mut game = new_game(4);
        game = play(&game, &[1, 0], &[1, 0]);
        game.players[1].score = 500;
        let err = validate_game(&game).unwrap_err();
        assert!(err.contains("adds up to 20"));
    }

    #[test]
    fn test_validate_rejects_missing_rounds() {
        let mut game = new_game(4);
        game.current_round = 3;
        let err = validate_game(&game).unwrap_err();
        assert!(err.contains("0 completed rounds"));
    }

    #[test]
    fn test_round_score_past_i64_is_refused() {
        let game = new_game(4);
        let alice = game.players[0].id.clone();
        let game = record_penalty(
            &game,
            &alice,
            PenaltyRequest {
                kind: PenaltyKind::Other,
                description: "bookkeeping".to_string(),
                points: Some(i64::MAX - 10),
            },
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        let mut round = current_round(&game).unwrap();
        round = round.set_bid(&alice, 1).unwrap();
        round = round.set_bid(&game.players[1].id, 1).unwrap();
        round = round.complete_bidding(&game.rules).unwrap();
        round = round.set_tricks(&alice, 1).unwrap();
        round = round.set_tricks(&game.players[1].id, 0).unwrap();
        let game = replace_open_round(&game, round, Utc::now());

        assert_eq!(
            complete_round(&game, Utc::now()),
            Err(EngineError::ScoreOverflow(alice))
        );
        assert!(validate_game(&game).is_ok());
    }

    fn open_round_rejection(edit: impl FnOnce(&mut Game)) -> String {
        let mut game = play(&new_game(4), &[1, 0], &[1, 0]);
        assert!(validate_game(&game).is_ok());
        edit(&mut game);
        validate_game(&game).unwrap_err()
    }

    #[test]
    fn test_validate_rejects_open_round_for_another_round() {
        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.round_number = 3;
            }
        });
        assert!(err.contains("numbered 3"));
    }

    #[test]
    fn test_validate_rejects_open_round_hand_size() {
        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.cards_in_hand = 50;
            }
        });
        assert!(err.contains("deals 50 cards, expected 2"));
    }

    #[test]
    fn test_validate_rejects_open_round_dealer() {
        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.dealer_index = 0;
            }
        });
        assert!(err.contains("dealer 0, expected 1"));
    }

    #[test]
    fn test_validate_rejects_open_round_players() {
        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.players.swap(0, 1);
            }
        });
        assert!(err.contains("game's players"));

        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.players.pop();
            }
        });
        assert!(err.contains("game's players"));
    }

    #[test]
    fn test_validate_rejects_completed_open_round() {
        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.phase = RoundPhase::Complete;
            }
        });
        assert!(err.contains("already complete"));

        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.is_complete = true;
            }
        });
        assert!(err.contains("already complete"));
    }

    #[test]
    fn test_validate_rejects_entries_larger_than_the_hand() {
        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.players[0].bid = Some(3);
            }
        });
        assert!(err.contains("has 3 in a round of 2 cards"));

        let err = open_round_rejection(|g| {
            if let Some(round) = g.open_round.as_mut() {
                round.phase = RoundPhase::Tricks;
                round.players[1].tricks = Some(40);
            }
        });
        assert!(err.contains("has 40 in a round of 2 cards"));
    }

    #[test]
    fn test_validate_rejects_open_round_on_finished_game() {
        let game = play(&new_game(1), &[1, 1], &[1, 0]);
        let mut leftover = game.rounds[0].clone();
        leftover.is_complete = false;
        leftover.phase = RoundPhase::Bidding;
        let game = Game {
            open_round: Some(leftover),
            ..game
        };
        let err = validate_game(&game).unwrap_err();
        assert!(err.contains("finished game"));
    }

    #[test]
    fn test_validate_accepts_entered_open_round() {
        let game = new_game(4);
        let round = current_round(&game)
            .unwrap()
            .set_bid(&game.players[0].id, 1)
            .unwrap();
        let game = replace_open_round(&game, round, Utc::now());
        assert!(validate_game(&game).is_ok());
    }
}
