use crate::types::*;
use serde::{Deserialize, Serialize};

/// Points for one player's round: hitting the bid pays 20 plus 10 per
/// trick, missing it costs 10 per trick of difference.
pub fn round_score(bid: u32, tricks: u32) -> i64 {
    if bid == tricks {
        20 + 10 * i64::from(tricks)
    } else {
        -10 * i64::from(bid.abs_diff(tricks))
    }
}

/// Running totals of one player at each round boundary, starting at 0
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerProgression {
    pub player_id: PlayerId,
    pub name: String,
    pub scores: Vec<i64>,
}

/// One line of the leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub total: i64,
    pub penalty_count: usize,
    pub penalty_points: i64,
}

/// Replay the completed round history. Each round contributes its bid/tricks
/// score plus the penalties logged against that round number.
pub fn score_progression(game: &Game) -> Vec<PlayerProgression> {
    game.players
        .iter()
        .map(|player| {
            let mut running = 0i64;
            let mut scores = Vec::with_capacity(game.rounds.len() + 1);
            scores.push(running);

            for round in &game.rounds {
                let delta = round
                    .players
                    .iter()
                    .find(|p| p.id == player.id)
                    .map(|p| round_score(p.bid.unwrap_or(0), p.tricks.unwrap_or(0)))
                    .unwrap_or(0);
                running = running
                    .saturating_add(delta)
                    .saturating_add(player.penalty_points_for_round(round.round_number));
                scores.push(running);
            }

            PlayerProgression {
                player_id: player.id.clone(),
                name: player.name.clone(),
                scores,
            }
        })
        .collect()
}

/// Leaderboard derived from the round history alone, highest total first.
///
/// Penalties logged against a round that has not been completed yet are
/// already part of the table's total, so they are added on top of the replay.
pub fn standings(game: &Game) -> Vec<Standing> {
    let progression = score_progression(game);

    let mut lines: Vec<Standing> = game
        .players
        .iter()
        .zip(progression)
        .map(|(player, prog)| {
            let replayed = prog.scores.last().copied().unwrap_or(0);
            let pending: i64 = player
                .penalties
                .iter()
                .filter(|p| !game.rounds.iter().any(|r| r.round_number == p.round_number))
                .fold(0i64, |sum, p| sum.saturating_add(p.points));

            Standing {
                rank: 0,
                player_id: player.id.clone(),
                name: player.name.clone(),
                total: replayed.saturating_add(pending),
                penalty_count: player.penalties.len(),
                penalty_points: player.penalty_points(),
            }
        })
        .collect();

    // stable sort keeps seating order between tied players
    lines.sort_by(|a, b| b.total.cmp(&a.total));

    let mut rank = 0;
    let mut previous: Option<i64> = None;
    for (index, line) in lines.iter_mut().enumerate() {
        if previous != Some(line.total) {
            rank = index + 1;
            previous = Some(line.total);
        }
        line.rank = rank;
    }

    lines
}
