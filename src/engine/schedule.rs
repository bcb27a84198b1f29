/// Hand size for a round of a pyramid schedule: rises by one card per round
/// up to the middle of the game, then falls back to one.
///
/// `2 * round <= total` is the exact form of `round <= total / 2` without
/// truncating, so odd games peak once at the middle round.
pub fn cards_in_hand(round_number: u32, total_rounds: u32) -> u32 {
    if round_number.saturating_mul(2) <= total_rounds {
        round_number
    } else {
        (total_rounds + 1).saturating_sub(round_number)
    }
}

/// Seat index of the dealer; the deal rotates one seat per round.
pub fn dealer_index(round_number: u32, player_count: usize) -> usize {
    if player_count == 0 {
        return 0;
    }
    (round_number.saturating_sub(1) as usize) % player_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_schedule_is_symmetric() {
        let hands: Vec<u32> = (1..=10).map(|r| cards_in_hand(r, 10)).collect();
        assert_eq!(hands, vec![1, 2, 3, 4, 5, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_odd_schedule_peaks_once() {
        let hands: Vec<u32> = (1..=9).map(|r| cards_in_hand(r, 9)).collect();
        assert_eq!(hands, vec![1, 2, 3, 4, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_single_round_game() {
        assert_eq!(cards_in_hand(1, 1), 1);
    }

    #[test]
    fn test_two_round_game() {
        assert_eq!(cards_in_hand(1, 2), 1);
        assert_eq!(cards_in_hand(2, 2), 1);
    }

    #[test]
    fn test_dealer_rotates_through_seats() {
        let dealers: Vec<usize> = (1..=8).map(|r| dealer_index(r, 4)).collect();
        assert_eq!(dealers, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_dealer_with_no_players() {
        assert_eq!(dealer_index(3, 0), 0);
    }
}
