//! Winner resolution for matches and tournaments.
//!
//! A match winner is a fair coin flip between the two sides. The randomness
//! source is injected through [`CoinFlip`] so callers (and tests) can fix the
//! outcome.
//!
//! A tournament winner is the winner of the most recently created match in
//! that tournament. The selection only depends on the match set, never on the
//! order the store happens to return it in.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::models::{Match, TeamId};

/// Outcome of a single coin flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSide {
    /// Side A wins
    Heads,
    /// Side B wins
    Tails,
}

impl CoinSide {
    /// Label used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            CoinSide::Heads => "team_a",
            CoinSide::Tails => "team_b",
        }
    }
}

/// Source of fair coin flips
pub trait CoinFlip: Send + Sync {
    fn flip(&self) -> CoinSide;
}

/// Thread-local RNG backed coin
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCoin;

impl CoinFlip for RandomCoin {
    fn flip(&self) -> CoinSide {
        match rand::rng().random_range(0..2u8) {
            0 => CoinSide::Heads,
            _ => CoinSide::Tails,
        }
    }
}

/// Coin that always lands on the same side
#[derive(Debug, Clone, Copy)]
pub struct FixedCoin(pub CoinSide);

impl CoinFlip for FixedCoin {
    fn flip(&self) -> CoinSide {
        self.0
    }
}

/// Coin that replays a fixed sequence of outcomes, wrapping around at the end
#[derive(Debug)]
pub struct SequenceCoin {
    sides: Vec<CoinSide>,
    next: AtomicUsize,
}

impl SequenceCoin {
    /// Create a sequence coin.
    ///
    /// An empty sequence behaves like `FixedCoin(CoinSide::Heads)`.
    pub fn new(sides: Vec<CoinSide>) -> Self {
        Self {
            sides,
            next: AtomicUsize::new(0),
        }
    }
}

impl CoinFlip for SequenceCoin {
    fn flip(&self) -> CoinSide {
        if self.sides.is_empty() {
            return CoinSide::Heads;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.sides.len();
        self.sides[idx]
    }
}

/// Pick the winner of a match between `team_a` and `team_b`.
///
/// Heads → `team_a`, tails → `team_b`. The side is returned alongside the
/// winner for logging and metrics.
pub fn resolve_match_winner(
    coin: &dyn CoinFlip,
    team_a: TeamId,
    team_b: TeamId,
) -> (TeamId, CoinSide) {
    let side = coin.flip();
    let winner_id = match side {
        CoinSide::Heads => team_a,
        CoinSide::Tails => team_b,
    };
    (winner_id, side)
}

/// Derive a tournament winner from its matches.
///
/// Returns the winner of the most recently created match (ties on
/// `created_at` broken by the higher id), or `None` when there are no
/// matches.
pub fn resolve_tournament_winner(matches: &[Match]) -> Option<TeamId> {
    matches
        .iter()
        .max_by_key(|m| (m.created_at, m.id))
        .map(|m| m.winner_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn match_at(id: i32, minutes_ago: i64, winner_id: TeamId) -> Match {
        Match {
            id,
            team_a_id: 1,
            team_b_id: 2,
            tournament_id: 1,
            winner_id,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_fixed_coin_picks_each_side() {
        assert_eq!(
            resolve_match_winner(&FixedCoin(CoinSide::Heads), 7, 9),
            (7, CoinSide::Heads)
        );
        assert_eq!(
            resolve_match_winner(&FixedCoin(CoinSide::Tails), 7, 9),
            (9, CoinSide::Tails)
        );
    }

    #[test]
    fn test_sequence_coin_wraps_around() {
        let coin = SequenceCoin::new(vec![CoinSide::Heads, CoinSide::Tails]);
        assert_eq!(coin.flip(), CoinSide::Heads);
        assert_eq!(coin.flip(), CoinSide::Tails);
        assert_eq!(coin.flip(), CoinSide::Heads);
    }

    #[test]
    fn test_empty_sequence_coin_is_heads() {
        let coin = SequenceCoin::new(Vec::new());
        assert_eq!(coin.flip(), CoinSide::Heads);
    }

    #[test]
    fn test_random_coin_is_roughly_fair() {
        let coin = RandomCoin;
        let flips = 10_000;
        let heads = (0..flips)
            .filter(|_| resolve_match_winner(&coin, 1, 2).0 == 1)
            .count();

        // 10k flips: stddev is 50, so 45%..55% is a 10-sigma band
        assert!(heads > 4_500 && heads < 5_500, "heads = {heads}");
    }

    #[test]
    fn test_no_matches_no_winner() {
        assert_eq!(resolve_tournament_winner(&[]), None);
    }

    #[test]
    fn test_latest_match_decides() {
        let matches = vec![match_at(1, 30, 1), match_at(2, 5, 2), match_at(3, 60, 1)];
        assert_eq!(resolve_tournament_winner(&matches), Some(2));
    }

    #[test]
    fn test_selection_ignores_input_order() {
        let mut matches = vec![match_at(1, 30, 1), match_at(2, 5, 2), match_at(3, 60, 1)];
        let first = resolve_tournament_winner(&matches);
        matches.reverse();
        assert_eq!(resolve_tournament_winner(&matches), first);
    }

    #[test]
    fn test_same_timestamp_higher_id_wins() {
        let now = Utc::now();
        let mut a = match_at(4, 0, 1);
        let mut b = match_at(5, 0, 2);
        a.created_at = now;
        b.created_at = now;
        assert_eq!(resolve_tournament_winner(&[b, a]), Some(2));
    }
}
