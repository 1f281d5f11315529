//! Move selectors and tie-break policies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Board, GameRng, Move};
use crate::strategy::Strategy;

/// Scores closer than this to the best score count as tied.
const TIE_EPSILON: f64 = 1e-12;

// =============================================================================
// Move Selector
// =============================================================================

/// Chooses a move for the side to play.
///
/// Selectors are shared across worker threads. All per-game randomness comes
/// from the `rng` argument, which the worker owns.
///
/// Contract: when `legal` is non-empty the result must be `Some` and must be
/// an element of `legal`. The worker treats anything else as a defect.
pub trait MoveSelector: Send + Sync {
    /// Choose a move from `legal`.
    fn choose_move(&self, board: &Board, legal: &[Move], rng: &mut GameRng) -> Option<Move>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;
}

// =============================================================================
// Tie-Break Policy
// =============================================================================

/// How a [`Player`] turns strategy scores into a single move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TieBreak {
    /// Uniformly random among the moves sharing the best score.
    #[default]
    UniformBest,
    /// Sample with weight `exp((score - best) / temperature)`.
    ///
    /// A non-positive temperature degrades to `UniformBest`.
    Weighted { temperature: f64 },
}

impl TieBreak {
    /// Pick an index into `scores`. Non-finite scores are never chosen.
    pub fn pick(&self, scores: &[f64], rng: &mut GameRng) -> Option<usize> {
        let best = scores
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if !best.is_finite() {
            return None;
        }

        match *self {
            TieBreak::Weighted { temperature } if temperature > 0.0 => {
                let weights: Vec<f64> = scores
                    .iter()
                    .map(|&s| {
                        if s.is_finite() {
                            ((s - best) / temperature).exp()
                        } else {
                            0.0
                        }
                    })
                    .collect();
                rng.choose_weighted(&weights)
            }
            _ => {
                let tied: Vec<usize> = scores
                    .iter()
                    .enumerate()
                    .filter(|(_, &s)| s.is_finite() && best - s <= TIE_EPSILON)
                    .map(|(i, _)| i)
                    .collect();
                rng.choose(&tied).copied()
            }
        }
    }
}

// =============================================================================
// Player
// =============================================================================

/// A strategy paired with a tie-break policy.
#[derive(Clone)]
pub struct Player {
    strategy: Arc<dyn Strategy>,
    tie_break: TieBreak,
}

impl Player {
    /// Create a player that breaks ties uniformly.
    pub fn new(strategy: Arc<dyn Strategy>) -> Self {
        Self {
            strategy,
            tie_break: TieBreak::UniformBest,
        }
    }

    /// Set the tie-break policy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Get the strategy.
    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Get the tie-break policy.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

impl MoveSelector for Player {
    fn choose_move(&self, board: &Board, legal: &[Move], rng: &mut GameRng) -> Option<Move> {
        if legal.is_empty() {
            return None;
        }

        let scores: Vec<f64> = legal
            .iter()
            .map(|&mv| self.strategy.evaluate(mv, board))
            .collect();

        self.tie_break.pick(&scores, rng).map(|i| legal[i])
    }

    fn name(&self) -> &str {
        self.strategy.name()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("strategy", &self.strategy.name())
            .field("tie_break", &self.tie_break)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use crate::rules::{GameEngine, OthelloEngine};
    use crate::strategy::{FirstLegalStrategy, UniformStrategy};

    fn opening_moves() -> Vec<Move> {
        OthelloEngine::new()
            .legal_moves(&Board::initial(), Side::Black)
            .to_vec()
    }

    #[test]
    fn test_uniform_best_picks_unique_max() {
        let mut rng = GameRng::new(1);
        let tie_break = TieBreak::UniformBest;
        for _ in 0..20 {
            assert_eq!(tie_break.pick(&[0.1, 0.9, 0.3], &mut rng), Some(1));
        }
    }

    #[test]
    fn test_uniform_best_spreads_over_ties() {
        let mut rng = GameRng::new(3);
        let tie_break = TieBreak::UniformBest;
        let mut seen = [0usize; 3];
        for _ in 0..300 {
            let i = tie_break.pick(&[0.5, 0.1, 0.5], &mut rng).unwrap();
            seen[i] += 1;
        }
        assert_eq!(seen[1], 0);
        assert!(seen[0] > 50);
        assert!(seen[2] > 50);
    }

    #[test]
    fn test_weighted_prefers_higher_scores() {
        let mut rng = GameRng::new(5);
        let tie_break = TieBreak::Weighted { temperature: 0.1 };
        let mut high = 0;
        for _ in 0..500 {
            if tie_break.pick(&[0.2, 0.8], &mut rng) == Some(1) {
                high += 1;
            }
        }
        assert!(high > 400, "expected strong preference, got {}", high);
    }

    #[test]
    fn test_weighted_zero_temperature_is_greedy() {
        let mut rng = GameRng::new(5);
        let tie_break = TieBreak::Weighted { temperature: 0.0 };
        for _ in 0..20 {
            assert_eq!(tie_break.pick(&[0.2, 0.8, 0.4], &mut rng), Some(1));
        }
    }

    #[test]
    fn test_non_finite_scores_are_skipped() {
        let mut rng = GameRng::new(9);
        assert_eq!(TieBreak::UniformBest.pick(&[f64::NAN, 0.3], &mut rng), Some(1));
        assert_eq!(TieBreak::UniformBest.pick(&[f64::NAN, f64::NAN], &mut rng), None);
        assert_eq!(TieBreak::UniformBest.pick(&[], &mut rng), None);
    }

    #[test]
    fn test_player_first_legal_is_deterministic() {
        let player = Player::new(Arc::new(FirstLegalStrategy::new()));
        let legal = opening_moves();
        let board = Board::initial();

        for seed in 0..10 {
            let mut rng = GameRng::new(seed);
            assert_eq!(
                player.choose_move(&board, &legal, &mut rng),
                Some(Move::new(2, 3, Side::Black))
            );
        }
    }

    #[test]
    fn test_player_uniform_returns_legal_move() {
        let player = Player::new(Arc::new(UniformStrategy::new()))
            .with_tie_break(TieBreak::Weighted { temperature: 1.0 });
        let legal = opening_moves();
        let board = Board::initial();
        let mut rng = GameRng::new(11);

        for _ in 0..50 {
            let mv = player.choose_move(&board, &legal, &mut rng).unwrap();
            assert!(legal.contains(&mv));
        }
        assert_eq!(player.name(), "uniform");
    }

    #[test]
    fn test_player_no_legal_moves() {
        let player = Player::new(Arc::new(UniformStrategy::new()));
        let mut rng = GameRng::new(0);
        assert_eq!(player.choose_move(&Board::initial(), &[], &mut rng), None);
    }

    #[test]
    fn test_tie_break_serialization() {
        let tie_break = TieBreak::Weighted { temperature: 0.25 };
        let json = serde_json::to_string(&tie_break).unwrap();
        let deserialized: TieBreak = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, tie_break);
    }
}
