//! Strategy trait and baseline strategies.

use crate::core::{Board, Move, SQUARES};
use crate::rules::OthelloEngine;

/// Scores moves for a player.
///
/// `evaluate` returns a preference in `[0, 1]` for playing `mv` on `board`;
/// higher is better for `mv.side`. It is called concurrently from many
/// worker threads.
pub trait Strategy: Send + Sync {
    /// Score a candidate move.
    fn evaluate(&self, mv: Move, board: &Board) -> f64;

    /// Human-readable name, used in logs and error messages.
    fn name(&self) -> &str;
}

/// Scores every move equally (baseline for testing).
///
/// Combined with a uniform tie-break this plays uniformly at random.
#[derive(Clone, Debug, Default)]
pub struct UniformStrategy;

impl UniformStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for UniformStrategy {
    fn evaluate(&self, _mv: Move, _board: &Board) -> f64 {
        0.5
    }

    fn name(&self) -> &str {
        "uniform"
    }
}

/// Prefers the lowest square index.
///
/// Every legal move gets a distinct score, so play is fully deterministic
/// regardless of the tie-break.
#[derive(Clone, Debug, Default)]
pub struct FirstLegalStrategy;

impl FirstLegalStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for FirstLegalStrategy {
    fn evaluate(&self, mv: Move, _board: &Board) -> f64 {
        1.0 - mv.square() as f64 / SQUARES as f64
    }

    fn name(&self) -> &str {
        "first-legal"
    }
}

/// Prefers moves that flip the most discs.
#[derive(Clone, Debug, Default)]
pub struct GreedyStrategy {
    engine: OthelloEngine,
}

impl GreedyStrategy {
    /// No single move can flip more than 18 discs on an 8x8 board.
    const MAX_FLIPS: f64 = 18.0;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for GreedyStrategy {
    fn evaluate(&self, mv: Move, board: &Board) -> f64 {
        let flipped = self.engine.flips(board, mv).count_ones() as f64;
        (flipped / Self::MAX_FLIPS).clamp(0.0, 1.0)
    }

    fn name(&self) -> &str {
        "greedy"
    }
}
