//! Fixed-depth minimax strategy.
//!
//! Negamax with alpha-beta pruning over the disc differential. The score of
//! a move is the searched differential after playing it, mapped from
//! `[-64, 64]` onto `[0, 1]`.

use crate::core::{Board, Move, Side, SQUARES};
use crate::rules::{GameEngine, OthelloEngine};

use super::traits::Strategy;

/// One more than the largest possible differential.
const BOUND: i32 = SQUARES as i32 + 1;

/// Depth-limited negamax search.
#[derive(Clone, Debug)]
pub struct MinimaxStrategy {
    engine: OthelloEngine,
    depth: u32,
    name: String,
}

impl MinimaxStrategy {
    /// Search `depth` plies including the move being scored.
    pub fn new(depth: u32) -> Self {
        let depth = depth.max(1);
        Self {
            engine: OthelloEngine::new(),
            depth,
            name: format!("minimax-{}", depth),
        }
    }

    /// Configured search depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn differential(board: &Board, side: Side) -> i32 {
        board.count(side) as i32 - board.count(side.opponent()) as i32
    }

    fn negamax(&self, board: &Board, side: Side, depth: u32, mut alpha: i32, beta: i32) -> i32 {
        if depth == 0 {
            return Self::differential(board, side);
        }

        let moves = self.engine.legal_moves(board, side);
        if moves.is_empty() {
            if !self.engine.has_any_legal_move(board, side.opponent()) {
                return Self::differential(board, side);
            }
            // Pass: the opponent moves on the same board.
            return -self.negamax(board, side.opponent(), depth, -beta, -alpha);
        }

        let mut best = -BOUND;
        for mv in moves {
            let Some(next) = self.engine.apply(board, mv) else {
                continue;
            };
            let score = -self.negamax(&next, side.opponent(), depth - 1, -beta, -alpha);
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

impl Default for MinimaxStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Strategy for MinimaxStrategy {
    fn evaluate(&self, mv: Move, board: &Board) -> f64 {
        let Some(next) = self.engine.apply(board, mv) else {
            return 0.0;
        };
        let score = -self.negamax(&next, mv.side.opponent(), self.depth - 1, -BOUND, BOUND);
        let span = 2.0 * SQUARES as f64;
        ((score as f64 + SQUARES as f64) / span).clamp(0.0, 1.0)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
