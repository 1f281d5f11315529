//! Rules engine trait.
//!
//! The self-play worker depends only on this contract:
//! - What moves are legal for a side
//! - How a move produces the next board
//! - When the game is over and who won

use smallvec::SmallVec;

use crate::core::{Board, Move, Side};
use crate::error::{Error, Result};

/// Legal move list. Othello positions rarely exceed 16 legal moves.
pub type MoveList = SmallVec<[Move; 16]>;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameResult {
    Winner(Side),
    Draw,
}

impl GameResult {
    /// Check if a side won.
    #[must_use]
    pub fn is_winner(&self, side: Side) -> bool {
        matches!(self, GameResult::Winner(s) if *s == side)
    }

    /// Scalar outcome from `perspective`: 1.0 win, 0.5 draw, 0.0 loss.
    #[must_use]
    pub fn outcome_for(&self, perspective: Side) -> f64 {
        match self {
            GameResult::Winner(side) if *side == perspective => 1.0,
            GameResult::Winner(_) => 0.0,
            GameResult::Draw => 0.5,
        }
    }
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `legal_moves`: deterministic, side-effect free; empty if `side` must pass
/// - `apply`: pure; returns `None` for an illegal move, never an illegal board
/// - `terminal_score`: only defined when neither side can move
///
/// Engines are shared by every worker, hence `Send + Sync`.
pub trait GameEngine: Send + Sync {
    /// The position every game starts from.
    fn initial_board(&self) -> Board;

    /// All legal moves for `side`, in ascending square order.
    fn legal_moves(&self, board: &Board, side: Side) -> MoveList;

    /// Apply `mv` and return the resulting board.
    fn apply(&self, board: &Board, mv: Move) -> Option<Board>;

    // === Convenience Methods ===

    /// Whether `side` has at least one legal move.
    fn has_any_legal_move(&self, board: &Board, side: Side) -> bool {
        !self.legal_moves(board, side).is_empty()
    }

    /// Whether `mv` is legal on `board`.
    fn is_legal(&self, board: &Board, mv: Move) -> bool {
        self.legal_moves(board, mv.side).contains(&mv)
    }

    /// A position is terminal when neither side has a legal move.
    fn is_terminal(&self, board: &Board) -> bool {
        Side::ALL
            .iter()
            .all(|&side| !self.has_any_legal_move(board, side))
    }

    /// Score a terminal position by disc count.
    fn terminal_score(&self, board: &Board) -> Result<GameResult> {
        if !self.is_terminal(board) {
            return Err(Error::NotTerminal);
        }

        let black = board.count(Side::Black);
        let white = board.count(Side::White);

        Ok(match black.cmp(&white) {
            std::cmp::Ordering::Greater => GameResult::Winner(Side::Black),
            std::cmp::Ordering::Less => GameResult::Winner(Side::White),
            std::cmp::Ordering::Equal => GameResult::Draw,
        })
    }
}
