//! Othello rules on bitboards.
//!
//! A move is legal when it lands on an empty square and brackets at least
//! one contiguous line of opponent discs against one of the mover's own
//! discs, in any of the eight directions. Every bracketed disc flips.

use crate::core::{Board, Move, Side};

use super::engine::{GameEngine, MoveList};

/// Everything except column `a`.
const NOT_COL_A: u64 = 0xFEFE_FEFE_FEFE_FEFE;
/// Everything except column `h`.
const NOT_COL_H: u64 = 0x7F7F_7F7F_7F7F_7F7F;

/// The eight compass directions as bit shifts on a row-major bitboard.
#[derive(Clone, Copy, Debug)]
enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Move every set bit one step in this direction, dropping bits that
    /// would wrap around a board edge.
    #[inline]
    fn shift(self, bits: u64) -> u64 {
        match self {
            Direction::North => bits >> 8,
            Direction::South => bits << 8,
            Direction::East => (bits << 1) & NOT_COL_A,
            Direction::West => (bits >> 1) & NOT_COL_H,
            Direction::NorthEast => (bits >> 7) & NOT_COL_A,
            Direction::NorthWest => (bits >> 9) & NOT_COL_H,
            Direction::SouthEast => (bits << 9) & NOT_COL_A,
            Direction::SouthWest => (bits << 7) & NOT_COL_H,
        }
    }
}

/// Standard 8x8 Othello.
#[derive(Clone, Copy, Debug, Default)]
pub struct OthelloEngine;

impl OthelloEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Bitboard of squares where `side` may legally place a disc.
    #[must_use]
    pub fn legal_mask(&self, board: &Board, side: Side) -> u64 {
        let own = board.discs(side);
        let opp = board.discs(side.opponent());
        let empty = board.empty_squares();

        let mut moves = 0u64;
        for dir in Direction::ALL {
            // A run of opponent discs is at most six long on an 8x8 board.
            let mut run = dir.shift(own) & opp;
            for _ in 0..5 {
                run |= dir.shift(run) & opp;
            }
            moves |= dir.shift(run) & empty;
        }
        moves
    }

    /// Discs that flip if `mv` is played. Zero means the move is illegal.
    #[must_use]
    pub fn flips(&self, board: &Board, mv: Move) -> u64 {
        if !mv.is_on_board() {
            return 0;
        }
        let placed = mv.bit();
        if board.empty_squares() & placed == 0 {
            return 0;
        }

        let own = board.discs(mv.side);
        let opp = board.discs(mv.side.opponent());

        let mut flipped = 0u64;
        for dir in Direction::ALL {
            let mut line = 0u64;
            let mut cursor = dir.shift(placed);
            while cursor & opp != 0 {
                line |= cursor;
                cursor = dir.shift(cursor);
            }
            if cursor & own != 0 {
                flipped |= line;
            }
        }
        flipped
    }
}

impl GameEngine for OthelloEngine {
    fn initial_board(&self) -> Board {
        Board::initial()
    }

    fn legal_moves(&self, board: &Board, side: Side) -> MoveList {
        let mut mask = self.legal_mask(board, side);
        let mut moves = MoveList::new();
        while mask != 0 {
            let square = mask.trailing_zeros() as usize;
            moves.push(Move::from_square(square, side));
            mask &= mask - 1;
        }
        moves
    }

    fn apply(&self, board: &Board, mv: Move) -> Option<Board> {
        let flipped = self.flips(board, mv);
        if flipped == 0 {
            return None;
        }

        let own = board.discs(mv.side) | flipped | mv.bit();
        let opp = board.discs(mv.side.opponent()) & !flipped;

        match mv.side {
            Side::Black => Board::from_bitboards(own, opp),
            Side::White => Board::from_bitboards(opp, own),
        }
    }

    fn has_any_legal_move(&self, board: &Board, side: Side) -> bool {
        self.legal_mask(board, side) != 0
    }

    fn is_legal(&self, board: &Board, mv: Move) -> bool {
        self.flips(board, mv) != 0
    }
}
