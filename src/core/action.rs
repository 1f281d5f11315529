//! Move representation: a square plus the side placing the disc.
//!
//! Squares are numbered row-major from the top-left corner: square
//! `row * 8 + col`. Moves order by square index, then by side, so "lowest
//! indexed move" means the first legal square in that numbering.

use serde::{Deserialize, Serialize};

use super::board::BOARD_SIZE;
use super::side::Side;

/// A disc placement by `side` at (`row`, `col`).
///
/// A move is only meaningful relative to a specific board; legality is
/// decided by the rules engine.
///
/// ## Example
///
/// ```
/// use othello_selfplay::core::{Move, Side};
///
/// let mv = Move::new(2, 3, Side::Black);
/// assert_eq!(mv.square(), 19);
/// assert_eq!(mv.to_string(), "d3 (Black)");
/// assert_eq!(Move::from_square(19, Side::Black), mv);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub row: u8,
    pub col: u8,
    pub side: Side,
}

impl Move {
    #[must_use]
    pub const fn new(row: u8, col: u8, side: Side) -> Self {
        Self { row, col, side }
    }

    /// Build a move from a square index in `0..64`.
    #[must_use]
    pub const fn from_square(square: usize, side: Side) -> Self {
        Self {
            row: (square / BOARD_SIZE) as u8,
            col: (square % BOARD_SIZE) as u8,
            side,
        }
    }

    /// Row-major square index.
    #[must_use]
    pub const fn square(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// Single-bit mask of the target square.
    #[must_use]
    pub const fn bit(self) -> u64 {
        1u64 << self.square()
    }

    /// True if the coordinates lie on the board.
    #[must_use]
    pub const fn is_on_board(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }
}

impl Ord for Move {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Row and column break ties between off-board moves sharing an index.
        (self.square(), self.row, self.col, self.side).cmp(&(
            other.square(),
            other.row,
            other.col,
            other.side,
        ))
    }
}

impl PartialOrd for Move {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_on_board() {
            let file = (b'a' + self.col) as char;
            write!(f, "{}{} ({})", file, self.row + 1, self.side)
        } else {
            write!(f, "({}, {}) ({})", self.row, self.col, self.side)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_roundtrip() {
        for square in 0..64 {
            let mv = Move::from_square(square, Side::White);
            assert_eq!(mv.square(), square);
            assert!(mv.is_on_board());
        }
    }

    #[test]
    fn test_bit() {
        assert_eq!(Move::new(0, 0, Side::Black).bit(), 1);
        assert_eq!(Move::new(7, 7, Side::Black).bit(), 1u64 << 63);
        assert_eq!(Move::new(1, 0, Side::Black).bit(), 1u64 << 8);
    }

    #[test]
    fn test_display() {
        assert_eq!(Move::new(0, 0, Side::White).to_string(), "a1 (White)");
        assert_eq!(Move::new(7, 7, Side::Black).to_string(), "h8 (Black)");
        assert_eq!(Move::new(9, 1, Side::Black).to_string(), "(9, 1) (Black)");
    }

    #[test]
    fn test_ordering_follows_square() {
        let a = Move::new(0, 7, Side::Black);
        let b = Move::new(1, 0, Side::Black);
        assert!(a < b);
    }

    #[test]
    fn test_ordering_by_square_then_side() {
        let mut moves = vec![
            Move::new(2, 3, Side::White),
            Move::new(0, 5, Side::White),
            Move::new(2, 3, Side::Black),
            Move::new(0, 1, Side::Black),
        ];
        moves.sort();
        let squares: Vec<_> = moves.iter().map(|mv| (mv.square(), mv.side)).collect();
        assert_eq!(
            squares,
            vec![
                (1, Side::Black),
                (5, Side::White),
                (19, Side::Black),
                (19, Side::White),
            ]
        );
        assert!(Side::Black < Side::White);
    }

    #[test]
    fn test_ordering_consistent_with_eq_off_board() {
        // (0, 9) and (1, 1) share index 9 but are different moves.
        let a = Move::new(0, 9, Side::Black);
        let b = Move::new(1, 1, Side::Black);
        assert_eq!(a.square(), b.square());
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), std::cmp::Ordering::Equal);
    }
}
