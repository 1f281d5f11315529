//! Board snapshots.
//!
//! A `Board` is an 8x8 grid stored as two bitboards, one per side.
//! Bit `row * 8 + col` is set when that side has a disc on the square.
//!
//! Boards are `Copy` values. Nothing in the crate mutates a board that has
//! already been handed out: the rules engine returns a fresh board for every
//! move, so recorded snapshots never change underneath their holders.

use serde::{Deserialize, Serialize};

use super::side::{Cell, Side};

/// Width and height of the board.
pub const BOARD_SIZE: usize = 8;

/// Number of squares.
pub const SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

/// Per-square label values (+1 Black, -1 White, 0 empty), row-major.
pub type LabelVector = [i8; SQUARES];

/// Immutable board snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    black: u64,
    white: u64,
}

impl Board {
    /// The standard opening position: White on d4 and e5, Black on e4 and d5.
    #[must_use]
    pub const fn initial() -> Self {
        let d4 = 1u64 << (3 * BOARD_SIZE + 3);
        let e4 = 1u64 << (3 * BOARD_SIZE + 4);
        let d5 = 1u64 << (4 * BOARD_SIZE + 3);
        let e5 = 1u64 << (4 * BOARD_SIZE + 4);
        Self {
            black: e4 | d5,
            white: d4 | e5,
        }
    }

    /// Build a board from raw bitboards.
    ///
    /// Only the rules engine and the state codec construct boards this way;
    /// overlapping masks are rejected.
    pub(crate) fn from_bitboards(black: u64, white: u64) -> Option<Self> {
        if black & white != 0 {
            return None;
        }
        Some(Self { black, white })
    }

    /// Bitboard of `side`'s discs.
    #[must_use]
    pub const fn discs(&self, side: Side) -> u64 {
        match side {
            Side::Black => self.black,
            Side::White => self.white,
        }
    }

    /// Bitboard of empty squares.
    #[must_use]
    pub const fn empty_squares(&self) -> u64 {
        !(self.black | self.white)
    }

    /// Number of discs `side` has on the board.
    #[must_use]
    pub const fn count(&self, side: Side) -> u32 {
        self.discs(side).count_ones()
    }

    /// Number of occupied squares.
    #[must_use]
    pub const fn occupied(&self) -> u32 {
        (self.black | self.white).count_ones()
    }

    /// Contents of a square (`0..64`, row-major).
    #[must_use]
    pub fn cell(&self, square: usize) -> Cell {
        debug_assert!(square < SQUARES);
        let bit = 1u64 << square;
        if self.black & bit != 0 {
            Cell::Disc(Side::Black)
        } else if self.white & bit != 0 {
            Cell::Disc(Side::White)
        } else {
            Cell::Empty
        }
    }

    /// Contents of (`row`, `col`).
    #[must_use]
    pub fn cell_at(&self, row: usize, col: usize) -> Cell {
        self.cell(row * BOARD_SIZE + col)
    }

    /// Iterate over all squares in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..SQUARES).map(move |sq| self.cell(sq))
    }

    /// The board as a label vector.
    #[must_use]
    pub fn labels(&self) -> LabelVector {
        let mut labels = [0i8; SQUARES];
        for (sq, label) in labels.iter_mut().enumerate() {
            *label = self.cell(sq).label();
        }
        labels
    }

    /// Rebuild a board from a label vector.
    ///
    /// Returns `None` if any entry is outside {-1, 0, 1}.
    #[must_use]
    pub fn from_labels(labels: &LabelVector) -> Option<Self> {
        let mut black = 0u64;
        let mut white = 0u64;
        for (sq, &label) in labels.iter().enumerate() {
            match Cell::from_label(label)? {
                Cell::Empty => {}
                Cell::Disc(Side::Black) => black |= 1u64 << sq,
                Cell::Disc(Side::White) => white |= 1u64 << sq,
            }
        }
        Self::from_bitboards(black, white)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  a b c d e f g h")?;
        for row in 0..BOARD_SIZE {
            write!(f, "{}", row + 1)?;
            for col in 0..BOARD_SIZE {
                let c = match self.cell_at(row, col) {
                    Cell::Empty => '.',
                    Cell::Disc(Side::Black) => 'X',
                    Cell::Disc(Side::White) => 'O',
                };
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
