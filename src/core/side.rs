//! Sides and cell contents.
//!
//! ## Side
//!
//! Othello has two sides. `Black` is side A and always moves first;
//! `White` is side B.
//!
//! ## Cell
//!
//! A square is either empty or holds one side's disc.

use serde::{Deserialize, Serialize};

/// One of the two sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Side A, moves first.
    Black,
    /// Side B.
    White,
}

impl Side {
    /// Both sides in turn order.
    pub const ALL: [Side; 2] = [Side::Black, Side::White];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// 0 for Black, 1 for White.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Black => 0,
            Side::White => 1,
        }
    }

    /// Label value of this side's discs: +1 for Black, -1 for White.
    #[must_use]
    pub const fn label(self) -> i8 {
        match self {
            Side::Black => 1,
            Side::White => -1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Black => write!(f, "Black"),
            Side::White => write!(f, "White"),
        }
    }
}

/// Contents of a single square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Disc(Side),
}

impl Cell {
    /// Label value: +1 Black, -1 White, 0 empty.
    #[must_use]
    pub const fn label(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::Disc(side) => side.label(),
        }
    }

    /// Inverse of [`Cell::label`]. Returns `None` for anything but -1, 0, 1.
    #[must_use]
    pub const fn from_label(label: i8) -> Option<Self> {
        match label {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Disc(Side::Black)),
            -1 => Some(Cell::Disc(Side::White)),
            _ => None,
        }
    }
}
