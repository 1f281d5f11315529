//! Fixed-width 2-bit-per-cell board encoding.
//!
//! Cell codes: `00` empty, `01` Black, `10` White. `11` is never produced.
//! Cells are packed four per byte in row-major order, first cell in the two
//! most significant bits. The key carries no move history and no side to
//! move, so transpositions collapse onto one key.

use serde::{Deserialize, Serialize};

use crate::core::{Board, Cell, LabelVector, Side, SQUARES};

/// Size of a key in bytes.
pub const KEY_BYTES: usize = SQUARES / CELLS_PER_BYTE;

const CELLS_PER_BYTE: usize = 4;
const CODE_EMPTY: u8 = 0b00;
const CODE_BLACK: u8 = 0b01;
const CODE_WHITE: u8 = 0b10;
const CODE_MASK: u8 = 0b11;

/// Compact, history-free key for a board's cell contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompressedStateKey([u8; KEY_BYTES]);

impl CompressedStateKey {
    /// Raw packed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }

    /// Wrap raw bytes, rejecting any cell code of `11`.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Option<Self> {
        let valid = bytes.iter().all(|&byte| {
            (0..CELLS_PER_BYTE).all(|slot| (byte >> shift_for(slot)) & CODE_MASK != CODE_MASK)
        });
        valid.then_some(Self(bytes))
    }

    /// Cell at `square`.
    #[must_use]
    pub fn cell(&self, square: usize) -> Cell {
        let byte = self.0[square / CELLS_PER_BYTE];
        match (byte >> shift_for(square % CELLS_PER_BYTE)) & CODE_MASK {
            CODE_BLACK => Cell::Disc(Side::Black),
            CODE_WHITE => Cell::Disc(Side::White),
            _ => Cell::Empty,
        }
    }

    /// Rebuild the board this key was encoded from.
    #[must_use]
    pub fn to_board(&self) -> Board {
        let mut black = 0u64;
        let mut white = 0u64;
        for square in 0..SQUARES {
            match self.cell(square) {
                Cell::Disc(Side::Black) => black |= 1u64 << square,
                Cell::Disc(Side::White) => white |= 1u64 << square,
                Cell::Empty => {}
            }
        }
        // A square decodes to exactly one cell, so the masks are disjoint.
        Board::from_bitboards(black, white).unwrap_or_else(|| unreachable!())
    }
}

impl std::fmt::Display for CompressedStateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<&Board> for CompressedStateKey {
    fn from(board: &Board) -> Self {
        encode(board)
    }
}

#[inline]
const fn shift_for(slot: usize) -> usize {
    (CELLS_PER_BYTE - 1 - slot) * 2
}

/// Pack a board into its canonical key.
#[must_use]
pub fn encode(board: &Board) -> CompressedStateKey {
    let black = board.discs(Side::Black);
    let white = board.discs(Side::White);

    let mut bytes = [0u8; KEY_BYTES];
    for square in 0..SQUARES {
        let bit = 1u64 << square;
        let code = if black & bit != 0 {
            CODE_BLACK
        } else if white & bit != 0 {
            CODE_WHITE
        } else {
            CODE_EMPTY
        };
        bytes[square / CELLS_PER_BYTE] |= code << shift_for(square % CELLS_PER_BYTE);
    }
    CompressedStateKey(bytes)
}

/// Unpack a key into a label vector (+1 Black, -1 White, 0 empty).
#[must_use]
pub fn decode(key: &CompressedStateKey) -> LabelVector {
    let mut labels = [0i8; SQUARES];
    for (square, label) in labels.iter_mut().enumerate() {
        *label = key.cell(square).label();
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Move;
    use crate::rules::{GameEngine, OthelloEngine};

    #[test]
    fn test_key_is_sixteen_bytes() {
        assert_eq!(KEY_BYTES, 16);
        assert_eq!(std::mem::size_of::<CompressedStateKey>(), 16);
    }

    #[test]
    fn test_initial_board_layout() {
        let key = encode(&Board::initial());
        let bytes = key.as_bytes();

        // Row 4 (squares 24..32): d4 White, e4 Black -> bytes 6 and 7.
        assert_eq!(bytes[6], 0b00_00_00_10);
        assert_eq!(bytes[7], 0b01_00_00_00);
        // Row 5 (squares 32..40): d5 Black, e5 White -> bytes 8 and 9.
        assert_eq!(bytes[8], 0b00_00_00_01);
        assert_eq!(bytes[9], 0b10_00_00_00);

        let others: u32 = bytes
            .iter()
            .enumerate()
            .filter(|(i, _)| !(6..=9).contains(i))
            .map(|(_, &b)| b as u32)
            .sum();
        assert_eq!(others, 0);
    }

    #[test]
    fn test_decode_initial_board() {
        let labels = decode(&encode(&Board::initial()));
        assert_eq!(labels, Board::initial().labels());
        assert_eq!(labels[27], -1);
        assert_eq!(labels[28], 1);
        assert_eq!(labels[35], 1);
        assert_eq!(labels[36], -1);
    }

    #[test]
    fn test_to_board_roundtrip() {
        let engine = OthelloEngine::new();
        let board = engine
            .apply(&Board::initial(), Move::new(2, 3, Side::Black))
            .unwrap();
        assert_eq!(encode(&board).to_board(), board);
    }

    #[test]
    fn test_from_bytes_rejects_spare_code() {
        let mut bytes = [0u8; KEY_BYTES];
        assert!(CompressedStateKey::from_bytes(bytes).is_some());

        bytes[3] = 0b00_11_00_00;
        assert!(CompressedStateKey::from_bytes(bytes).is_none());
    }

    #[test]
    fn test_display_hex() {
        let key = encode(&Board::initial());
        assert_eq!(key.to_string(), "00000000000002400180000000000000");
    }

    #[test]
    fn test_transpositions_share_key() {
        let engine = OthelloEngine::new();
        let play = |squares: &[(u8, u8)]| {
            let mut board = Board::initial();
            let mut side = Side::Black;
            for &(row, col) in squares {
                board = engine.apply(&board, Move::new(row, col, side)).unwrap();
                side = side.opponent();
            }
            board
        };

        let a = play(&[(2, 3), (2, 2), (3, 2), (2, 4)]);
        let b = play(&[(3, 2), (2, 2), (2, 3), (2, 4)]);
        assert_eq!(encode(&a), encode(&b));
    }
}
