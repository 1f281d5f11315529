//! Canonical state keys.
//!
//! Boards are deduplicated by cell contents alone. Each board packs into a
//! 16-byte [`CompressedStateKey`]; keys are what the accumulators hash on,
//! and they decode back into the label vector written to the dataset.
//!
//! ```
//! use othello_selfplay::codec::{decode, encode};
//! use othello_selfplay::core::Board;
//!
//! let board = Board::initial();
//! let key = encode(&board);
//! assert_eq!(decode(&key), board.labels());
//! ```

pub mod key;

pub use key::{decode, encode, CompressedStateKey, KEY_BYTES};
