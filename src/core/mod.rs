//! Core game types: sides, boards, moves, RNG.
//!
//! These are plain values with no knowledge of the rules. The rules engine
//! in [`crate::rules`] decides which moves are legal and how they apply.

pub mod action;
pub mod board;
pub mod rng;
pub mod side;

pub use action::Move;
pub use board::{Board, LabelVector, BOARD_SIZE, SQUARES};
pub use rng::GameRng;
pub use side::{Cell, Side};
