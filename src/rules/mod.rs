//! Rules engine trait and the Othello implementation.
//!
//! The simulator calls into `GameEngine` but never interprets the
//! flipping rule directly.

pub mod engine;
pub mod othello;

pub use engine::{GameEngine, GameResult, MoveList};
pub use othello::OthelloEngine;
