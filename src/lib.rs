//! # othello-selfplay
//!
//! A concurrent self-play engine that turns Othello games into a labeled
//! training dataset.
//!
//! ## Design Principles
//!
//! 1. **Private Accumulators**: Each worker writes only to its own map while
//!    games are running. Maps meet only in the final merge.
//!
//! 2. **Commutative Merge**: Per-state `(sum, count)` pairs add key by key,
//!    so shard results can be folded in any order.
//!
//! 3. **Per-Game Outcomes**: A game's recorded states are labeled with that
//!    game's own result, never a batch's.
//!
//! 4. **Fail Fast**: A strategy that proposes an illegal move or no move
//!    when one exists fails its shard. Nothing is guessed.
//!
//! ## Architecture
//!
//! - **Bitboards**: A board is two `u64` masks. Boards are `Copy` values and
//!   applying a move returns a new one.
//!
//! - **Canonical Keys**: States deduplicate on a 16-byte, 2-bit-per-cell
//!   encoding that ignores move history, so transpositions share a row.
//!
//! - **Per-Game RNG Streams**: Game `g` always draws from the same stream,
//!   so the dataset does not depend on the worker count.
//!
//! ## Modules
//!
//! - `core`: Sides, cells, boards, moves, RNG
//! - `rules`: GameEngine trait and the Othello rules
//! - `codec`: Compressed state keys
//! - `strategy`: Move scoring and the strategy registry
//! - `player`: Move selection with tie-break policies
//! - `training`: Workers, accumulators, orchestration, dataset export
//! - `error`: Crate error type

pub mod codec;
pub mod core;
pub mod error;
pub mod player;
pub mod rules;
pub mod strategy;
pub mod training;

// Re-export commonly used types
pub use crate::core::{Board, Cell, GameRng, LabelVector, Move, Side, BOARD_SIZE, SQUARES};

pub use crate::codec::{decode, encode, CompressedStateKey};

pub use crate::error::{Error, Result};

pub use crate::rules::{GameEngine, GameResult, MoveList, OthelloEngine};

pub use crate::strategy::{
    FirstLegalStrategy, GreedyStrategy, MinimaxStrategy, Strategy, StrategyRegistry,
    UniformStrategy,
};

pub use crate::player::{MoveSelector, Player, TieBreak};

pub use crate::training::{
    merge, read_extended, CancelToken, DatasetBuilder, DatasetRow, FailurePolicy, GameRecord,
    Orchestrator, OutcomeAccumulator, OutcomeStats, RecordPlies, RunConfig, RunReport, RunStatus,
    SelfPlayConfig, SelfPlayRun, SelfPlayWorker, Shard,
};
