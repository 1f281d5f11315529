//! Self-play data generation.
//!
//! This module turns games between two move selectors into a labeled
//! dataset of unique board states.
//!
//! ## Overview
//!
//! - **SelfPlayWorker**: Plays a shard of games into a private accumulator
//! - **OutcomeAccumulator**: Per-state outcome sum and visit count
//! - **Orchestrator**: Partitions a run, runs shards in parallel, merges
//! - **DatasetBuilder**: Exports the merged accumulator as CSV rows
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use othello_selfplay::player::{MoveSelector, Player};
//! use othello_selfplay::rules::OthelloEngine;
//! use othello_selfplay::strategy::UniformStrategy;
//! use othello_selfplay::training::{Orchestrator, RunConfig, SelfPlayConfig};
//!
//! let player: Arc<dyn MoveSelector> = Arc::new(Player::new(Arc::new(UniformStrategy::new())));
//! let config = RunConfig::default()
//!     .with_total_games(8)
//!     .with_workers(2)
//!     .with_self_play(SelfPlayConfig::default().with_seed(7));
//!
//! let run = Orchestrator::new(OthelloEngine::new(), player.clone(), player, config)
//!     .run()
//!     .unwrap();
//!
//! let mut csv = Vec::new();
//! let rows = run.dataset().write_mean(&mut csv).unwrap();
//! assert_eq!(rows as usize, run.report.unique_states);
//! ```

pub mod accumulator;
pub mod dataset;
pub mod orchestrator;
pub mod self_play;

// Re-export main types
pub use accumulator::{merge, merge_all, OutcomeAccumulator, OutcomeStats};
pub use dataset::{read_extended, DatasetBuilder, DatasetRow};
pub use orchestrator::{
    default_workers, partition, CancelToken, FailedShard, FailurePolicy, Orchestrator,
    RunConfig, RunReport, RunStatus, SelfPlayRun, WORKERS_ENV,
};
pub use self_play::{
    GameRecord, RecordPlies, SelfPlayConfig, SelfPlayWorker, Shard, ShardOutcome, ShardSummary,
};
