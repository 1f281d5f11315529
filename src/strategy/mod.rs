//! Move-evaluation strategies.
//!
//! A [`Strategy`] scores a candidate move on a board with a value in
//! `[0, 1]`. Strategies are shared read-only by every worker thread, so
//! implementations must be `Send + Sync` and must not rely on interior
//! mutability for their scores.
//!
//! ## Overview
//!
//! - **Traits**: `Strategy`
//! - **Baselines**: `UniformStrategy`, `FirstLegalStrategy`, `GreedyStrategy`
//! - **Search**: `MinimaxStrategy`
//! - **Registry**: `StrategyRegistry` maps names to factories
//!
//! Turning scores into a chosen move is the job of [`crate::player`].

pub mod minimax;
pub mod registry;
pub mod traits;

pub use minimax::MinimaxStrategy;
pub use registry::StrategyRegistry;
pub use traits::{FirstLegalStrategy, GreedyStrategy, Strategy, UniformStrategy};
