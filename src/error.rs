//! Crate-wide error type.

use thiserror::Error;

use crate::core::{Move, Side};

#[derive(Error, Debug)]
pub enum Error {
    /// A move selector proposed a move that is not legal in the position.
    #[error("{selector} proposed illegal move {mv} in game {game}")]
    IllegalMove {
        selector: String,
        mv: Move,
        game: u64,
    },

    /// A move selector returned no move although `side` had a legal one.
    #[error("{selector} returned no move for {side} in game {game} while legal moves exist")]
    MissingMove {
        selector: String,
        side: Side,
        game: u64,
    },

    #[error("Game {game} exceeded the ply limit of {limit}")]
    PlyLimitExceeded { game: u64, limit: usize },

    #[error("Position is not terminal")]
    NotTerminal,

    #[error("Shard {shard} failed: {source}")]
    ShardFailed {
        shard: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Worker for shard {shard} panicked: {message}")]
    WorkerPanicked { shard: usize, message: String },

    #[error("Worker pool failed: {0}")]
    WorkerPool(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed dataset row {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by a move selector misbehaving.
    pub fn is_strategy_defect(&self) -> bool {
        match self {
            Error::IllegalMove { .. } | Error::MissingMove { .. } => true,
            Error::ShardFailed { source, .. } => source.is_strategy_defect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
