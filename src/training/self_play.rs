//! Self-play worker.
//!
//! A worker plays its shard of games from the initial position to the end,
//! encodes the boards it is configured to record, and folds each game's keys
//! into a private accumulator with that game's own outcome.

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::codec::{encode, CompressedStateKey};
use crate::core::{Board, GameRng, Move, Side};
use crate::error::{Error, Result};
use crate::player::MoveSelector;
use crate::rules::{GameEngine, GameResult};

use super::accumulator::OutcomeAccumulator;
use super::orchestrator::CancelToken;

/// Side that makes the first move of every game.
const FIRST_TO_MOVE: Side = Side::Black;

/// Which plies contribute a recorded board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPlies {
    /// The board after every ply.
    #[default]
    All,
    /// Only boards produced by this side's plies.
    Side(Side),
}

impl RecordPlies {
    /// Whether a ply by `side` is recorded.
    #[must_use]
    pub fn includes(&self, side: Side) -> bool {
        match self {
            RecordPlies::All => true,
            RecordPlies::Side(s) => *s == side,
        }
    }
}

/// Configuration for self-play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Plies whose resulting board is recorded.
    pub record: RecordPlies,

    /// Side the outcome is scored for: 1.0 win, 0.5 draw, 0.0 loss.
    pub perspective: Side,

    /// Run seed. Combined with each game's global index.
    pub seed: u64,

    /// Maximum plies per game before the game is treated as a failure.
    pub max_plies: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            record: RecordPlies::All,
            perspective: Side::Black,
            seed: 0,
            max_plies: 128,
        }
    }
}

impl SelfPlayConfig {
    /// Create a new self-play config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which plies are recorded.
    pub fn with_record(mut self, record: RecordPlies) -> Self {
        self.record = record;
        self
    }

    /// Set the outcome perspective.
    pub fn with_perspective(mut self, side: Side) -> Self {
        self.perspective = side;
        self
    }

    /// Set the run seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the ply limit.
    pub fn with_max_plies(mut self, max: usize) -> Self {
        self.max_plies = max;
        self
    }
}

/// A contiguous slice of the run's games assigned to one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Position of the shard in the partition.
    pub index: usize,
    /// Global index of the shard's first game.
    pub first_game: u64,
    /// Number of games to play.
    pub games: u64,
}

impl Shard {
    pub fn new(index: usize, first_game: u64, games: u64) -> Self {
        Self {
            index,
            first_game,
            games,
        }
    }

    /// Global indices of the games in this shard.
    pub fn game_indices(&self) -> Range<u64> {
        self.first_game..self.first_game + self.games
    }
}

/// Everything observed while playing a single game.
#[derive(Clone, Debug)]
pub struct GameRecord {
    /// Global game index.
    pub game: u64,
    /// Keys of the recorded boards, in ply order.
    pub keys: Vec<CompressedStateKey>,
    /// Every move played, both sides, in order.
    pub moves: Vec<Move>,
    /// Terminal result.
    pub result: GameResult,
    /// Terminal board.
    pub final_board: Board,
    /// Outcome from the configured perspective.
    pub outcome: f64,
}

impl GameRecord {
    /// Number of plies played.
    pub fn plies(&self) -> usize {
        self.moves.len()
    }
}

/// Per-shard statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardSummary {
    pub index: usize,
    pub games_requested: u64,
    pub games_completed: u64,
    /// Recorded boards, counting repeats.
    pub recorded_plies: u64,
    /// Wins indexed by [`Side::index`].
    pub wins: [u64; 2],
    pub draws: u64,
    pub unique_states: usize,
    pub elapsed: Duration,
}

impl ShardSummary {
    pub fn new(shard: &Shard) -> Self {
        Self {
            index: shard.index,
            games_requested: shard.games,
            ..Self::default()
        }
    }

    fn record(&mut self, record: &GameRecord) {
        self.games_completed += 1;
        self.recorded_plies += record.keys.len() as u64;
        match record.result {
            GameResult::Winner(side) => self.wins[side.index()] += 1,
            GameResult::Draw => self.draws += 1,
        }
    }

    /// Whether the shard stopped before playing all its games.
    pub fn is_partial(&self) -> bool {
        self.games_completed < self.games_requested
    }
}

/// A finished shard: its private accumulator and statistics.
#[derive(Clone, Debug)]
pub struct ShardOutcome {
    pub summary: ShardSummary,
    pub accumulator: OutcomeAccumulator,
}

/// Worker for running self-play games.
///
/// The engine and both selectors are shared read-only. Everything a game
/// mutates (board, RNG, recorded keys) lives on the worker's stack.
pub struct SelfPlayWorker<E: GameEngine> {
    engine: E,
    black: Arc<dyn MoveSelector>,
    white: Arc<dyn MoveSelector>,
    config: SelfPlayConfig,
}

impl<E: GameEngine> SelfPlayWorker<E> {
    /// Create a new self-play worker.
    pub fn new(
        engine: E,
        black: Arc<dyn MoveSelector>,
        white: Arc<dyn MoveSelector>,
        config: SelfPlayConfig,
    ) -> Self {
        Self {
            engine,
            black,
            white,
            config,
        }
    }

    /// Get the config.
    pub fn config(&self) -> &SelfPlayConfig {
        &self.config
    }

    fn selector(&self, side: Side) -> &dyn MoveSelector {
        match side {
            Side::Black => self.black.as_ref(),
            Side::White => self.white.as_ref(),
        }
    }

    /// Play game number `game` to completion.
    ///
    /// A selector that returns no move while one exists, or a move that is
    /// not in the legal list, fails the game. Nothing is substituted.
    pub fn play_game(&self, game: u64) -> Result<GameRecord> {
        let mut rng = GameRng::for_game(self.config.seed, game);
        let mut board = self.engine.initial_board();
        let mut side = FIRST_TO_MOVE;
        let mut keys = Vec::new();
        let mut moves = Vec::new();

        loop {
            let legal = self.engine.legal_moves(&board, side);
            if legal.is_empty() {
                if !self.engine.has_any_legal_move(&board, side.opponent()) {
                    break;
                }
                // Pass.
                side = side.opponent();
                continue;
            }

            if moves.len() >= self.config.max_plies {
                return Err(Error::PlyLimitExceeded {
                    game,
                    limit: self.config.max_plies,
                });
            }

            let selector = self.selector(side);
            let mv = selector
                .choose_move(&board, &legal, &mut rng)
                .ok_or_else(|| Error::MissingMove {
                    selector: selector.name().to_string(),
                    side,
                    game,
                })?;

            let illegal = || Error::IllegalMove {
                selector: selector.name().to_string(),
                mv,
                game,
            };
            if mv.side != side || !legal.contains(&mv) {
                return Err(illegal());
            }
            board = self.engine.apply(&board, mv).ok_or_else(illegal)?;

            moves.push(mv);
            if self.config.record.includes(side) {
                keys.push(encode(&board));
            }
            side = side.opponent();
        }

        let result = self.engine.terminal_score(&board)?;
        Ok(GameRecord {
            game,
            keys,
            moves,
            result,
            final_board: board,
            outcome: result.outcome_for(self.config.perspective),
        })
    }

    /// Play every game of `shard` into a fresh accumulator.
    ///
    /// `cancel` is checked before each game, never during one. A cancelled
    /// shard returns the games it finished. The first failed game fails the
    /// shard and its accumulator is dropped.
    pub fn run(&self, shard: &Shard, cancel: &CancelToken) -> Result<ShardOutcome> {
        let start = Instant::now();
        let mut accumulator = OutcomeAccumulator::new();
        let mut summary = ShardSummary::new(shard);

        debug!(
            "Shard {} starting games {:?} ({} vs {})",
            shard.index,
            shard.game_indices(),
            self.black.name(),
            self.white.name()
        );

        for game in shard.game_indices() {
            if cancel.is_cancelled() {
                warn!(
                    "Shard {} cancelled after {} of {} games",
                    shard.index, summary.games_completed, shard.games
                );
                break;
            }

            let record = self.play_game(game)?;
            accumulator.record_game(&record.keys, record.outcome);
            summary.record(&record);
        }

        summary.unique_states = accumulator.len();
        summary.elapsed = start.elapsed();

        info!(
            "Shard {} finished {} games, {} plies, {} unique states in {:?}",
            shard.index,
            summary.games_completed,
            summary.recorded_plies,
            summary.unique_states,
            summary.elapsed
        );

        Ok(ShardOutcome {
            summary,
            accumulator,
        })
    }
}
