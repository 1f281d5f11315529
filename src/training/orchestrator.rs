//! Run orchestration: partition, dispatch, barrier, merge.
//!
//! The orchestrator splits the requested game count into one shard per
//! worker, runs every shard on its own scoped thread, waits for all of them,
//! and only then folds the shard accumulators into the global one on the
//! calling thread.
//!
//! ## Usage
//!
//! ```
//! use othello_selfplay::rules::OthelloEngine;
//! use othello_selfplay::player::TieBreak;
//! use othello_selfplay::strategy::StrategyRegistry;
//! use othello_selfplay::training::{Orchestrator, RunConfig};
//!
//! let registry = StrategyRegistry::with_builtins();
//! let config = RunConfig::default().with_total_games(4).with_workers(2);
//! let orchestrator = Orchestrator::from_registry(
//!     OthelloEngine::new(),
//!     &registry,
//!     "first-legal",
//!     "greedy",
//!     TieBreak::UniformBest,
//!     config,
//! )
//! .unwrap();
//!
//! let run = orchestrator.run().unwrap();
//! assert!(run.report.is_complete());
//! assert_eq!(run.report.completed, 4);
//! ```

use std::any::Any;
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::Side;
use crate::error::{Error, Result};
use crate::player::{MoveSelector, Player, TieBreak};
use crate::rules::GameEngine;
use crate::strategy::StrategyRegistry;

use super::accumulator::{merge, OutcomeAccumulator};
use super::dataset::DatasetBuilder;
use super::self_play::{SelfPlayConfig, SelfPlayWorker, Shard, ShardOutcome, ShardSummary};

/// Environment variable overriding the worker count.
pub const WORKERS_ENV: &str = "SELFPLAY_WORKERS";

// =============================================================================
// Configuration
// =============================================================================

/// What to do when a shard fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Fail the whole run with the shard's error.
    #[default]
    Abort,
    /// Drop the shard, warn, and list it in the report.
    Exclude,
}

/// Configuration for a self-play run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Games to play across all workers.
    pub total_games: u64,

    /// Number of shards, one thread each.
    pub workers: usize,

    pub failure_policy: FailurePolicy,

    /// Wall-clock budget. Workers stop at the next game boundary once it
    /// has elapsed.
    pub max_duration: Option<Duration>,

    pub self_play: SelfPlayConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_games: 1000,
            workers: default_workers(),
            failure_policy: FailurePolicy::Abort,
            max_duration: None,
            self_play: SelfPlayConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create a new run config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set total games.
    pub fn with_total_games(mut self, games: u64) -> Self {
        self.total_games = games;
        self
    }

    /// Set worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the wall-clock budget.
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Set the per-game config.
    pub fn with_self_play(mut self, self_play: SelfPlayConfig) -> Self {
        self.self_play = self_play;
        self
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SELFPLAY_WORKERS` if it is set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(workers) = get_env_usize(WORKERS_ENV)? {
            self.workers = workers;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject configs that cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".into()));
        }
        if self.self_play.max_plies == 0 {
            return Err(Error::InvalidConfig("max_plies must be at least 1".into()));
        }
        Ok(())
    }
}

/// Hardware parallelism, or 1 if it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn get_env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{} must be a valid number", key))),
        Err(_) => Ok(None),
    }
}

/// Split `total` games into `workers` contiguous shards. Every shard gets
/// `total / workers` games and the last one also takes the remainder.
pub fn partition(total: u64, workers: usize) -> Vec<Shard> {
    let workers = workers.max(1);
    let base = total / workers as u64;
    let remainder = total % workers as u64;

    (0..workers)
        .map(|index| {
            let games = if index == workers - 1 {
                base + remainder
            } else {
                base
            };
            Shard::new(index, base * index as u64, games)
        })
        .collect()
}

// =============================================================================
// Cancellation
// =============================================================================

/// Shared stop signal, checked by workers between games.
///
/// Clones share the same flag. A [`child`](CancelToken::child) has its own
/// flag and also observes its parent's.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled by this one, but whose own `cancel` leaves this one
    /// untouched. The deadline is not inherited.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::clone(&self.flag)),
            deadline: None,
        }
    }

    /// Also count as cancelled once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self
                .parent
                .as_ref()
                .map_or(false, |parent| parent.load(Ordering::Relaxed))
            || self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }
}

// =============================================================================
// Report
// =============================================================================

/// Requested-versus-completed status of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Complete,
    /// Fewer games finished than requested, through cancellation, timeout,
    /// or excluded shards.
    Partial { completed: u64, requested: u64 },
}

/// A shard dropped under [`FailurePolicy::Exclude`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedShard {
    pub index: usize,
    pub games: u64,
    pub error: String,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub requested: u64,
    pub completed: u64,
    pub shards: Vec<ShardSummary>,
    pub failed: Vec<FailedShard>,
    /// Wins indexed by [`Side::index`].
    pub wins: [u64; 2],
    pub draws: u64,
    pub recorded_plies: u64,
    pub unique_states: usize,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl RunReport {
    fn new(requested: u64) -> Self {
        Self {
            requested,
            completed: 0,
            shards: Vec::new(),
            failed: Vec::new(),
            wins: [0; 2],
            draws: 0,
            recorded_plies: 0,
            unique_states: 0,
            elapsed: Duration::ZERO,
            status: RunStatus::Complete,
        }
    }

    fn add_shard(&mut self, summary: ShardSummary) {
        self.completed += summary.games_completed;
        self.recorded_plies += summary.recorded_plies;
        self.draws += summary.draws;
        for side in Side::ALL {
            self.wins[side.index()] += summary.wins[side.index()];
        }
        self.shards.push(summary);
    }

    /// Wins for `side`.
    pub fn wins_for(&self, side: Side) -> u64 {
        self.wins[side.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }
}

/// Global accumulator and report of a finished run.
#[derive(Clone, Debug)]
pub struct SelfPlayRun {
    pub accumulator: OutcomeAccumulator,
    pub report: RunReport,
}

impl SelfPlayRun {
    /// Dataset view over the global accumulator.
    pub fn dataset(&self) -> DatasetBuilder<'_> {
        DatasetBuilder::new(&self.accumulator)
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs a self-play batch across a pool of worker threads.
pub struct Orchestrator<E: GameEngine> {
    worker: SelfPlayWorker<E>,
    config: RunConfig,
    cancel: CancelToken,
}

impl<E: GameEngine> Orchestrator<E> {
    /// Create an orchestrator with explicit selectors for each side.
    pub fn new(
        engine: E,
        black: Arc<dyn MoveSelector>,
        white: Arc<dyn MoveSelector>,
        config: RunConfig,
    ) -> Self {
        let worker = SelfPlayWorker::new(engine, black, white, config.self_play.clone());
        Self {
            worker,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Build both players from registry names.
    pub fn from_registry(
        engine: E,
        registry: &StrategyRegistry,
        black: &str,
        white: &str,
        tie_break: TieBreak,
        config: RunConfig,
    ) -> Result<Self> {
        let black = Player::new(registry.build(black)?).with_tie_break(tie_break);
        let white = Player::new(registry.build(white)?).with_tie_break(tie_break);
        Ok(Self::new(engine, Arc::new(black), Arc::new(white), config))
    }

    /// Get the config.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Token that stops this orchestrator's runs at the next game boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Play every shard, wait for all of them, then merge.
    pub fn run(&self) -> Result<SelfPlayRun> {
        self.config.validate()?;

        let start = Instant::now();
        // Run-scoped, so an abort does not cancel later runs.
        let mut cancel = self.cancel.child();
        if let Some(budget) = self.config.max_duration {
            match start.checked_add(budget) {
                Some(deadline) => cancel = cancel.with_deadline(deadline),
                None => warn!("max_duration {:?} is beyond any deadline; ignoring", budget),
            }
        }
        let shards = partition(self.config.total_games, self.config.workers);

        info!(
            "Starting self-play: {} games on {} workers",
            self.config.total_games,
            shards.len()
        );

        let results = self.run_shards(&shards, &cancel)?;

        let mut accumulator = OutcomeAccumulator::new();
        let mut report = RunReport::new(self.config.total_games);

        for (shard, result) in shards.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    debug!(
                        "Merging shard {} ({} states)",
                        shard.index,
                        outcome.accumulator.len()
                    );
                    report.add_shard(outcome.summary);
                    accumulator = merge(accumulator, outcome.accumulator);
                }
                Err(err) => {
                    error!("{}", err);
                    match self.config.failure_policy {
                        FailurePolicy::Abort => return Err(err),
                        FailurePolicy::Exclude => {
                            warn!(
                                "Excluding shard {} ({} games) from the dataset",
                                shard.index, shard.games
                            );
                            report.failed.push(FailedShard {
                                index: shard.index,
                                games: shard.games,
                                error: err.to_string(),
                            });
                        }
                    }
                }
            }
        }

        report.unique_states = accumulator.len();
        report.elapsed = start.elapsed();
        if report.completed < report.requested {
            report.status = RunStatus::Partial {
                completed: report.completed,
                requested: report.requested,
            };
        }

        info!(
            "Self-play finished: {}/{} games, {} plies, {} unique states in {:?}",
            report.completed,
            report.requested,
            report.recorded_plies,
            report.unique_states,
            report.elapsed
        );

        Ok(SelfPlayRun {
            accumulator,
            report,
        })
    }

    /// One scoped thread per shard. Returns after every thread has joined.
    ///
    /// Under [`FailurePolicy::Abort`] the first failing shard cancels the
    /// rest at their next game boundary.
    fn run_shards(
        &self,
        shards: &[Shard],
        cancel: &CancelToken,
    ) -> Result<Vec<Result<ShardOutcome>>> {
        let worker = &self.worker;
        let abort_on_error = self.config.failure_policy == FailurePolicy::Abort;

        crossbeam::scope(|s| {
            let handles: Vec<_> = shards
                .iter()
                .map(|shard| {
                    debug!("Dispatching shard {} ({} games)", shard.index, shard.games);
                    s.spawn(move |_| {
                        let result = worker.run(shard, cancel);
                        if result.is_err() && abort_on_error {
                            cancel.cancel();
                        }
                        result
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(shards)
                .map(|(handle, shard)| match handle.join() {
                    Ok(result) => result.map_err(|source| Error::ShardFailed {
                        shard: shard.index,
                        source: Box::new(source),
                    }),
                    Err(payload) => Err(Error::WorkerPanicked {
                        shard: shard.index,
                        message: panic_message(payload.as_ref()),
                    }),
                })
                .collect()
        })
        .map_err(|payload| Error::WorkerPool(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::OthelloEngine;
    use crate::strategy::FirstLegalStrategy;
    use crate::core::{Board, GameRng, Move};
    use crate::training::RecordPlies;

    /// Returns no move on its first call, then plays first-legal.
    struct SilentOnce {
        fired: AtomicBool,
    }

    impl MoveSelector for SilentOnce {
        fn choose_move(&self, _: &Board, legal: &[Move], _: &mut GameRng) -> Option<Move> {
            if self.fired.swap(true, Ordering::SeqCst) {
                legal.first().copied()
            } else {
                None
            }
        }

        fn name(&self) -> &str {
            "silent-once"
        }
    }

    fn first_legal() -> Arc<dyn MoveSelector> {
        Arc::new(Player::new(Arc::new(FirstLegalStrategy::new())))
    }

    #[test]
    fn test_partition_remainder_to_last() {
        let shards = partition(10, 3);
        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0], Shard::new(0, 0, 3));
        assert_eq!(shards[1], Shard::new(1, 3, 3));
        assert_eq!(shards[2], Shard::new(2, 6, 4));
    }

    #[test]
    fn test_partition_covers_every_game_once() {
        for (total, workers) in [(0, 4), (5, 8), (100, 8), (7, 1), (64, 64)] {
            let shards = partition(total, workers);
            assert_eq!(shards.len(), workers);
            let mut next = 0;
            for shard in &shards {
                assert_eq!(shard.first_game, next);
                next += shard.games;
            }
            assert_eq!(next, total);
        }
    }

    #[test]
    fn test_partition_zero_workers() {
        assert_eq!(partition(3, 0), vec![Shard::new(0, 0, 3)]);
    }

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancel_token_deadline() {
        let past = CancelToken::new().with_deadline(Instant::now());
        assert!(past.is_cancelled());

        let future = CancelToken::new().with_deadline(Instant::now() + Duration::from_secs(3600));
        assert!(!future.is_cancelled());
    }

    #[test]
    fn test_child_token() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_unreachable_deadline_runs_without_one() {
        let json = r#"{
            "total_games": 2,
            "workers": 1,
            "max_duration": { "secs": 18446744073709551615, "nanos": 0 }
        }"#;
        let config = RunConfig::from_json_str(json).unwrap();
        assert_eq!(config.max_duration, Some(Duration::from_secs(u64::MAX)));

        let run = Orchestrator::new(OthelloEngine::new(), first_legal(), first_legal(), config)
            .run()
            .unwrap();
        assert!(run.report.is_complete());
        assert_eq!(run.report.completed, 2);
    }

    #[test]
    fn test_abort_stops_sibling_shards() {
        let black: Arc<dyn MoveSelector> = Arc::new(SilentOnce {
            fired: AtomicBool::new(false),
        });
        let config = RunConfig::default().with_total_games(20_000).with_workers(2);
        let orchestrator = Orchestrator::new(OthelloEngine::new(), black, first_legal(), config);

        let shards = partition(20_000, 2);
        let cancel = orchestrator.cancel_token().child();
        let results = orchestrator.run_shards(&shards, &cancel).unwrap();

        let failed = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(failed, 1);
        for outcome in results.iter().flatten() {
            assert!(outcome.summary.games_completed < outcome.summary.games_requested);
        }
        assert!(cancel.is_cancelled());
        assert!(!orchestrator.cancel_token().is_cancelled());
    }

    #[test]
    fn test_abort_does_not_cancel_later_runs() {
        let black: Arc<dyn MoveSelector> = Arc::new(SilentOnce {
            fired: AtomicBool::new(false),
        });
        let config = RunConfig::default().with_total_games(4).with_workers(2);
        let orchestrator = Orchestrator::new(OthelloEngine::new(), black, first_legal(), config);

        assert!(matches!(orchestrator.run(), Err(Error::ShardFailed { .. })));
        let run = orchestrator.run().unwrap();
        assert!(run.report.is_complete());
    }

    #[test]
    fn test_run_config_builder_and_validate() {
        let config = RunConfig::new()
            .with_total_games(12)
            .with_workers(3)
            .with_failure_policy(FailurePolicy::Exclude)
            .with_max_duration(Duration::from_secs(2));

        assert_eq!(config.total_games, 12);
        assert_eq!(config.workers, 3);
        assert_eq!(config.failure_policy, FailurePolicy::Exclude);
        assert_eq!(config.max_duration, Some(Duration::from_secs(2)));
        assert!(config.validate().is_ok());

        assert!(matches!(
            config.clone().with_workers(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        let no_plies = config.with_self_play(SelfPlayConfig::default().with_max_plies(0));
        assert!(no_plies.validate().is_err());
    }

    #[test]
    fn test_run_config_from_json() {
        let json = r#"{
            "total_games": 50,
            "workers": 2,
            "failure_policy": "Exclude",
            "self_play": { "record": { "Side": "White" }, "seed": 9 }
        }"#;
        let config = RunConfig::from_json_str(json).unwrap();

        assert_eq!(config.total_games, 50);
        assert_eq!(config.workers, 2);
        assert_eq!(config.failure_policy, FailurePolicy::Exclude);
        assert_eq!(config.self_play.record, RecordPlies::Side(Side::White));
        assert_eq!(config.self_play.seed, 9);
        assert_eq!(config.self_play.perspective, Side::Black);
        assert_eq!(config.self_play.max_plies, 128);
        assert_eq!(config.max_duration, None);
    }

    #[test]
    fn test_run_config_from_json_rejects_bad_input() {
        assert!(matches!(
            RunConfig::from_json_str("{ not json"),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            RunConfig::from_json_str(r#"{ "workers": 0 }"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_config_json_roundtrip() {
        let config = RunConfig::default()
            .with_workers(4)
            .with_max_duration(Duration::from_millis(1500));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RunConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_env_override() {
        std::env::set_var(WORKERS_ENV, "3");
        let config = RunConfig::default().with_workers(1).with_env_overrides();
        std::env::remove_var(WORKERS_ENV);
        assert_eq!(config.unwrap().workers, 3);

        let untouched = RunConfig::default().with_workers(5).with_env_overrides().unwrap();
        assert_eq!(untouched.workers, 5);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_run_report_totals() {
        let player = first_legal();
        let config = RunConfig::default().with_total_games(5).with_workers(2);
        let run = Orchestrator::new(OthelloEngine::new(), player.clone(), player, config)
            .run()
            .unwrap();

        assert!(run.report.is_complete());
        assert_eq!(run.report.completed, 5);
        assert_eq!(run.report.shards.len(), 2);
        // Every game is the same deterministic White win.
        assert_eq!(run.report.wins_for(Side::White), 5);
        assert_eq!(run.report.recorded_plies, 5 * 60);
        assert_eq!(run.report.unique_states, 60);
        assert_eq!(run.accumulator.total_count(), 300);
    }
}
