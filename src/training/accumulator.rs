//! Per-state outcome accumulators and their merge.
//!
//! An accumulator maps each canonical state key to the running sum of the
//! outcomes of every game that visited it and the number of visits. The mean
//! label is only computed on export.
//!
//! Merging adds sums and counts key by key, treating a missing key as
//! `(0, 0)`. The operation is commutative and associative, so shard
//! accumulators can be folded in any order. Sums are `f64`, so different
//! fold orders may differ in the last bits of a mean; counts are exact.

use std::io::{Read, Write};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::codec::CompressedStateKey;
use crate::error::Result;

/// Running totals for a single state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
    /// Sum of the outcomes of every recorded visit.
    pub sum: f64,
    /// Number of recorded visits.
    pub count: u64,
}

impl OutcomeStats {
    /// Stats for a single visit.
    #[must_use]
    pub fn single(outcome: f64) -> Self {
        Self {
            sum: outcome,
            count: 1,
        }
    }

    /// Add one visit.
    pub fn record(&mut self, outcome: f64) {
        self.sum += outcome;
        self.count += 1;
    }

    /// Add another set of totals.
    pub fn absorb(&mut self, other: OutcomeStats) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean outcome. Zero for an empty entry.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Map from state key to outcome totals.
///
/// Owned by exactly one writer at a time: a worker during simulation, the
/// orchestrator during merge and export.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeAccumulator {
    entries: FxHashMap<CompressedStateKey, OutcomeStats>,
}

impl OutcomeAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator sized for `capacity` states.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Record one visit of `key` with the visiting game's outcome.
    pub fn record(&mut self, key: CompressedStateKey, outcome: f64) {
        self.entries
            .entry(key)
            .and_modify(|stats| stats.record(outcome))
            .or_insert_with(|| OutcomeStats::single(outcome));
    }

    /// Record every key of one game with that game's outcome.
    pub fn record_game<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a CompressedStateKey>,
        outcome: f64,
    ) {
        for key in keys {
            self.record(*key, outcome);
        }
    }

    /// Add pre-aggregated totals for `key`.
    pub fn add_stats(&mut self, key: CompressedStateKey, stats: OutcomeStats) {
        self.entries.entry(key).or_default().absorb(stats);
    }

    /// Fold `other` into `self`.
    pub fn merge_from(&mut self, other: OutcomeAccumulator) {
        self.entries.reserve(other.entries.len());
        for (key, stats) in other.entries {
            self.add_stats(key, stats);
        }
    }

    /// Totals for a state, if it was ever visited.
    #[must_use]
    pub fn get(&self, key: &CompressedStateKey) -> Option<&OutcomeStats> {
        self.entries.get(key)
    }

    /// Number of unique states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no state has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (key, stats) pairs in map order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompressedStateKey, &OutcomeStats)> {
        self.entries.iter()
    }

    /// Total visits across all states.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|s| s.count).sum()
    }

    /// Compare with `other`: same keys, same counts, and means within
    /// `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &OutcomeAccumulator, tolerance: f64) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(key, stats)| {
                other.get(key).map_or(false, |o| {
                    o.count == stats.count && (o.mean() - stats.mean()).abs() <= tolerance
                })
            })
    }

    /// Write a bincode image of the raw totals.
    pub fn save_snapshot<W: Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Read an image written by [`OutcomeAccumulator::save_snapshot`].
    pub fn load_snapshot<R: Read>(reader: R) -> Result<Self> {
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Combine two accumulators. The larger map is reused as the target.
#[must_use]
pub fn merge(a: OutcomeAccumulator, b: OutcomeAccumulator) -> OutcomeAccumulator {
    let (mut target, source) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    target.merge_from(source);
    target
}

/// Fold any number of accumulators into one.
#[must_use]
pub fn merge_all(accumulators: impl IntoIterator<Item = OutcomeAccumulator>) -> OutcomeAccumulator {
    accumulators
        .into_iter()
        .fold(OutcomeAccumulator::new(), merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::core::{Board, Move, Side};
    use crate::rules::{GameEngine, OthelloEngine};

    fn keys() -> Vec<CompressedStateKey> {
        let engine = OthelloEngine::new();
        let start = Board::initial();
        let mut keys = vec![encode(&start)];
        for mv in engine.legal_moves(&start, Side::Black) {
            keys.push(encode(&engine.apply(&start, mv).unwrap()));
        }
        keys
    }

    #[test]
    fn test_outcome_stats() {
        let mut stats = OutcomeStats::single(1.0);
        stats.record(0.0);
        stats.record(0.5);
        assert_eq!(stats.count, 3);
        assert!((stats.mean() - 0.5).abs() < 1e-12);
        assert_eq!(OutcomeStats::default().mean(), 0.0);
    }

    #[test]
    fn test_record_creates_then_updates() {
        let k = keys();
        let mut acc = OutcomeAccumulator::new();
        acc.record(k[0], 1.0);
        assert_eq!(acc.get(&k[0]), Some(&OutcomeStats { sum: 1.0, count: 1 }));

        acc.record(k[0], 0.0);
        assert_eq!(acc.get(&k[0]), Some(&OutcomeStats { sum: 1.0, count: 2 }));
        assert_eq!(acc.len(), 1);
        assert!(acc.get(&k[1]).is_none());
    }

    #[test]
    fn test_record_game_counts_every_key() {
        let k = keys();
        let mut acc = OutcomeAccumulator::new();
        acc.record_game(&k, 0.5);
        assert_eq!(acc.len(), k.len());
        assert_eq!(acc.total_count(), k.len() as u64);
    }

    #[test]
    fn test_merge_adds_and_treats_missing_as_zero() {
        let k = keys();
        let mut a = OutcomeAccumulator::new();
        a.record(k[0], 1.0);
        a.record(k[1], 0.0);

        let mut b = OutcomeAccumulator::new();
        b.record(k[1], 1.0);
        b.record(k[2], 0.5);

        let merged = merge(a, b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(&k[0]), Some(&OutcomeStats { sum: 1.0, count: 1 }));
        assert_eq!(merged.get(&k[1]), Some(&OutcomeStats { sum: 1.0, count: 2 }));
        assert_eq!(merged.get(&k[2]), Some(&OutcomeStats { sum: 0.5, count: 1 }));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let k = keys();
        let mut a = OutcomeAccumulator::new();
        a.record(k[3], 0.5);

        assert_eq!(merge(a.clone(), OutcomeAccumulator::new()), a);
        assert_eq!(merge(OutcomeAccumulator::new(), a.clone()), a);
        assert!(merge_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_approx_eq() {
        let k = keys();
        let mut a = OutcomeAccumulator::new();
        a.record(k[0], 0.1);
        a.record(k[0], 0.2);

        let mut b = OutcomeAccumulator::new();
        b.add_stats(k[0], OutcomeStats { sum: 0.30000000000000004, count: 2 });
        assert!(a.approx_eq(&b, 1e-9));

        b.record(k[1], 1.0);
        assert!(!a.approx_eq(&b, 1e-9));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let k = keys();
        let mut acc = OutcomeAccumulator::new();
        for (i, key) in k.iter().enumerate() {
            acc.record(*key, i as f64 / 10.0);
        }

        let mut buffer = Vec::new();
        acc.save_snapshot(&mut buffer).unwrap();
        let restored = OutcomeAccumulator::load_snapshot(buffer.as_slice()).unwrap();
        assert_eq!(restored, acc);
    }

    #[test]
    fn test_load_snapshot_rejects_garbage() {
        let garbage = [0xFFu8; 3];
        assert!(OutcomeAccumulator::load_snapshot(&garbage[..]).is_err());
    }

    #[test]
    fn test_merge_keeps_move_keys_distinct() {
        let engine = OthelloEngine::new();
        let start = Board::initial();
        let a = engine.apply(&start, Move::new(2, 3, Side::Black)).unwrap();
        let b = engine.apply(&start, Move::new(3, 2, Side::Black)).unwrap();

        let mut left = OutcomeAccumulator::new();
        left.record(encode(&a), 1.0);
        let mut right = OutcomeAccumulator::new();
        right.record(encode(&b), 0.0);

        let merged = merge(left, right);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.total_count(), 2);
    }
}
