//! Dataset export.
//!
//! Two headerless CSV layouts, one row per unique state, cells in row-major
//! order (`1` Black, `-1` White, `0` empty):
//!
//! - mean: 64 cells, then `sum / count`
//! - extended: 64 cells, then `sum`, then `count`
//!
//! The extended layout keeps the raw totals, so it can be read back with
//! [`read_extended`] and merged with the accumulator of a later run.

use std::io::{Read, Write};

use crate::codec::{decode, encode, CompressedStateKey};
use crate::core::{Board, LabelVector, SQUARES};
use crate::error::{Error, Result};

use super::accumulator::{OutcomeAccumulator, OutcomeStats};

const MEAN_FIELDS: usize = SQUARES + 1;
const EXTENDED_FIELDS: usize = SQUARES + 2;

/// One exported state.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetRow {
    pub key: CompressedStateKey,
    pub labels: LabelVector,
    pub sum: f64,
    pub count: u64,
    pub mean: f64,
}

impl DatasetRow {
    fn new(key: &CompressedStateKey, stats: &OutcomeStats) -> Self {
        Self {
            key: *key,
            labels: decode(key),
            sum: stats.sum,
            count: stats.count,
            mean: stats.mean(),
        }
    }
}

/// Read-only export view over a global accumulator.
///
/// Writers only borrow the accumulator. A failed write can be retried with
/// a fresh sink without replaying any games.
#[derive(Clone, Copy, Debug)]
pub struct DatasetBuilder<'a> {
    accumulator: &'a OutcomeAccumulator,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(accumulator: &'a OutcomeAccumulator) -> Self {
        Self { accumulator }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.accumulator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulator.is_empty()
    }

    /// Rows in map order, decoded on demand.
    pub fn rows(&self) -> impl Iterator<Item = DatasetRow> + 'a {
        self.accumulator
            .iter()
            .map(|(key, stats)| DatasetRow::new(key, stats))
    }

    /// Rows ordered by key, for byte-identical files across runs.
    pub fn rows_sorted(&self) -> impl Iterator<Item = DatasetRow> + 'a {
        let mut entries: Vec<_> = self.accumulator.iter().collect();
        entries.sort_unstable_by_key(|(key, _)| **key);
        entries
            .into_iter()
            .map(|(key, stats)| DatasetRow::new(key, stats))
    }

    /// Write the mean layout. Returns the number of rows written.
    pub fn write_mean<W: Write>(&self, sink: W) -> Result<u64> {
        self.write_with(sink, MEAN_FIELDS, |row, record| {
            record.push_field(&row.mean.to_string());
        })
    }

    /// Write the extended layout. Returns the number of rows written.
    pub fn write_extended<W: Write>(&self, sink: W) -> Result<u64> {
        self.write_with(sink, EXTENDED_FIELDS, |row, record| {
            record.push_field(&row.sum.to_string());
            record.push_field(&row.count.to_string());
        })
    }

    fn write_with<W, F>(&self, sink: W, fields: usize, mut tail: F) -> Result<u64>
    where
        W: Write,
        F: FnMut(&DatasetRow, &mut csv::StringRecord),
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        let mut record = csv::StringRecord::with_capacity(fields * 2, fields);
        let mut written = 0;

        for row in self.rows_sorted() {
            record.clear();
            for &label in row.labels.iter() {
                record.push_field(label_field(label));
            }
            tail(&row, &mut record);
            writer.write_record(&record)?;
            written += 1;
        }

        writer.flush()?;
        Ok(written)
    }
}

fn label_field(label: i8) -> &'static str {
    match label {
        1 => "1",
        -1 => "-1",
        _ => "0",
    }
}

/// Load an extended-layout dataset back into an accumulator.
///
/// Repeated rows for the same board are added together.
pub fn read_extended<R: Read>(source: R) -> Result<OutcomeAccumulator> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    let mut accumulator = OutcomeAccumulator::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let malformed = |reason: String| Error::MalformedRow { line, reason };

        if record.len() != EXTENDED_FIELDS {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                EXTENDED_FIELDS,
                record.len()
            )));
        }

        let mut labels = [0i8; SQUARES];
        for (square, label) in labels.iter_mut().enumerate() {
            let field = &record[square];
            *label = field
                .trim()
                .parse()
                .map_err(|_| malformed(format!("bad cell {:?} at square {}", field, square)))?;
        }
        let board = Board::from_labels(&labels)
            .ok_or_else(|| malformed("cell values must be -1, 0 or 1".into()))?;

        let sum: f64 = record[SQUARES]
            .trim()
            .parse()
            .map_err(|_| malformed(format!("bad sum {:?}", &record[SQUARES])))?;
        let count: u64 = record[SQUARES + 1]
            .trim()
            .parse()
            .map_err(|_| malformed(format!("bad count {:?}", &record[SQUARES + 1])))?;
        if count == 0 || !sum.is_finite() {
            return Err(malformed("count must be positive and sum finite".into()));
        }

        accumulator.add_stats(encode(&board), OutcomeStats { sum, count });
    }

    Ok(accumulator)
}
