//! Materialization of a progressive snapshot sequence into final records.

use crate::decode::{DecodeConfig, DecodeOutcome, FrameProcessor, ProgressiveSnapshot, ReplaceFlag};
use crate::error::Result;
use crate::io::{AsyncFrameReader, FrameReader};
use crate::record::{project, Record};

/// Folds snapshots into the complete record sequence.
///
/// Append snapshots contribute the rows their fragment added; replace and
/// single-shot snapshots discard everything aggregated so far first.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    records: Vec<Record>,
    snapshots: u64,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: &ProgressiveSnapshot) {
        let table = &snapshot.table;
        match snapshot.replace {
            ReplaceFlag::Append => {
                self.records.extend(project(table.columns(), table.new_rows()));
            }
            ReplaceFlag::Replace | ReplaceFlag::FinalSingleShot => {
                self.records.clear();
                self.records.extend(project(table.columns(), table.rows()));
            }
        }
        self.snapshots += 1;
    }

    /// Records aggregated so far.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Snapshots consumed so far.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// A fully materialized query answer.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub records: Vec<Record>,
    pub outcome: DecodeOutcome,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Completed, but the service reported errors: records may be partial.
    pub fn completed_with_warnings(&self) -> bool {
        self.outcome.completed_with_warnings()
    }
}

/// Drain a processor into a materialized result.
pub fn aggregate<R: FrameReader>(mut processor: FrameProcessor<R>) -> Result<QueryResult> {
    let mut aggregator = ResultAggregator::new();
    for snapshot in processor.by_ref() {
        aggregator.push(&snapshot?);
    }
    Ok(QueryResult {
        records: aggregator.into_records(),
        outcome: processor.into_outcome(),
    })
}

/// Decode a whole frame stream into records with the default configuration.
pub fn materialize<R: FrameReader>(reader: R) -> Result<QueryResult> {
    materialize_with(reader, DecodeConfig::default())
}

pub fn materialize_with<R: FrameReader>(reader: R, config: DecodeConfig) -> Result<QueryResult> {
    aggregate(FrameProcessor::new(reader, config))
}

/// Async counterpart of [`materialize_with`].
pub async fn materialize_async<R: AsyncFrameReader>(
    reader: R,
    config: DecodeConfig,
) -> Result<QueryResult> {
    let mut decoder = crate::decode::ProgressStream::new(reader, config);
    let mut aggregator = ResultAggregator::new();
    while let Some(snapshot) = decoder.next_snapshot().await? {
        aggregator.push(&snapshot);
    }
    Ok(QueryResult {
        records: aggregator.into_records(),
        outcome: decoder.outcome().clone(),
    })
}
