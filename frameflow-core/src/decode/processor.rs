//! Synchronous, pull-based frame processor.

use std::iter::FusedIterator;

use super::state::{DecodeState, RecordedErrorHook, Step};
use super::{DecodeConfig, DecodeOutcome, ProgressiveSnapshot};
use crate::error::{Error, ProtocolError, Result};
use crate::frame::DatasetCompletion;
use crate::io::{FrameReader, ScopedReader};

/// Walks a frame stream and yields progressive snapshots of the primary table.
///
/// The processor is single-pass: once it returns `None` (stream completed)
/// or an error, it is finished and keeps returning `None`. The reader is
/// closed exactly once, on whichever path ends the decode, or on drop.
///
/// # Example
///
/// ```rust
/// use frameflow_core::decode::{DecodeConfig, FrameProcessor};
/// use frameflow_core::frame::{DataTable, DatasetCompletion, Frame, TableKind};
/// use frameflow_core::io::MemoryFrameReader;
/// use frameflow_core::schema::{ColumnDescriptor, DataKind};
/// use frameflow_core::value::Value;
///
/// let frames = vec![
///     Frame::DataTable(DataTable {
///         table_id: 0,
///         table_name: "PrimaryResult".into(),
///         table_kind: TableKind::PrimaryResult,
///         columns: vec![ColumnDescriptor::new("a", DataKind::Long)].into(),
///         rows: vec![vec![Value::Int(1)], vec![Value::Int(2)]],
///     }),
///     Frame::DatasetCompletion(DatasetCompletion::default()),
/// ];
///
/// let processor = FrameProcessor::new(MemoryFrameReader::new(frames), DecodeConfig::default());
/// let snapshots: Vec<_> = processor.collect::<Result<_, _>>().unwrap();
/// assert_eq!(snapshots.len(), 1);
/// assert_eq!(snapshots[0].completion_percent, 100.0);
/// ```
pub struct FrameProcessor<R: FrameReader> {
    reader: ScopedReader<R>,
    state: DecodeState,
    done: bool,
}

impl<R: FrameReader> FrameProcessor<R> {
    pub fn new(reader: R, config: DecodeConfig) -> Self {
        Self {
            reader: ScopedReader::new(reader),
            state: DecodeState::new(config),
            done: false,
        }
    }

    /// Register a callback for streams that complete with recorded errors.
    pub fn on_recorded_error<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&DatasetCompletion) + Send + 'static,
    {
        self.state
            .set_recorded_error_hook(Box::new(hook) as RecordedErrorHook);
        self
    }

    /// How the decode ended so far. Final once the iterator is exhausted.
    pub fn outcome(&self) -> &DecodeOutcome {
        self.state.outcome()
    }

    /// Consume the processor, returning its outcome.
    pub fn into_outcome(self) -> DecodeOutcome {
        self.state.outcome().clone()
    }

    /// Current completion estimate of the active table.
    pub fn completion_percent(&self) -> f64 {
        self.state.completion_percent()
    }

    /// Frames pulled from the reader so far.
    pub fn frames_read(&self) -> u64 {
        self.reader.frames_read()
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    fn finish(&mut self) -> Result<()> {
        self.done = true;
        self.state.release();
        // Grammar: DataSetCompletion is the last frame.
        let trailing = match self.reader.next_frame() {
            Ok(Some(frame)) => Some(self.state.trailing(&frame)),
            Ok(None) => None,
            Err(e) => Some(e),
        };
        let closed = self.reader.close();
        match trailing {
            Some(e) => Err(e),
            None => closed,
        }
    }

    fn fail(&mut self, error: Error) -> Error {
        self.done = true;
        self.state.release();
        if let Err(e) = self.reader.close() {
            tracing::warn!("Failed to close frame reader after error: {}", e);
        }
        error
    }
}

impl<R: FrameReader> Iterator for FrameProcessor<R> {
    type Item = Result<ProgressiveSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let frame = match self.reader.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Some(Err(self.fail(ProtocolError::MissingCompletion.into()))),
                Err(e) => return Some(Err(self.fail(e))),
            };

            match self.state.handle(frame) {
                Ok(Step::Continue) => continue,
                Ok(Step::Snapshot(snapshot)) => return Some(Ok(snapshot)),
                Ok(Step::Finished) => {
                    tracing::debug!("Decode finished: {}", self.state.outcome().stats);
                    return self.finish().err().map(Err);
                }
                Err(e) => return Some(Err(self.fail(e))),
            }
        }
    }
}

impl<R: FrameReader> FusedIterator for FrameProcessor<R> {}
