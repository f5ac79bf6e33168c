//! The frame-handling state machine shared by the sync and async decoders.

use std::fmt;

use tracing::{debug, error, warn};

use super::builder::{TableBuilder, TableView};
use super::DecodeConfig;
use crate::error::{Error, ProtocolError, Result, UpstreamError};
use crate::frame::{
    DataTable, DatasetCompletion, FragmentKind, Frame, FrameType, TableFragment, TableHeader,
};

/// How a snapshot relates to the snapshots before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplaceFlag {
    /// Rows extend what was received before
    Append,
    /// Rows supersede everything received before
    Replace,
    /// The table arrived whole in a single frame; it is the only snapshot
    FinalSingleShot,
}

impl From<FragmentKind> for ReplaceFlag {
    fn from(kind: FragmentKind) -> Self {
        match kind {
            FragmentKind::Append => ReplaceFlag::Append,
            FragmentKind::Replace => ReplaceFlag::Replace,
        }
    }
}

/// A point-in-time view of the primary table as it accumulates.
#[derive(Debug, Clone)]
pub struct ProgressiveSnapshot {
    pub table: TableView,
    /// Completion estimate in [0, 100]
    pub completion_percent: f64,
    pub replace: ReplaceFlag,
}

/// Counters collected while decoding one stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeStats {
    frames: [u64; FrameType::COUNT],
    /// Non-primary tables read and discarded
    pub tables_skipped: u64,
    /// Rows of non-primary tables read and discarded
    pub rows_skipped: u64,
    /// Rows received for the primary table (including replaced ones)
    pub primary_rows: u64,
    /// Snapshots emitted
    pub snapshots: u64,
}

impl DecodeStats {
    /// Number of frames of the given type seen.
    pub fn frames_of(&self, frame_type: FrameType) -> u64 {
        self.frames[frame_type.index()]
    }

    /// Total frames seen.
    pub fn total_frames(&self) -> u64 {
        self.frames.iter().sum()
    }

    fn record_frame(&mut self, frame_type: FrameType) {
        self.frames[frame_type.index()] += 1;
    }
}

impl fmt::Display for DecodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} primary rows, {} snapshots, {} tables skipped ({} rows)",
            self.total_frames(),
            self.primary_rows,
            self.snapshots,
            self.tables_skipped,
            self.rows_skipped
        )
    }
}

/// How a decode ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    /// DataSetCompletion was received and accepted
    pub completed: bool,
    /// The service flagged errors without an exception (non-fatal)
    pub has_errors: bool,
    pub stats: DecodeStats,
}

impl DecodeOutcome {
    /// Completed, but the service reported errors: results may be partial.
    pub fn completed_with_warnings(&self) -> bool {
        self.completed && self.has_errors
    }
}

/// Callback invoked when the stream completes with recorded errors.
pub type RecordedErrorHook = Box<dyn FnMut(&DatasetCompletion) + Send>;

/// Result of handling one frame.
#[derive(Debug)]
pub(crate) enum Step {
    Continue,
    Snapshot(ProgressiveSnapshot),
    Finished,
}

/// Cross-frame decoder state.
pub(crate) struct DecodeState {
    config: DecodeConfig,
    /// Builder of the active primary table, if one is open
    current: Option<TableBuilder>,
    /// A primary table (progressive or single-shot) has been seen
    primary_seen: bool,
    completion_percent: f64,
    outcome: DecodeOutcome,
    on_recorded_error: Option<RecordedErrorHook>,
}

impl DecodeState {
    pub(crate) fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            current: None,
            primary_seen: false,
            completion_percent: 0.0,
            outcome: DecodeOutcome::default(),
            on_recorded_error: None,
        }
    }

    pub(crate) fn set_recorded_error_hook(&mut self, hook: RecordedErrorHook) {
        self.on_recorded_error = Some(hook);
    }

    pub(crate) fn outcome(&self) -> &DecodeOutcome {
        &self.outcome
    }

    /// Id of the active primary table.
    pub(crate) fn current_table_id(&self) -> Option<i32> {
        self.current.as_ref().map(TableBuilder::table_id)
    }

    pub(crate) fn completion_percent(&self) -> f64 {
        self.completion_percent
    }

    /// Release the active table; called when decoding stops for any reason.
    pub(crate) fn release(&mut self) {
        self.current = None;
    }

    pub(crate) fn handle(&mut self, frame: Frame) -> Result<Step> {
        self.outcome.stats.record_frame(frame.frame_type());

        match frame {
            Frame::DatasetHeader(header) => {
                debug!(
                    is_progressive = header.is_progressive,
                    version = header.version.as_deref().unwrap_or("-"),
                    "Received DataSetHeader"
                );
                Ok(Step::Continue)
            }
            Frame::TableHeader(header) => self.table_header(header),
            Frame::TableFragment(fragment) => self.table_fragment(fragment),
            Frame::TableCompletion(completion) => {
                debug!(
                    table_id = completion.table_id,
                    row_count = completion.row_count,
                    "Received TableCompletion"
                );
                if self.current_table_id() == Some(completion.table_id) {
                    self.current = None;
                }
                Ok(Step::Continue)
            }
            Frame::TableProgress(progress) => {
                let percent = progress.percent.clamp(0.0, 100.0);
                if percent > self.completion_percent {
                    self.completion_percent = percent;
                }
                debug!(
                    "Received TableProgress. CompletionPercentage {:.2}%",
                    self.completion_percent
                );
                Ok(Step::Continue)
            }
            Frame::DataTable(table) => self.data_table(table),
            Frame::DatasetCompletion(completion) => self.dataset_completion(completion),
            Frame::Unknown { frame_type } => {
                Err(ProtocolError::UnexpectedFrame { frame_type }.into())
            }
        }
    }

    fn table_header(&mut self, header: TableHeader) -> Result<Step> {
        debug!(
            table_kind = %header.table_kind,
            table_id = header.table_id,
            table_name = %header.table_name,
            columns = header.columns.len(),
            "Received TableHeader"
        );

        if !header.table_kind.is_primary() {
            self.outcome.stats.tables_skipped += 1;
            return Ok(Step::Continue);
        }
        if self.primary_seen {
            return Err(ProtocolError::MultiplePrimaryResults {
                table_id: header.table_id,
            }
            .into());
        }

        self.primary_seen = true;
        self.completion_percent = 0.0;
        self.current = Some(TableBuilder::with_capacity(
            header.table_id,
            header.columns,
            self.config.initial_row_capacity,
        ));
        Ok(Step::Continue)
    }

    fn table_fragment(&mut self, fragment: TableFragment) -> Result<Step> {
        debug!(
            field_count = fragment.field_count,
            subtype = ?fragment.kind,
            table_id = fragment.table_id,
            rows = fragment.rows.len(),
            "Received TableFragment"
        );

        let builder = match self.current.as_mut() {
            Some(builder) if builder.table_id() == fragment.table_id => builder,
            _ => {
                // Not the primary table: the rows were read off the stream
                // with the frame and are dropped here.
                self.outcome.stats.rows_skipped += fragment.rows.len() as u64;
                return Ok(Step::Continue);
            }
        };

        if fragment.field_count != builder.columns().len() {
            return Err(ProtocolError::RowArity {
                table_id: fragment.table_id,
                expected: builder.columns().len(),
                actual: fragment.field_count,
            }
            .into());
        }

        if fragment.kind == FragmentKind::Replace {
            builder.clear_rows();
        }
        let added = fragment.rows.len() as u64;
        let start = builder.append_rows(fragment.rows)?;
        let table = builder.snapshot_view(start);

        self.outcome.stats.primary_rows += added;
        self.outcome.stats.snapshots += 1;
        Ok(Step::Snapshot(ProgressiveSnapshot {
            table,
            completion_percent: self.completion_percent,
            replace: fragment.kind.into(),
        }))
    }

    fn data_table(&mut self, table: DataTable) -> Result<Step> {
        debug!(
            table_kind = %table.table_kind,
            table_id = table.table_id,
            rows = table.rows.len(),
            "Received DataTable"
        );

        if !table.table_kind.is_primary() {
            debug!("Ignoring data for TableKind:{}", table.table_kind);
            self.outcome.stats.tables_skipped += 1;
            self.outcome.stats.rows_skipped += table.rows.len() as u64;
            return Ok(Step::Continue);
        }
        if self.primary_seen {
            return Err(ProtocolError::MultiplePrimaryResults {
                table_id: table.table_id,
            }
            .into());
        }

        self.primary_seen = true;
        let added = table.rows.len() as u64;
        let mut builder =
            TableBuilder::with_capacity(table.table_id, table.columns, table.rows.len());
        builder.append_rows(table.rows)?;

        self.completion_percent = 100.0;
        self.outcome.stats.primary_rows += added;
        self.outcome.stats.snapshots += 1;
        Ok(Step::Snapshot(ProgressiveSnapshot {
            table: builder.snapshot_view(0),
            completion_percent: 100.0,
            replace: ReplaceFlag::FinalSingleShot,
        }))
    }

    fn dataset_completion(&mut self, mut completion: DatasetCompletion) -> Result<Step> {
        debug!(
            has_errors = completion.has_errors,
            cancelled = completion.cancelled,
            "Received DataSetCompletion"
        );
        self.current = None;

        if completion.cancelled {
            warn!("Dataset was cancelled by the service");
            return Err(Error::Cancelled);
        }
        if let Some(exception) = completion.exception.take() {
            error!("Dataset completed with an error: {}", exception);
            return Err(Error::Upstream(exception));
        }
        if completion.has_errors {
            error!("Dataset has errors");
            self.outcome.has_errors = true;
            if let Some(hook) = self.on_recorded_error.as_mut() {
                hook(&completion);
            }
            if self.config.fail_on_recorded_errors {
                return Err(UpstreamError::new(
                    "DataSetHasErrors",
                    "dataset completed with errors and no exception",
                )
                .into());
            }
        }

        self.outcome.completed = true;
        Ok(Step::Finished)
    }

    /// Count and reject a frame that arrived after DataSetCompletion.
    pub(crate) fn trailing(&mut self, frame: &Frame) -> Error {
        self.outcome.stats.record_frame(frame.frame_type());
        ProtocolError::TrailingFrame {
            frame_type: frame.frame_type().to_string(),
        }
        .into()
    }
}
