//! Progressive frame decoding.
//!
//! ## Components
//!
//! - [`TableBuilder`] - Accumulates one table's schema and rows
//! - [`FrameProcessor`] - Pull-based iterator of [`ProgressiveSnapshot`]s over a [`FrameReader`]
//! - [`ProgressStream`] / [`decode_stream`] - The same state machine over an [`AsyncFrameReader`]
//!
//! Only the primary result table produces snapshots. Every other table is
//! still read frame by frame so the stream position never drifts.
//!
//! ## Example
//!
//! ```rust
//! use frameflow_core::decode::{DecodeConfig, FrameProcessor};
//! use frameflow_core::io::MemoryFrameReader;
//! use frameflow_core::frame::{DatasetCompletion, Frame};
//!
//! let reader = MemoryFrameReader::new(vec![Frame::DatasetCompletion(DatasetCompletion::default())]);
//! let mut processor = FrameProcessor::new(reader, DecodeConfig::default());
//! assert!(processor.next().is_none());
//! assert!(processor.outcome().completed);
//! ```
//!
//! [`FrameReader`]: crate::io::FrameReader
//! [`AsyncFrameReader`]: crate::io::AsyncFrameReader

mod builder;
mod processor;
mod state;
mod stream;

pub use builder::{TableBuilder, TableView, DEFAULT_ROW_CAPACITY, MAX_ROW_CAPACITY};
pub use processor::FrameProcessor;
pub use state::{
    DecodeOutcome, DecodeStats, ProgressiveSnapshot, RecordedErrorHook, ReplaceFlag,
};
pub use stream::{decode_stream, ProgressStream};

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Rows reserved when the primary table starts, capped at
    /// [`MAX_ROW_CAPACITY`].
    pub initial_row_capacity: usize,
    /// Treat `HasErrors` without an exception as fatal.
    ///
    /// Off by default: such a stream completes and the outcome is flagged
    /// as completed with warnings.
    pub fail_on_recorded_errors: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            initial_row_capacity: DEFAULT_ROW_CAPACITY,
            fail_on_recorded_errors: false,
        }
    }
}

impl DecodeConfig {
    /// Builder: fail on recorded errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.fail_on_recorded_errors = strict;
        self
    }
}
