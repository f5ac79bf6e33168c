//! Frame types of the progressive result protocol.
//!
//! A query execution produces an ordered sequence of frames:
//!
//! ```text
//! DataSetHeader
//!   ( TableHeader TableFragment* TableCompletion | DataTable | TableProgress )*
//! DataSetCompletion
//! ```
//!
//! Only tables of kind [`TableKind::PrimaryResult`] carry query output; the
//! others hold administrative data (query properties, completion info) and
//! are read and discarded by the decoder.

mod wire;

pub use wire::WireDecoder;

use std::fmt;

use crate::error::UpstreamError;
use crate::schema::TableSchema;
use crate::value::Row;

/// Role of a table within the data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The table contains the actual data returned by the query.
    PrimaryResult,
    /// Information about the runtime of the query.
    QueryCompletionInformation,
    /// Trace log for the query.
    QueryTraceLog,
    /// Perf log for the query.
    QueryPerfLog,
    /// Table of contents for the other parts.
    TableOfContents,
    /// Properties of the query.
    QueryProperties,
    /// Execution plan for the query.
    QueryPlan,
    /// Unknown table kind.
    Unknown,
}

impl TableKind {
    /// Parse a wire name. Unrecognized names map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "PrimaryResult" => TableKind::PrimaryResult,
            "QueryCompletionInformation" => TableKind::QueryCompletionInformation,
            "QueryTraceLog" => TableKind::QueryTraceLog,
            "QueryPerfLog" => TableKind::QueryPerfLog,
            "TableOfContents" => TableKind::TableOfContents,
            "QueryProperties" => TableKind::QueryProperties,
            "QueryPlan" => TableKind::QueryPlan,
            _ => TableKind::Unknown,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, TableKind::PrimaryResult)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a fragment's rows combine with rows already received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Append the rows to the rest of the fragments.
    Append,
    /// Replace all previous rows of the table with this fragment.
    Replace,
}

impl FragmentKind {
    /// Parse a wire name (`DataAppend`/`DataReplace`, or the short forms).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DataAppend" | "Append" => Some(FragmentKind::Append),
            "DataReplace" | "Replace" => Some(FragmentKind::Replace),
            _ => None,
        }
    }
}

/// First frame of the stream; protocol metadata only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetHeader {
    /// Whether tables may arrive in multiple fragments
    pub is_progressive: bool,
    /// Protocol version, e.g. `v2.0`
    pub version: Option<String>,
}

/// Announces a new table and its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub table_id: i32,
    pub table_name: String,
    pub table_kind: TableKind,
    pub columns: TableSchema,
}

/// A batch of rows for an already announced table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFragment {
    pub table_id: i32,
    /// Number of values per row declared by the sender
    pub field_count: usize,
    pub kind: FragmentKind,
    pub rows: Vec<Row>,
}

/// Marks a table finished.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCompletion {
    pub table_id: i32,
    pub row_count: u64,
}

/// Advisory completion estimate for the active table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableProgress {
    /// Percentage in [0, 100]
    pub percent: f64,
}

/// A complete (usually small) table: schema and rows in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub table_id: i32,
    pub table_name: String,
    pub table_kind: TableKind,
    pub columns: TableSchema,
    pub rows: Vec<Row>,
}

/// Final frame of the whole stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetCompletion {
    pub has_errors: bool,
    pub cancelled: bool,
    pub exception: Option<UpstreamError>,
}

/// One unit of the progressive result protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    DatasetHeader(DatasetHeader),
    TableHeader(TableHeader),
    TableFragment(TableFragment),
    TableCompletion(TableCompletion),
    TableProgress(TableProgress),
    DataTable(DataTable),
    DatasetCompletion(DatasetCompletion),
    /// A frame kind this decoder does not understand
    Unknown { frame_type: String },
}

/// Discriminant of [`Frame`], used for logging and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    DatasetHeader,
    TableHeader,
    TableFragment,
    TableCompletion,
    TableProgress,
    DataTable,
    DatasetCompletion,
    Unknown,
}

impl FrameType {
    /// Number of frame types.
    pub const COUNT: usize = 8;

    /// All frame types, in grammar order.
    pub const ALL: [FrameType; Self::COUNT] = [
        FrameType::DatasetHeader,
        FrameType::TableHeader,
        FrameType::TableFragment,
        FrameType::TableCompletion,
        FrameType::TableProgress,
        FrameType::DataTable,
        FrameType::DatasetCompletion,
        FrameType::Unknown,
    ];

    /// Wire name of the frame type.
    pub fn name(&self) -> &'static str {
        match self {
            FrameType::DatasetHeader => "DataSetHeader",
            FrameType::TableHeader => "TableHeader",
            FrameType::TableFragment => "TableFragment",
            FrameType::TableCompletion => "TableCompletion",
            FrameType::TableProgress => "TableProgress",
            FrameType::DataTable => "DataTable",
            FrameType::DatasetCompletion => "DataSetCompletion",
            FrameType::Unknown => "Unknown",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Frame {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::DatasetHeader(_) => FrameType::DatasetHeader,
            Frame::TableHeader(_) => FrameType::TableHeader,
            Frame::TableFragment(_) => FrameType::TableFragment,
            Frame::TableCompletion(_) => FrameType::TableCompletion,
            Frame::TableProgress(_) => FrameType::TableProgress,
            Frame::DataTable(_) => FrameType::DataTable,
            Frame::DatasetCompletion(_) => FrameType::DatasetCompletion,
            Frame::Unknown { .. } => FrameType::Unknown,
        }
    }

    /// Whether this frame terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::DatasetCompletion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_names() {
        assert_eq!(TableKind::from_name("PrimaryResult"), TableKind::PrimaryResult);
        assert_eq!(TableKind::from_name("QueryProperties"), TableKind::QueryProperties);
        assert_eq!(TableKind::from_name("Something"), TableKind::Unknown);
        assert!(TableKind::PrimaryResult.is_primary());
        assert!(!TableKind::QueryCompletionInformation.is_primary());
        assert_eq!(TableKind::QueryPlan.to_string(), "QueryPlan");
    }

    #[test]
    fn test_fragment_kind_names() {
        assert_eq!(FragmentKind::from_name("DataAppend"), Some(FragmentKind::Append));
        assert_eq!(FragmentKind::from_name("DataReplace"), Some(FragmentKind::Replace));
        assert_eq!(FragmentKind::from_name("DataMerge"), None);
    }

    #[test]
    fn test_frame_type() {
        let frame = Frame::TableProgress(TableProgress { percent: 10.0 });
        assert_eq!(frame.frame_type(), FrameType::TableProgress);
        assert!(!frame.is_terminal());

        let frame = Frame::DatasetCompletion(DatasetCompletion::default());
        assert_eq!(frame.frame_type().name(), "DataSetCompletion");
        assert!(frame.is_terminal());

        for (i, ty) in FrameType::ALL.iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
    }
}
