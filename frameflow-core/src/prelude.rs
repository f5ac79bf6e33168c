//! Convenient re-exports of the most used types.
//!
//! ```rust
//! use frameflow_core::prelude::*;
//! ```

pub use crate::aggregate::{materialize, QueryResult, ResultAggregator};
pub use crate::client::QueryClient;
pub use crate::decode::{
    DecodeConfig, DecodeOutcome, FrameProcessor, ProgressiveSnapshot, ReplaceFlag, TableView,
};
pub use crate::error::{Error, ProtocolError, Result, UpstreamError};
pub use crate::frame::{Frame, TableKind, WireDecoder};
pub use crate::io::{
    ClientRequestProperties, FileFrameSource, FrameReader, FrameSource, MemoryFrameReader,
    QueryRequest,
};
pub use crate::record::Record;
pub use crate::schema::{ColumnDescriptor, DataKind, TableSchema};
pub use crate::value::{Row, Value};
