//! # frameflow-core
//!
//! Decoder for progressive query-result frame streams.
//!
//! A query engine answers with an ordered sequence of frames: a dataset
//! header, table headers, row fragments, progress updates and a final
//! completion frame. This crate turns that stream into the primary result
//! table, either as a series of [`ProgressiveSnapshot`]s or fully
//! materialized into [`Record`]s.
//!
//! ## Architecture
//!
//! - **[`frame`]**: the frame model and its JSON wire decoding
//! - **[`io`]**: where frames come from ([`FrameSource`], [`FrameReader`])
//! - **[`decode`]**: the state machine building the primary table
//! - **[`record`]** / **[`aggregate`]**: projection into name → value records
//! - **[`client`]**: one-call query execution
//!
//! ## Example
//!
//! ```rust
//! use frameflow_core::prelude::*;
//! use frameflow_core::frame::{DataTable, DatasetCompletion};
//! use frameflow_core::io::MemoryFrameSource;
//!
//! let frames = vec![
//!     Frame::DataTable(DataTable {
//!         table_id: 0,
//!         table_name: "PrimaryResult".into(),
//!         table_kind: TableKind::PrimaryResult,
//!         columns: vec![ColumnDescriptor::new("a", DataKind::Long)].into(),
//!         rows: vec![vec![Value::Int(1)], vec![Value::Int(2)]],
//!     }),
//!     Frame::DatasetCompletion(DatasetCompletion::default()),
//! ];
//!
//! let client = QueryClient::new(MemoryFrameSource::new(frames), "Samples");
//! let result = client.execute_query("T | take 2")?;
//! assert_eq!(result.records.len(), 2);
//! assert_eq!(result.records[0].get("a"), Some(&Value::Int(1)));
//! # Ok::<(), frameflow_core::Error>(())
//! ```
//!
//! [`ProgressiveSnapshot`]: decode::ProgressiveSnapshot
//! [`Record`]: record::Record
//! [`FrameSource`]: io::FrameSource
//! [`FrameReader`]: io::FrameReader

pub mod aggregate;
pub mod client;
pub mod decode;
pub mod error;
pub mod frame;
pub mod io;
pub mod prelude;
pub mod record;
pub mod schema;
pub mod value;

pub use aggregate::{materialize, materialize_async, materialize_with, QueryResult, ResultAggregator};
pub use client::QueryClient;
pub use decode::{
    decode_stream, DecodeConfig, DecodeOutcome, FrameProcessor, ProgressStream, ProgressiveSnapshot,
};
pub use error::{Error, ProtocolError, Result, UpstreamError};
pub use record::{project, project_view, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
