//! Engine-agnostic schema types.
//!
//! This module provides types that describe the columns of a result table
//! without depending on any particular wire encoding or output format.
//!
//! # Example
//!
//! ```rust
//! use frameflow_core::schema::{ColumnDescriptor, DataKind, TableSchema};
//!
//! let schema: TableSchema = vec![
//!     ColumnDescriptor::new("Timestamp", DataKind::DateTime),
//!     ColumnDescriptor::new("Count", DataKind::Long),
//! ]
//! .into();
//! assert_eq!(schema.len(), 2);
//! ```

mod column;
mod kind;

pub use column::ColumnDescriptor;
pub use kind::DataKind;

use std::sync::Arc;

/// A table's complete, immutable column list.
///
/// Shared between the table builder and every snapshot taken from it.
pub type TableSchema = Arc<[ColumnDescriptor]>;
