//! Accumulator for the rows of one in-progress table.

use std::sync::Arc;

use crate::error::ProtocolError;
use crate::schema::TableSchema;
use crate::value::Row;

/// Row capacity reserved when a table starts.
pub const DEFAULT_ROW_CAPACITY: usize = 100;

/// Upper bound on the rows reserved up front; larger tables grow on demand.
pub const MAX_ROW_CAPACITY: usize = 1 << 20;

/// Owns one table's schema and rows.
///
/// Rows live behind an `Arc` so snapshots can share them without copying.
/// Mutating while a snapshot is still alive copies the rows once
/// (copy-on-write); consumers that drop snapshots promptly never pay for it.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    table_id: i32,
    columns: TableSchema,
    rows: Arc<Vec<Row>>,
    capacity: usize,
}

impl TableBuilder {
    pub fn new(table_id: i32, columns: TableSchema) -> Self {
        Self::with_capacity(table_id, columns, DEFAULT_ROW_CAPACITY)
    }

    pub fn with_capacity(table_id: i32, columns: TableSchema, capacity: usize) -> Self {
        let capacity = capacity.min(MAX_ROW_CAPACITY);
        Self {
            table_id,
            columns,
            rows: Arc::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Start over with a new table: new schema, no rows.
    pub fn reset(&mut self, table_id: i32, columns: TableSchema) {
        self.table_id = table_id;
        self.columns = columns;
        self.clear_rows();
    }

    /// Append rows, rejecting the whole batch if any row has the wrong width.
    ///
    /// Returns the index of the first appended row.
    pub fn append_rows(&mut self, rows: Vec<Row>) -> Result<usize, ProtocolError> {
        let expected = self.columns.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != expected) {
            return Err(ProtocolError::RowArity {
                table_id: self.table_id,
                expected,
                actual: bad.len(),
            });
        }

        let start = self.rows.len();
        if !rows.is_empty() {
            Arc::make_mut(&mut self.rows).extend(rows);
        }
        Ok(start)
    }

    /// Drop all rows, keeping the schema.
    pub fn clear_rows(&mut self) {
        match Arc::get_mut(&mut self.rows) {
            Some(rows) => rows.clear(),
            None => self.rows = Arc::new(Vec::with_capacity(self.capacity)),
        }
    }

    /// Read-only view of the current rows. Rows from `start` on are the
    /// ones the latest batch contributed.
    pub fn snapshot_view(&self, start: usize) -> TableView {
        TableView {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
            start: start.min(self.rows.len()),
        }
    }

    pub fn table_id(&self) -> i32 {
        self.table_id
    }

    pub fn columns(&self) -> &TableSchema {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Point-in-time, read-only view over a table's rows.
#[derive(Debug, Clone)]
pub struct TableView {
    columns: TableSchema,
    rows: Arc<Vec<Row>>,
    start: usize,
}

impl TableView {
    pub fn columns(&self) -> &TableSchema {
        &self.columns
    }

    /// All rows accumulated so far.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows added by the frame that produced this view.
    pub fn new_rows(&self) -> &[Row] {
        &self.rows[self.start..]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
