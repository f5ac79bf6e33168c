//! JSON wire format for frames.
//!
//! Each frame is a JSON object tagged by `FrameType`:
//!
//! ```json
//! {"FrameType":"TableHeader","TableId":1,"TableKind":"PrimaryResult",
//!  "TableName":"PrimaryResult","Columns":[{"ColumnName":"x","ColumnType":"string"}]}
//! {"FrameType":"TableFragment","TableId":1,"TableFragmentType":"DataAppend","Rows":[["p"]]}
//! ```
//!
//! Fragments do not repeat column types, so the decoder remembers the schema
//! of each primary table header and types its fragment cells by it. Cells of
//! every other table are decoded untyped: those tables are drained, never
//! output, and a bad cell in them must not abort the query.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::{
    DataTable, DatasetCompletion, DatasetHeader, FragmentKind, Frame, TableCompletion,
    TableFragment, TableHeader, TableKind, TableProgress,
};
use crate::error::{Error, ProtocolError, UpstreamError};
use crate::schema::{ColumnDescriptor, DataKind, TableSchema};
use crate::value::{Row, Value};

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawColumn {
    column_name: String,
    column_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDatasetHeader {
    #[serde(default)]
    is_progressive: bool,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTableHeader {
    table_id: i32,
    #[serde(default)]
    table_name: String,
    table_kind: String,
    columns: Vec<RawColumn>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTableFragment {
    table_id: i32,
    #[serde(default)]
    field_count: Option<usize>,
    table_fragment_type: String,
    rows: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTableCompletion {
    table_id: i32,
    #[serde(default)]
    row_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTableProgress {
    table_progress: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDataTable {
    #[serde(default)]
    table_id: i32,
    #[serde(default)]
    table_name: String,
    table_kind: String,
    columns: Vec<RawColumn>,
    rows: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDatasetCompletion {
    #[serde(default)]
    has_errors: bool,
    #[serde(default)]
    cancelled: bool,
    #[serde(default)]
    one_api_errors: Option<Vec<serde_json::Value>>,
}

/// Stateful decoder from JSON frame objects to [`Frame`]s.
///
/// One decoder must be used per frame stream: it tracks table schemas by id.
#[derive(Debug, Default)]
pub struct WireDecoder {
    schemas: HashMap<i32, TableSchema>,
}

impl WireDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one JSON frame object.
    pub fn decode(&mut self, json: serde_json::Value) -> Result<Frame, Error> {
        let frame_type = json
            .get("FrameType")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ProtocolError::Malformed {
                frame: "unknown",
                reason: "missing FrameType".into(),
            })?
            .to_string();

        let frame = match frame_type.as_str() {
            "DataSetHeader" => {
                let raw: RawDatasetHeader = serde_json::from_value(json)?;
                Frame::DatasetHeader(DatasetHeader {
                    is_progressive: raw.is_progressive,
                    version: raw.version,
                })
            }
            "TableHeader" => {
                let raw: RawTableHeader = serde_json::from_value(json)?;
                let table_kind = TableKind::from_name(&raw.table_kind);
                let columns = decode_columns(&raw.columns, table_kind)?;
                if table_kind.is_primary() {
                    self.schemas.insert(raw.table_id, columns.clone());
                } else {
                    self.schemas.remove(&raw.table_id);
                }
                Frame::TableHeader(TableHeader {
                    table_id: raw.table_id,
                    table_name: raw.table_name,
                    table_kind,
                    columns,
                })
            }
            "TableFragment" => {
                let raw: RawTableFragment = serde_json::from_value(json)?;
                let kind = FragmentKind::from_name(&raw.table_fragment_type).ok_or_else(|| {
                    ProtocolError::Malformed {
                        frame: "TableFragment",
                        reason: format!("unknown fragment type {}", raw.table_fragment_type),
                    }
                })?;
                let schema = self.schemas.get(&raw.table_id);
                let rows = decode_rows(schema, raw.rows)?;
                let field_count = raw
                    .field_count
                    .or_else(|| rows.first().map(Vec::len))
                    .or_else(|| schema.map(|s| s.len()))
                    .unwrap_or(0);
                Frame::TableFragment(TableFragment {
                    table_id: raw.table_id,
                    field_count,
                    kind,
                    rows,
                })
            }
            "TableCompletion" => {
                let raw: RawTableCompletion = serde_json::from_value(json)?;
                self.schemas.remove(&raw.table_id);
                Frame::TableCompletion(TableCompletion {
                    table_id: raw.table_id,
                    row_count: raw.row_count,
                })
            }
            "TableProgress" => {
                let raw: RawTableProgress = serde_json::from_value(json)?;
                Frame::TableProgress(TableProgress {
                    percent: raw.table_progress,
                })
            }
            "DataTable" => {
                let raw: RawDataTable = serde_json::from_value(json)?;
                let table_kind = TableKind::from_name(&raw.table_kind);
                let columns = decode_columns(&raw.columns, table_kind)?;
                let schema = table_kind.is_primary().then_some(&columns);
                let rows = decode_rows(schema, raw.rows)?;
                Frame::DataTable(DataTable {
                    table_id: raw.table_id,
                    table_name: raw.table_name,
                    table_kind,
                    columns,
                    rows,
                })
            }
            "DataSetCompletion" => {
                let raw: RawDatasetCompletion = serde_json::from_value(json)?;
                let exception = raw
                    .one_api_errors
                    .as_deref()
                    .and_then(|errors| errors.first())
                    .map(decode_one_api_error);
                Frame::DatasetCompletion(DatasetCompletion {
                    has_errors: raw.has_errors,
                    cancelled: raw.cancelled,
                    exception,
                })
            }
            _ => Frame::Unknown { frame_type },
        };
        Ok(frame)
    }
}

/// Unknown type names are an error for the primary table only; other tables
/// fall back to `dynamic`.
fn decode_columns(columns: &[RawColumn], kind: TableKind) -> Result<TableSchema, ProtocolError> {
    let columns = columns
        .iter()
        .map(|c| match ColumnDescriptor::from_wire(&c.column_name, &c.column_type) {
            Err(_) if !kind.is_primary() => Ok(ColumnDescriptor::new(
                c.column_name.as_str(),
                DataKind::Dynamic,
            )),
            other => other,
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::from(columns))
}

/// Decode rows, typing cells by the schema when one is known.
///
/// Width mismatches are left for the table builder to reject; here extra
/// cells are decoded untyped. An object in place of a row is an in-band
/// error report and aborts decoding.
fn decode_rows(
    schema: Option<&TableSchema>,
    rows: Vec<serde_json::Value>,
) -> Result<Vec<Row>, Error> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if row.is_object() {
            return Err(Error::Upstream(decode_in_band_error(&row)));
        }
        let cells = match row {
            serde_json::Value::Array(cells) => cells,
            other => {
                return Err(ProtocolError::Malformed {
                    frame: "TableFragment",
                    reason: format!("row is not an array: {other}"),
                }
                .into())
            }
        };

        let decoded = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match schema.and_then(|s| s.get(i)) {
                Some(column) => Value::decode(column.kind, &column.name, cell),
                None => Ok(Value::from_json(cell)),
            })
            .collect::<Result<Row, _>>()?;
        out.push(decoded);
    }
    Ok(out)
}

fn decode_in_band_error(row: &serde_json::Value) -> UpstreamError {
    row.get("OneApiErrors")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
        .map(decode_one_api_error)
        .unwrap_or_else(|| UpstreamError::new("InBandError", row.to_string()))
}

fn decode_one_api_error(value: &serde_json::Value) -> UpstreamError {
    let error = value.get("error").unwrap_or(value);
    let field = |name: &str| error.get(name).and_then(|v| v.as_str()).map(str::to_string);

    let mut upstream = UpstreamError::new(
        field("code").unwrap_or_else(|| "Unknown".into()),
        field("message").unwrap_or_default(),
    );
    if let Some(details) = field("@message") {
        upstream = upstream.with_details(details);
    }
    upstream
}
