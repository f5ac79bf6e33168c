//! Projection of decoded tables into generic records.
//!
//! A [`Record`] is one row keyed by column name, keeping column order.
//! Duplicate column names collapse into one entry holding the last value,
//! at the position where the name first appeared.

use compact_str::CompactString;

use crate::decode::TableView;
use crate::schema::ColumnDescriptor;
use crate::value::{Row, Value};

/// An ordered name → value mapping for one row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(CompactString, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set a field. An existing field keeps its position and gets the new
    /// value; the old value is returned.
    pub fn insert(&mut self, name: impl Into<CompactString>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// Convert to a JSON object, preserving field order.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<CompactString>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (CompactString, Value);
    type IntoIter = std::vec::IntoIter<(CompactString, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Project rows into records, one per row, values taken positionally.
pub fn project(columns: &[ColumnDescriptor], rows: &[Row]) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            let mut record = Record::with_capacity(columns.len());
            for (column, value) in columns.iter().zip(row) {
                record.insert(column.name.clone(), value.clone());
            }
            record
        })
        .collect()
}

/// Project every row of a table view.
pub fn project_view(view: &TableView) -> Vec<Record> {
    project(view.columns(), view.rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataKind;

    #[test]
    fn test_project_preserves_order() {
        let columns = vec![
            ColumnDescriptor::new("b", DataKind::Long),
            ColumnDescriptor::new("a", DataKind::String),
        ];
        let rows = vec![
            vec![Value::Int(1), Value::from("x")],
            vec![Value::Int(2), Value::Null],
        ];
        let records = project(&columns, &rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(records[1].get("b"), Some(&Value::Int(2)));
        assert!(records[1].get("a").unwrap().is_null());
    }

    #[test]
    fn test_duplicate_columns_last_write_wins() {
        let columns = vec![
            ColumnDescriptor::new("k", DataKind::Long),
            ColumnDescriptor::new("v", DataKind::Long),
            ColumnDescriptor::new("k", DataKind::Long),
        ];
        let rows = vec![vec![Value::Int(1), Value::Int(2), Value::Int(3)]];
        let record = &project(&columns, &rows)[0];
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("k"), Some(&Value::Int(3)));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["k", "v"]);
    }

    #[test]
    fn test_values_pass_through() {
        let columns = vec![ColumnDescriptor::new("d", DataKind::Dynamic)];
        let bag = serde_json::json!({"z": 1, "a": [true]});
        let rows = vec![vec![Value::Dynamic(bag.clone())]];
        assert_eq!(project(&columns, &rows)[0].get("d"), Some(&Value::Dynamic(bag)));
    }

    #[test]
    fn test_record_json_order() {
        let record: Record = vec![("z", Value::Int(1)), ("a", Value::from("s"))]
            .into_iter()
            .collect();
        assert_eq!(record.to_json().to_string(), r#"{"z":1,"a":"s"}"#);
        assert_eq!(record.iter().count(), 2);
    }
}
