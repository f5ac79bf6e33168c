//! Column descriptor for table schemas.

use compact_str::CompactString;

use super::DataKind;
use crate::error::ProtocolError;

/// A named, typed column of a result table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescriptor {
    /// Column name as sent by the service (not necessarily unique)
    pub name: CompactString,

    /// Data type
    pub kind: DataKind,
}

impl ColumnDescriptor {
    /// Create a new column.
    pub fn new(name: impl Into<CompactString>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a column from a wire type name such as `"long"`.
    pub fn from_wire(name: &str, type_name: &str) -> Result<Self, ProtocolError> {
        Ok(Self::new(name, DataKind::from_type_name(type_name)?))
    }
}

impl std::fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.kind)
    }
}
