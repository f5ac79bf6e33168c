//! Column data type definitions.

use crate::error::ProtocolError;

/// Scalar types a result column can carry.
///
/// Names follow the query engine's type system; `Dynamic` holds arbitrary
/// JSON (arrays, property bags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Boolean (true/false)
    Bool,

    /// Signed 32-bit integer
    Int,

    /// Signed 64-bit integer
    Long,

    /// 64-bit floating point
    Real,

    /// Decimal number, carried as its string form to avoid precision loss
    Decimal,

    /// UTF-8 string
    String,

    /// Timestamp (UTC)
    DateTime,

    /// Time interval
    TimeSpan,

    /// 128-bit GUID
    Guid,

    /// Arbitrary JSON value
    Dynamic,
}

impl DataKind {
    /// Parse a wire type name. Matching is case-insensitive and accepts the
    /// common aliases (`boolean`, `double`, `date`, `time`, `uuid`).
    pub fn from_type_name(name: &str) -> Result<Self, ProtocolError> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => DataKind::Bool,
            "int" | "int32" => DataKind::Int,
            "long" | "int64" => DataKind::Long,
            "real" | "double" => DataKind::Real,
            "decimal" => DataKind::Decimal,
            "string" => DataKind::String,
            "datetime" | "date" => DataKind::DateTime,
            "timespan" | "time" => DataKind::TimeSpan,
            "guid" | "uuid" | "uniqueid" => DataKind::Guid,
            "dynamic" | "object" => DataKind::Dynamic,
            _ => {
                return Err(ProtocolError::UnknownType {
                    type_name: name.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// Canonical type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataKind::Bool => "bool",
            DataKind::Int => "int",
            DataKind::Long => "long",
            DataKind::Real => "real",
            DataKind::Decimal => "decimal",
            DataKind::String => "string",
            DataKind::DateTime => "datetime",
            DataKind::TimeSpan => "timespan",
            DataKind::Guid => "guid",
            DataKind::Dynamic => "dynamic",
        }
    }

    /// Whether values of this kind are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataKind::Int | DataKind::Long | DataKind::Real | DataKind::Decimal
        )
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
