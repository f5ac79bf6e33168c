//! Error types for frameflow-core.
//!
//! This module provides structured error types for all decoding operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`ProtocolError`] - Violations of the frame grammar or malformed frame data
//! - [`UpstreamError`] - An error embedded by the query engine in the stream
//!
//! Cancellation is its own variant so callers can tell it apart from failures.
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use std::fmt;

use thiserror::Error;

/// Main error type for frameflow-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The frame stream broke the protocol grammar
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// The query engine cancelled the query
    #[error("Query was cancelled by the service")]
    Cancelled,

    /// The query engine reported an error inside the stream
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// I/O error while pulling frames
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame payload was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the query was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// The embedded upstream error, if this is one.
    pub fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            Error::Upstream(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised when the frame stream does not follow the protocol.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// A frame kind the decoder does not know
    #[error("unexpected frame type: {frame_type}")]
    UnexpectedFrame { frame_type: String },

    /// A second primary result table appeared
    #[error("expected at most one primary result (second table id {table_id})")]
    MultiplePrimaryResults { table_id: i32 },

    /// A row or fragment whose width does not match the table schema
    #[error("table {table_id}: row has {actual} values, schema has {expected} columns")]
    RowArity {
        table_id: i32,
        expected: usize,
        actual: usize,
    },

    /// A cell that cannot be decoded as its column type
    #[error("column {column}: cannot decode {value} as {kind}")]
    InvalidValue {
        column: String,
        kind: &'static str,
        value: String,
    },

    /// A column type name not known to the decoder
    #[error("unknown column type: {type_name}")]
    UnknownType { type_name: String },

    /// The stream ended without a DataSetCompletion frame
    #[error("frame stream ended before DataSetCompletion")]
    MissingCompletion,

    /// A frame arrived after DataSetCompletion
    #[error("{frame_type} frame after DataSetCompletion")]
    TrailingFrame { frame_type: String },

    /// A frame object missing required parts
    #[error("malformed {frame} frame: {reason}")]
    Malformed {
        frame: &'static str,
        reason: String,
    },
}

/// An error embedded in the frame stream by the query engine.
///
/// Re-raised unchanged by the decoder so callers can inspect the service's
/// code and message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamError {
    /// Service error code (e.g. `LimitsExceeded`)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Optional extra detail supplied by the service
    pub details: Option<String>,
}

impl UpstreamError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upstream error {}: {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(Error::Cancelled.is_cancelled());
        let err: Error = ProtocolError::UnexpectedFrame {
            frame_type: "Bogus".into(),
        }
        .into();
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_upstream_preserved() {
        let upstream = UpstreamError::new("LimitsExceeded", "too many rows").with_details("E_RUNAWAY");
        let err: Error = upstream.clone().into();
        assert_eq!(err.upstream(), Some(&upstream));
        assert_eq!(
            err.to_string(),
            "Upstream error LimitsExceeded: too many rows (E_RUNAWAY)"
        );
    }

    #[test]
    fn test_protocol_messages() {
        let err = ProtocolError::MultiplePrimaryResults { table_id: 3 };
        assert!(err.to_string().contains("at most one primary result"));

        let err = ProtocolError::RowArity {
            table_id: 1,
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "table 1: row has 3 values, schema has 2 columns"
        );
    }
}
