//! Frame source abstractions and implementations.
//!
//! This module defines the seam between the decoder and whatever executes
//! the query: a [`FrameSource`] accepts a [`QueryRequest`] and hands back a
//! [`FrameReader`], a forward-only cursor over the frames of that one
//! execution. Authentication and transport live behind the source.
//!
//! ## Design Principles
//!
//! - Generic traits with associated types (no Box<dyn> in the decode loop)
//! - Readers are single-pass; a frame is never re-read
//! - Release is explicit (`close`) and guaranteed by [`ScopedReader`]

mod channel;
mod json;
mod memory;
mod scoped;

pub use channel::{frame_channel, ChannelFrameReader, FrameSender};
pub use json::{FileFrameSource, JsonFrameReader};
pub use memory::{MemoryFrameReader, MemoryFrameSource};
pub use scoped::ScopedReader;

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::frame::Frame;

/// Prefix of generated client request ids.
pub const CLIENT_REQUEST_ID_PREFIX: &str = "frameflow";

/// Per-request metadata sent along with a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequestProperties {
    /// Correlation id for tracing the request through the service
    pub client_request_id: String,
    /// Free-form request options (e.g. `results_progressive_enabled`)
    pub options: BTreeMap<String, String>,
}

impl ClientRequestProperties {
    /// Properties with a freshly generated request id.
    pub fn new() -> Self {
        Self::with_request_id(format!("{CLIENT_REQUEST_ID_PREFIX}.{}", Uuid::new_v4()))
    }

    pub fn with_request_id(id: impl Into<String>) -> Self {
        Self {
            client_request_id: id.into(),
            options: BTreeMap::new(),
        }
    }

    /// Builder: set a request option.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

impl Default for ClientRequestProperties {
    fn default() -> Self {
        Self::new()
    }
}

/// A query to run against a named database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub database: String,
    pub query: String,
    pub properties: ClientRequestProperties,
}

impl QueryRequest {
    pub fn new(database: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            query: query.into(),
            properties: ClientRequestProperties::new(),
        }
    }

    pub fn with_properties(mut self, properties: ClientRequestProperties) -> Self {
        self.properties = properties;
        self
    }
}

/// Executes queries and hands out frame readers.
pub trait FrameSource {
    /// The reader type this source produces
    type Reader: FrameReader;

    /// Submit a query and return a reader over its frames.
    fn execute(&self, request: &QueryRequest) -> Result<Self::Reader>;
}

/// Sequential, single-pass reader of frames from one query execution.
pub trait FrameReader: Send {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` once the stream is exhausted or closed.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying resource. Further reads return `Ok(None)`.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Number of frames handed out so far.
    fn frames_read(&self) -> u64;
}

/// Asynchronous counterpart of [`FrameReader`] for network-backed sources.
///
/// Each `next_frame().await` is the only point where decoding suspends.
#[async_trait]
pub trait AsyncFrameReader: Send {
    async fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying stream.
    ///
    /// A decoder dropped mid-stream drives this future on the dropping
    /// thread, so it must not wait on the async runtime's I/O driver.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
