//! In-memory frame source, for tests and for embedding pre-decoded streams.

use std::collections::VecDeque;

use async_trait::async_trait;

use super::{AsyncFrameReader, FrameReader, FrameSource, QueryRequest};
use crate::error::Result;
use crate::frame::Frame;

/// Source that replays the same frames for every request.
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    frames: Vec<Frame>,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl FrameSource for MemoryFrameSource {
    type Reader = MemoryFrameReader;

    fn execute(&self, request: &QueryRequest) -> Result<Self::Reader> {
        tracing::debug!(
            database = %request.database,
            client_request_id = %request.properties.client_request_id,
            frames = self.frames.len(),
            "Replaying in-memory frames"
        );
        Ok(MemoryFrameReader::new(self.frames.clone()))
    }
}

/// Reader over an owned list of frames.
#[derive(Debug, Default)]
pub struct MemoryFrameReader {
    frames: VecDeque<Frame>,
    frames_read: u64,
    closed: bool,
}

impl MemoryFrameReader {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            frames_read: 0,
            closed: false,
        }
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameReader for MemoryFrameReader {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.closed {
            return Ok(None);
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.frames.clear();
        Ok(())
    }

    fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

#[async_trait]
impl AsyncFrameReader for MemoryFrameReader {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        FrameReader::next_frame(self)
    }

    async fn close(&mut self) -> Result<()> {
        FrameReader::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{TableProgress, DatasetHeader};

    #[test]
    fn test_single_pass() {
        let mut reader = MemoryFrameReader::new(vec![
            Frame::DatasetHeader(DatasetHeader::default()),
            Frame::TableProgress(TableProgress { percent: 5.0 }),
        ]);
        assert!(FrameReader::next_frame(&mut reader).unwrap().is_some());
        assert!(FrameReader::next_frame(&mut reader).unwrap().is_some());
        assert!(FrameReader::next_frame(&mut reader).unwrap().is_none());
        assert_eq!(reader.frames_read(), 2);
    }

    #[test]
    fn test_close_stops_reads() {
        let mut reader = MemoryFrameReader::new(vec![Frame::DatasetHeader(DatasetHeader::default())]);
        FrameReader::close(&mut reader).unwrap();
        assert!(reader.is_closed());
        assert_eq!(reader.remaining(), 0);
        assert!(FrameReader::next_frame(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_source_replays() {
        let source = MemoryFrameSource::new(vec![Frame::DatasetHeader(DatasetHeader::default())]);
        let request = QueryRequest::new("db", "T | count");
        assert_eq!(source.execute(&request).unwrap().remaining(), 1);
        assert_eq!(source.execute(&request).unwrap().remaining(), 1);
    }
}
