//! Scoped ownership of a frame reader.

use super::FrameReader;
use crate::error::Result;
use crate::frame::Frame;

/// Owns a reader and closes it exactly once.
///
/// `close()` may be called explicitly to observe release errors; otherwise
/// the reader is closed on drop, whatever path the decoder left by.
pub struct ScopedReader<R: FrameReader> {
    inner: R,
    closed: bool,
}

impl<R: FrameReader> ScopedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// Read the next frame, or `None` once closed.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.closed {
            return Ok(None);
        }
        self.inner.next_frame()
    }

    /// Close the reader. Subsequent calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn frames_read(&self) -> u64 {
        self.inner.frames_read()
    }
}

impl<R: FrameReader> Drop for ScopedReader<R> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close frame reader: {}", e);
        }
    }
}
