//! Async decoding over an [`AsyncFrameReader`].

use futures::stream::{self, Stream};

use super::state::{DecodeState, Step};
use super::{DecodeConfig, DecodeOutcome, ProgressiveSnapshot};
use crate::error::{Error, ProtocolError, Result};
use crate::frame::DatasetCompletion;
use crate::io::AsyncFrameReader;

/// Decode an async frame stream into a stream of progressive snapshots.
///
/// Behaves like [`FrameProcessor`](super::FrameProcessor): the stream ends
/// after DataSetCompletion, or yields one error and ends. The reader is
/// closed exactly once, on either path or when the stream is dropped early.
pub fn decode_stream<R>(
    reader: R,
    config: DecodeConfig,
) -> impl Stream<Item = Result<ProgressiveSnapshot>>
where
    R: AsyncFrameReader,
{
    ProgressStream::new(reader, config).into_stream()
}

/// Pulls frames from an async reader through the shared state machine.
///
/// Use [`next_snapshot`](Self::next_snapshot) directly when the decode
/// outcome is needed afterwards, or [`into_stream`](Self::into_stream) to
/// get a `futures::Stream`. Dropping an unfinished decoder closes the
/// reader by driving `close()` to completion on the current thread.
pub struct ProgressStream<R: AsyncFrameReader> {
    reader: R,
    state: DecodeState,
    done: bool,
}

impl<R: AsyncFrameReader> ProgressStream<R> {
    pub fn new(reader: R, config: DecodeConfig) -> Self {
        Self {
            reader,
            state: DecodeState::new(config),
            done: false,
        }
    }

    /// Register a callback for streams that complete with recorded errors.
    pub fn on_recorded_error<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&DatasetCompletion) + Send + 'static,
    {
        self.state.set_recorded_error_hook(Box::new(hook));
        self
    }

    pub fn outcome(&self) -> &DecodeOutcome {
        self.state.outcome()
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Convert into a stream that ends after completion or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ProgressiveSnapshot>> {
        stream::unfold(Some(self), |state| async move {
            let mut decoder = state?;
            match decoder.next_snapshot().await {
                Ok(Some(snapshot)) => Some((Ok(snapshot), Some(decoder))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Next snapshot; `Ok(None)` once the dataset completed.
    pub async fn next_snapshot(&mut self) -> Result<Option<ProgressiveSnapshot>> {
        if self.done {
            return Ok(None);
        }

        loop {
            let frame = match self.reader.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Err(self.fail(ProtocolError::MissingCompletion.into()).await),
                Err(e) => return Err(self.fail(e).await),
            };

            match self.state.handle(frame) {
                Ok(Step::Continue) => continue,
                Ok(Step::Snapshot(snapshot)) => return Ok(Some(snapshot)),
                Ok(Step::Finished) => {
                    self.done = true;
                    self.state.release();
                    let trailing = match self.reader.next_frame().await {
                        Ok(Some(frame)) => Some(self.state.trailing(&frame)),
                        Ok(None) => None,
                        Err(e) => Some(e),
                    };
                    let closed = self.reader.close().await;
                    return match trailing {
                        Some(e) => Err(e),
                        None => closed.map(|_| None),
                    };
                }
                Err(e) => return Err(self.fail(e).await),
            }
        }
    }

    async fn fail(&mut self, error: Error) -> Error {
        self.done = true;
        self.state.release();
        if let Err(e) = self.reader.close().await {
            tracing::warn!("Failed to close frame reader after error: {}", e);
        }
        error
    }
}

impl<R: AsyncFrameReader> Drop for ProgressStream<R> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Err(e) = futures::executor::block_on(self.reader.close()) {
            tracing::warn!("Failed to close frame reader: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FragmentKind, Frame, TableFragment, TableHeader, TableKind};
    use crate::io::{frame_channel, MemoryFrameReader};
    use crate::schema::{ColumnDescriptor, DataKind};
    use crate::value::Value;
    use async_trait::async_trait;
    use futures::{SinkExt, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn frames(cancelled: bool) -> Vec<Frame> {
        vec![
            Frame::TableHeader(TableHeader {
                table_id: 5,
                table_name: "PrimaryResult".into(),
                table_kind: TableKind::PrimaryResult,
                columns: vec![ColumnDescriptor::new("n", DataKind::Long)].into(),
            }),
            Frame::TableFragment(TableFragment {
                table_id: 5,
                field_count: 1,
                kind: FragmentKind::Append,
                rows: vec![vec![Value::Int(1)], vec![Value::Int(2)]],
            }),
            Frame::DatasetCompletion(DatasetCompletion {
                cancelled,
                ..Default::default()
            }),
        ]
    }

    #[tokio::test]
    async fn test_stream_yields_snapshots() {
        let stream = decode_stream(MemoryFrameReader::new(frames(false)), DecodeConfig::default());
        let snapshots: Vec<_> = stream.collect().await;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].as_ref().unwrap().table.len(), 2);
    }

    #[tokio::test]
    async fn test_stream_cancel() {
        let stream = decode_stream(MemoryFrameReader::new(frames(true)), DecodeConfig::default());
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[1].as_ref().unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_stream_over_channel() {
        let (mut tx, reader) = frame_channel(8);
        let producer = tokio::spawn(async move {
            for frame in frames(false) {
                tx.send(Ok(frame)).await.unwrap();
            }
        });

        let mut decoder = ProgressStream::new(reader, DecodeConfig::default());
        let snapshot = decoder.next_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.table.rows()[1][0], Value::Int(2));
        assert!(decoder.next_snapshot().await.unwrap().is_none());
        assert!(decoder.outcome().completed);
        assert!(decoder.is_finished());
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_recorded_error_hook() {
        let mut frames = frames(false);
        frames.pop();
        frames.push(Frame::DatasetCompletion(DatasetCompletion {
            has_errors: true,
            ..Default::default()
        }));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut decoder = ProgressStream::new(MemoryFrameReader::new(frames), DecodeConfig::default())
            .on_recorded_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        while decoder.next_snapshot().await.unwrap().is_some() {}

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(decoder.outcome().completed_with_warnings());
    }

    struct TrackedReader {
        inner: MemoryFrameReader,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AsyncFrameReader for TrackedReader {
        async fn next_frame(&mut self) -> Result<Option<Frame>> {
            AsyncFrameReader::next_frame(&mut self.inner).await
        }

        async fn close(&mut self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn tracked(frames: Vec<Frame>) -> (TrackedReader, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let reader = TrackedReader {
            inner: MemoryFrameReader::new(frames),
            closes: Arc::clone(&closes),
        };
        (reader, closes)
    }

    #[tokio::test]
    async fn test_early_drop_closes() {
        let (reader, closes) = tracked(frames(false));
        let mut decoder = ProgressStream::new(reader, DecodeConfig::default());
        assert!(decoder.next_snapshot().await.unwrap().is_some());
        drop(decoder);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_stream_closes() {
        let (reader, closes) = tracked(frames(false));
        let mut stream = Box::pin(decode_stream(reader, DecodeConfig::default()));
        assert!(stream.next().await.unwrap().is_ok());
        drop(stream);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finished_decoder_closes_once() {
        let (reader, closes) = tracked(frames(true));
        let mut decoder = ProgressStream::new(reader, DecodeConfig::default());
        assert!(decoder.next_snapshot().await.unwrap().is_some());
        assert!(decoder.next_snapshot().await.unwrap_err().is_cancelled());
        drop(decoder);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_channel_closed_early() {
        let (tx, reader) = frame_channel(1);
        drop(tx);
        let mut decoder = ProgressStream::new(reader, DecodeConfig::default());
        let err = decoder.next_snapshot().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::MissingCompletion)));
    }
}
