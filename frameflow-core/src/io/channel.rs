//! Channel-backed async frame reader.
//!
//! A transport task pushes frames into a [`FrameSender`] as they arrive off
//! the wire; the decoder awaits them through [`ChannelFrameReader`].

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;

use super::AsyncFrameReader;
use crate::error::Result;
use crate::frame::Frame;

/// Sending half handed to the transport.
pub type FrameSender = mpsc::Sender<Result<Frame>>;

/// Create a bounded frame channel.
///
/// The bound applies back-pressure to the transport when the decoder lags.
pub fn frame_channel(buffer: usize) -> (FrameSender, ChannelFrameReader) {
    let (tx, rx) = mpsc::channel(buffer);
    (
        tx,
        ChannelFrameReader {
            rx,
            frames_read: 0,
        },
    )
}

/// Receiving half of a frame channel.
pub struct ChannelFrameReader {
    rx: mpsc::Receiver<Result<Frame>>,
    frames_read: u64,
}

impl ChannelFrameReader {
    /// Number of frames received so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

#[async_trait]
impl AsyncFrameReader for ChannelFrameReader {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.rx.next().await {
            Some(Ok(frame)) => {
                self.frames_read += 1;
                Ok(Some(frame))
            }
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{DatasetHeader, TableProgress};
    use futures::SinkExt;

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (mut tx, mut reader) = frame_channel(4);
        tx.send(Ok(Frame::DatasetHeader(DatasetHeader::default())))
            .await
            .unwrap();
        tx.send(Ok(Frame::TableProgress(TableProgress { percent: 1.0 })))
            .await
            .unwrap();
        drop(tx);

        assert!(matches!(
            reader.next_frame().await.unwrap(),
            Some(Frame::DatasetHeader(_))
        ));
        assert!(matches!(
            reader.next_frame().await.unwrap(),
            Some(Frame::TableProgress(_))
        ));
        assert!(reader.next_frame().await.unwrap().is_none());
        assert_eq!(reader.frames_read(), 2);
    }

    #[tokio::test]
    async fn test_close_rejects_senders() {
        let (mut tx, mut reader) = frame_channel(1);
        reader.close().await.unwrap();
        assert!(tx
            .send(Ok(Frame::DatasetHeader(DatasetHeader::default())))
            .await
            .is_err());
    }
}
