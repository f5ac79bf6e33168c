//! Frame readers over the JSON wire format.
//!
//! Two layouts are accepted:
//!
//! - a single JSON array of frame objects (the shape of a v2 query response
//!   body); the array is buffered before frames are handed out
//! - JSON Lines, one frame object per line; frames are decoded as they are read

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

use super::{FrameReader, FrameSource, QueryRequest};
use crate::error::Result;
use crate::frame::{Frame, WireDecoder};

/// Buffer size for the underlying reader (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

enum FrameIter<R: Read> {
    Lines(StreamDeserializer<'static, IoRead<BufReader<R>>, serde_json::Value>),
    Buffered(std::vec::IntoIter<serde_json::Value>),
    Closed,
}

/// Reader that decodes frames from any byte source.
pub struct JsonFrameReader<R: Read> {
    frames: FrameIter<R>,
    decoder: WireDecoder,
    frames_read: u64,
}

impl<R: Read> JsonFrameReader<R> {
    /// Create a reader, detecting the layout from the first non-blank byte.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, source);

        let frames = if starts_with_array(&mut reader)? {
            let all: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
            FrameIter::Buffered(all.into_iter())
        } else {
            let stream = serde_json::Deserializer::from_reader(reader).into_iter();
            FrameIter::Lines(stream)
        };

        Ok(Self {
            frames,
            decoder: WireDecoder::new(),
            frames_read: 0,
        })
    }

    fn next_json(&mut self) -> Result<Option<serde_json::Value>> {
        match &mut self.frames {
            FrameIter::Lines(stream) => Ok(stream.next().transpose()?),
            FrameIter::Buffered(iter) => Ok(iter.next()),
            FrameIter::Closed => Ok(None),
        }
    }
}

/// Skip leading whitespace and report whether the input is a JSON array.
fn starts_with_array<R: Read>(reader: &mut BufReader<R>) -> Result<bool> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(false);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let first = buf[pos];
                reader.consume(pos);
                return Ok(first == b'[');
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

impl<R: Read + Send> FrameReader for JsonFrameReader<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.next_json()? {
            Some(json) => {
                let frame = self.decoder.decode(json)?;
                self.frames_read += 1;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.frames = FrameIter::Closed;
        Ok(())
    }

    fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

/// Source backed by a recorded frame file.
///
/// Every request reopens the file, so the query text only shows up in logs.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    /// Use a frame file as a source. Fails if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::metadata(&path)?;
        Ok(Self { path })
    }

    /// Get the path to the file.
    pub fn file_path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileFrameSource {
    type Reader = JsonFrameReader<File>;

    fn execute(&self, request: &QueryRequest) -> Result<Self::Reader> {
        tracing::debug!(
            path = %self.path.display(),
            database = %request.database,
            client_request_id = %request.properties.client_request_id,
            "Opening frame file"
        );
        JsonFrameReader::new(File::open(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const LINES: &str = r#"
{"FrameType":"DataSetHeader","IsProgressive":true,"Version":"v2.0"}
{"FrameType":"TableProgress","TableProgress":12.5}
{"FrameType":"DataSetCompletion","HasErrors":false,"Cancelled":false}
"#;

    fn drain<R: Read + Send>(reader: &mut JsonFrameReader<R>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_json_lines() {
        let mut reader = JsonFrameReader::new(Cursor::new(LINES)).unwrap();
        let frames = drain(&mut reader);
        assert_eq!(frames.len(), 3);
        assert!(frames[2].is_terminal());
        assert_eq!(reader.frames_read(), 3);
    }

    #[test]
    fn test_json_array() {
        let body = r#"  [{"FrameType":"DataSetHeader","IsProgressive":false},
                        {"FrameType":"DataSetCompletion","HasErrors":false,"Cancelled":true}]"#;
        let mut reader = JsonFrameReader::new(Cursor::new(body)).unwrap();
        let frames = drain(&mut reader);
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let mut reader = JsonFrameReader::new(Cursor::new("   \n")).unwrap();
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_truncated_input_is_error() {
        let mut reader =
            JsonFrameReader::new(Cursor::new(r#"{"FrameType":"DataSetHeader"} {"FrameTy"#)).unwrap();
        assert!(reader.next_frame().unwrap().is_some());
        assert!(reader.next_frame().is_err());
    }

    #[test]
    fn test_close() {
        let mut reader = JsonFrameReader::new(Cursor::new(LINES)).unwrap();
        reader.next_frame().unwrap();
        reader.close().unwrap();
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LINES.as_bytes()).unwrap();
        file.flush().unwrap();

        let source = FileFrameSource::open(file.path()).unwrap();
        let request = QueryRequest::new("db", "T | take 1");
        let mut reader = source.execute(&request).unwrap();
        assert_eq!(drain(&mut reader).len(), 3);

        assert!(FileFrameSource::open("/nonexistent/frames.json").is_err());
    }
}
