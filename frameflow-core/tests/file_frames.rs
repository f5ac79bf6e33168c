//! Decoding frame files from `testdata/frames`.

use std::path::PathBuf;

use frameflow_core::frame::WireDecoder;
use frameflow_core::io::{frame_channel, FileFrameSource, FrameReader, JsonFrameReader};
use frameflow_core::prelude::*;
use frameflow_core::{decode_stream, materialize, materialize_async, ProtocolError};
use futures::{SinkExt, StreamExt};

fn frames_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("testdata")
        .join("frames")
        .join(name)
}

fn client(name: &str) -> QueryClient<FileFrameSource> {
    let source = FileFrameSource::open(frames_path(name)).expect("Failed to open frame file");
    QueryClient::new(source, "Samples")
}

#[test]
fn test_progressive_file() {
    let result = client("progressive.json").execute_query("StormEvents").unwrap();

    assert_eq!(result.len(), 3);
    let first = &result.records[0];
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["StartTime", "State", "Count"]);
    assert_eq!(first.get("State"), Some(&Value::from("ATLANTIC SOUTH")));
    assert_eq!(first.get("Count"), Some(&Value::Int(17)));
    assert!(matches!(first.get("StartTime"), Some(Value::DateTime(_))));
    assert!(result.records[2].get("Count").unwrap().is_null());

    let stats = &result.outcome.stats;
    assert_eq!(stats.snapshots, 2);
    assert_eq!(stats.tables_skipped, 2);
    assert_eq!(stats.total_frames(), 12);
}

#[test]
fn test_progressive_snapshots_carry_progress() {
    let processor = client("progressive.json").stream_query("StormEvents").unwrap();
    let snapshots: Vec<_> = processor.collect::<Result<_>>().unwrap();

    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].completion_percent, 0.0);
    assert_eq!(snapshots[1].completion_percent, 50.0);
    assert_eq!(snapshots[1].table.len(), 3);
    assert_eq!(snapshots[1].table.new_rows().len(), 1);
    assert_eq!(snapshots[1].replace, ReplaceFlag::Append);
}

#[test]
fn test_replace_file() {
    let result = client("replace.jsonl").execute_query("T").unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].get("x"), Some(&Value::from("q")));
}

#[test]
fn test_single_shot_file() {
    let result = client("single_shot.json").execute_query("T").unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.records[1].get("ok"), Some(&Value::Bool(false)));
    assert_eq!(result.outcome.stats.tables_skipped, 1);
}

#[test]
fn test_cancelled_file() {
    let err = client("cancelled.jsonl").execute_query("T").unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn test_exception_file() {
    let err = client("exception.jsonl").execute_query("T").unwrap_err();
    let upstream = err.upstream().expect("Expected upstream error");
    assert_eq!(upstream.code, "LimitsExceeded");
    assert!(upstream.details.as_deref().unwrap_or("").contains("record count limit"));
}

#[test]
fn test_recorded_errors_file() {
    let result = client("recorded_errors.jsonl").execute_query("T").unwrap();
    assert!(result.completed_with_warnings());
    assert_eq!(result.records[0].get("x"), Some(&Value::Int(7)));
}

#[test]
fn test_truncated_file() {
    let err = client("truncated.jsonl").execute_query("T").unwrap_err();
    assert!(matches!(err, Error::Protocol(ProtocolError::MissingCompletion)));
}

#[test]
fn test_missing_file() {
    assert!(FileFrameSource::open(frames_path("does-not-exist.json")).is_err());
}

#[tokio::test]
async fn test_async_pipeline_matches_file() {
    let file = std::fs::File::open(frames_path("progressive.json")).unwrap();
    let mut reader = JsonFrameReader::new(file).unwrap();
    let mut frames = Vec::new();
    while let Some(frame) = reader.next_frame().unwrap() {
        frames.push(frame);
    }

    let (mut tx, rx) = frame_channel(4);
    let producer = tokio::spawn(async move {
        for frame in frames {
            tx.send(Ok(frame)).await.unwrap();
        }
    });

    let result = materialize_async(rx, DecodeConfig::default()).await.unwrap();
    producer.await.unwrap();

    let expected = client("progressive.json").execute_query("T").unwrap();
    assert_eq!(result.records, expected.records);
}

#[tokio::test]
async fn test_decode_stream_from_wire_values() {
    let lines = std::fs::read_to_string(frames_path("replace.jsonl")).unwrap();
    let mut decoder = WireDecoder::new();
    let frames: Vec<Frame> = lines
        .lines()
        .map(|line| decoder.decode(serde_json::from_str(line).unwrap()).unwrap())
        .collect();

    let snapshots: Vec<_> = decode_stream(MemoryFrameReader::new(frames), DecodeConfig::default())
        .collect()
        .await;
    assert_eq!(snapshots.len(), 2);
    let last = snapshots[1].as_ref().unwrap();
    assert_eq!(last.replace, ReplaceFlag::Replace);
    assert_eq!(last.table.len(), 1);
}

#[test]
fn test_bad_cell_in_metadata_table_is_drained() {
    let stream = r#"
{"FrameType":"DataSetHeader","IsProgressive":true,"Version":"v2.0"}
{"FrameType":"TableHeader","TableId":0,"TableKind":"QueryTraceLog","TableName":"Trace","Columns":[{"ColumnName":"n","ColumnType":"long"},{"ColumnName":"w","ColumnType":"weird"}]}
{"FrameType":"TableFragment","TableId":0,"TableFragmentType":"DataAppend","Rows":[["not-a-number","x"]]}
{"FrameType":"TableCompletion","TableId":0,"RowCount":1}
{"FrameType":"DataTable","TableId":1,"TableKind":"PrimaryResult","TableName":"PrimaryResult","Columns":[{"ColumnName":"n","ColumnType":"long"}],"Rows":[[7]]}
{"FrameType":"DataSetCompletion","HasErrors":false,"Cancelled":false}
"#;
    let reader = JsonFrameReader::new(stream.as_bytes()).unwrap();
    let result = materialize(reader).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].get("n"), Some(&Value::Int(7)));
    assert_eq!(result.outcome.stats.rows_skipped, 1);
}
