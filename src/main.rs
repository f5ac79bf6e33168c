//! frameflow CLI entry point.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use futures::SinkExt;
use tracing_subscriber::EnvFilter;

use frameflow::cli::{Args, OutputFormatter};
use frameflow_core::io::{frame_channel, FileFrameSource, FrameReader, FrameSource, FrameSender};
use frameflow_core::prelude::*;
use frameflow_core::{project, project_view, ProgressStream};

/// Frames buffered between the file reader and the decoder.
const CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .with_writer(io::stderr)
        .init();

    let source = FileFrameSource::open(&args.file)
        .with_context(|| format!("Failed to open frame file: {}", args.file.display()))?;

    let config = DecodeConfig {
        initial_row_capacity: args.row_capacity,
        fail_on_recorded_errors: args.strict,
    };
    let properties = match &args.request_id {
        Some(id) => ClientRequestProperties::with_request_id(id.clone()),
        None => ClientRequestProperties::new(),
    };
    let formatter = OutputFormatter::new(args.format);

    let outcome = if args.progressive {
        let request = QueryRequest::new(args.database.clone(), args.query.clone())
            .with_properties(properties);
        run_progressive(&source, &request, config, &formatter).await?
    } else {
        let client = QueryClient::new(source, args.database.clone()).with_config(config);
        let result = client
            .execute_query_with(&args.query, properties)
            .context("Query failed")?;
        let mut stdout = io::stdout().lock();
        formatter.write(&result.records, &mut stdout)?;
        stdout.flush()?;
        result.outcome
    };

    if outcome.completed_with_warnings() {
        eprintln!("warning: the service reported errors; results may be incomplete");
    }
    if args.stats {
        eprintln!("{}", outcome.stats);
    }
    Ok(())
}

/// Print snapshots as they are decoded.
///
/// The file is read on a blocking thread and handed to the async decoder
/// through a bounded frame channel.
async fn run_progressive(
    source: &FileFrameSource,
    request: &QueryRequest,
    config: DecodeConfig,
    formatter: &OutputFormatter,
) -> Result<DecodeOutcome> {
    let reader = source.execute(request).context("Failed to start query")?;
    let (tx, rx) = frame_channel(CHANNEL_CAPACITY);
    let producer = tokio::task::spawn_blocking(move || pump_frames(reader, tx));

    let mut stdout = io::stdout().lock();
    let mut decoder = ProgressStream::new(rx, config);
    let mut printed = false;

    while let Some(snapshot) = decoder.next_snapshot().await.context("Query failed")? {
        eprintln!(
            "-- {:.1}% ({:?}, {} rows)",
            snapshot.completion_percent,
            snapshot.replace,
            snapshot.table.len()
        );
        match snapshot.replace {
            ReplaceFlag::Append if printed => {
                let rows = project(snapshot.table.columns(), snapshot.table.new_rows());
                formatter.write_continuation(&rows, &mut stdout)?;
            }
            _ => formatter.write(&project_view(&snapshot.table), &mut stdout)?,
        }
        stdout.flush()?;
        printed = true;
    }

    producer.await.context("Frame reader task panicked")?;
    let stats = &decoder.outcome().stats;
    tracing::info!(
        rows = stats.primary_rows,
        snapshots = stats.snapshots,
        "Progressive decode finished"
    );
    Ok(decoder.outcome().clone())
}

/// Forward frames from a blocking reader into the channel.
///
/// Stops early when the decoder hangs up; read errors are forwarded.
fn pump_frames<R: FrameReader>(mut reader: R, mut tx: FrameSender) {
    loop {
        let item = match reader.next_frame() {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => break,
            Err(e) => Err(e),
        };
        let failed = item.is_err();
        if futures::executor::block_on(tx.send(item)).is_err() || failed {
            break;
        }
    }
    if let Err(e) = reader.close() {
        tracing::warn!("Failed to close frame reader: {}", e);
    }
}
