//! Command-line argument definitions.

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use frameflow_core::decode::MAX_ROW_CAPACITY;
use std::path::PathBuf;

use super::OutputFormat;

/// Default database name sent with each query.
pub const DEFAULT_DATABASE: &str = "NetDefaultDb";

/// Decode a progressive query-result frame stream into records.
#[derive(Parser, Debug)]
#[command(name = "frameflow")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Frame file to decode (JSON array or JSON Lines of frame objects)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Query text recorded with the request
    #[arg(short = 'e', long = "execute", value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Database the query runs against
    #[arg(short = 'd', long = "database", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Client request id (generated if not given)
    #[arg(long = "request-id", value_name = "ID")]
    pub request_id: Option<String>,

    /// Output format for stdout
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Print every snapshot as it arrives instead of the final result
    #[arg(short = 'p', long = "progressive")]
    pub progressive: bool,

    /// Fail when the service reports errors without an exception
    #[arg(long = "strict")]
    pub strict: bool,

    /// Rows reserved up front for the primary table
    #[arg(
        long = "row-capacity",
        default_value = "100",
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_ROW_CAPACITY as u64)
    )]
    pub row_capacity: usize,

    /// Print decode statistics to stderr
    #[arg(long = "stats")]
    pub stats: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Log filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["frameflow", "frames.json"]);
        assert_eq!(args.file, PathBuf::from("frames.json"));
        assert_eq!(args.database, DEFAULT_DATABASE);
        assert_eq!(args.format, OutputFormat::Table);
        assert_eq!(args.row_capacity, 100);
        assert!(!args.progressive && !args.strict);
        assert_eq!(args.log_filter(), "warn");
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "frameflow",
            "-vv",
            "--format",
            "json",
            "--progressive",
            "--strict",
            "-d",
            "Samples",
            "-e",
            "StormEvents | take 10",
            "frames.jsonl",
        ]);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.progressive && args.strict);
        assert_eq!(args.database, "Samples");
        assert_eq!(args.query, "StormEvents | take 10");
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_row_capacity_range() {
        let args = Args::parse_from(["frameflow", "--row-capacity", "5000", "f.json"]);
        assert_eq!(args.row_capacity, 5000);

        let huge = usize::MAX.to_string();
        let err = Args::try_parse_from(["frameflow", "--row-capacity", huge.as_str(), "f.json"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
