//! frameflow - Decode progressive query-result frame streams.
//!
//! The decoding itself lives in [`frameflow_core`]; this crate adds the
//! command-line front end.
//!
//! # Example
//!
//! ```no_run
//! use frameflow::cli::{OutputFormat, OutputFormatter};
//! use frameflow_core::io::FileFrameSource;
//! use frameflow_core::QueryClient;
//!
//! fn main() -> anyhow::Result<()> {
//!     let source = FileFrameSource::open("frames.json")?;
//!     let result = QueryClient::new(source, "Samples").execute_query("StormEvents | take 10")?;
//!     OutputFormatter::new(OutputFormat::Table).write(&result.records, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

pub mod cli;

pub use frameflow_core;
