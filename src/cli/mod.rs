//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Output formatting (table, CSV, JSON)

mod args;
mod output;

pub use args::{Args, DEFAULT_DATABASE};
pub use output::{OutputFormat, OutputFormatter};
