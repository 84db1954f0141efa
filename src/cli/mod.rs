//! CLI module
//!
//! Command-line interface for running the extractor.
//!
//! # Commands
//!
//! - `check` - Acquire tokens and query the Data API
//! - `streams` - List stream names
//! - `read` - Extract data from streams

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
