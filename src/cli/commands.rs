//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental extractor for Salesforce Commerce Cloud OCAPI
#[derive(Parser, Debug)]
#[command(name = "solidafy-sfcc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON, takes precedence over --config
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON); read at start, rewritten at the end of `read`
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire tokens and query the Data API
    Check,

    /// List available stream names
    Streams,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,
    },
}

impl Cli {
    /// Selected stream names of a `read` command
    pub fn selected_streams(list: Option<&str>) -> Vec<String> {
        list.unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_with_streams() {
        let cli = Cli::parse_from([
            "solidafy-sfcc",
            "--config",
            "config.json",
            "read",
            "--streams",
            "orders,order_notes",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("config.json")));
        let Commands::Read { streams } = cli.command else {
            panic!("expected read");
        };
        assert_eq!(
            Cli::selected_streams(streams.as_deref()),
            vec!["orders", "order_notes"]
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["solidafy-sfcc", "check", "--verbose", "--state", "s.json"]);
        assert!(cli.verbose);
        assert_eq!(cli.state, Some(PathBuf::from("s.json")));
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_selected_streams_empty() {
        assert!(Cli::selected_streams(None).is_empty());
        assert!(Cli::selected_streams(Some(" , ")).is_empty());
    }
}
