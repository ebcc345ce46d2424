//! Command-line interface definition using clap.
//!
//! [`Args`] maps onto [`IngestConfig`] so the binary stays a thin shell over
//! the [`ingest`](crate::ingest) driver.
//!
//! ```rust
//! use clap::Parser;
//! use chatsplice::cli::Args;
//!
//! let args = Args::parse_from([
//!     "chatsplice",
//!     "--input-dir", "kb/00-chats-input-raw/phone",
//!     "--output-dir", "kb/01-chats-organized",
//!     "--knowledge-base-dir", "kb",
//!     "--fallback-year", "2024",
//! ]);
//! assert_eq!(args.ingest_config().fallback_year, Some(2024));
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_WINDOW_SIZE, IngestConfig, MergeConfig};

/// Reconcile overlapping chat-log exports into canonical
/// per-conversation monthly archives.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatsplice")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatsplice --input-dir kb/00-chats-input-raw/phone --output-dir kb/01-chats-organized --knowledge-base-dir kb
    chatsplice --input-dir kb/00-chats-input-raw --output-dir kb/01-chats-organized --knowledge-base-dir kb --fallback-year 2024
    chatsplice --input-dir kb/00-chats-input-raw --output-dir kb/01-chats-organized --knowledge-base-dir kb --dry-run")]
pub struct Args {
    /// Directory of raw exports, inside {knowledge-base-dir}/00-chats-input-raw
    #[arg(long, alias = "input_dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Archive root: archives are written to {DIR}/{conversation}/{YYYY-MM}.md
    #[arg(long, alias = "output_dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Knowledge base root (raw inputs, relocated inputs, task audit runs)
    #[arg(long, alias = "knowledge_base_dir", value_name = "DIR")]
    pub knowledge_base_dir: PathBuf,

    /// Year for MM-DD time markers that precede any fully dated marker
    #[arg(long, alias = "fallback_year", value_name = "YEAR")]
    pub fallback_year: Option<i32>,

    /// Number of hashable lines matched at each end of a block
    #[arg(long, value_name = "N", default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Plan merges and write audit files, but leave archives and inputs untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Builds the ingestion configuration.
    pub fn ingest_config(&self) -> IngestConfig {
        let config = IngestConfig::new()
            .with_dry_run(self.dry_run)
            .with_merge(MergeConfig::new().with_window_size(self.window_size));
        match self.fallback_year {
            Some(year) => config.with_fallback_year(year),
            None => config,
        }
    }

    /// Returns the log level spec for the logger.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "chatsplice",
            "--input-dir",
            "kb/00-chats-input-raw",
            "--output-dir",
            "org",
            "--knowledge-base-dir",
            "kb",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.window_size, 5);
        assert!(!args.dry_run);
        assert_eq!(args.log_level(), "info");

        let config = args.ingest_config();
        assert_eq!(config.fallback_year, None);
        assert_eq!(config.merge.window_size, 5);
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&["--fallback-year", "2023", "--window-size", "3", "--dry-run", "-v"]);
        let config = args.ingest_config();
        assert_eq!(config.fallback_year, Some(2023));
        assert_eq!(config.merge.window_size, 3);
        assert!(config.dry_run);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn test_underscore_aliases() {
        let args = Args::try_parse_from([
            "chatsplice",
            "--input_dir",
            "in",
            "--output_dir",
            "out",
            "--knowledge_base_dir",
            "kb",
            "--fallback_year",
            "2026",
        ])
        .unwrap();
        assert_eq!(args.input_dir, PathBuf::from("in"));
        assert_eq!(args.fallback_year, Some(2026));
    }

    #[test]
    fn test_required_arguments() {
        assert!(Args::try_parse_from(["chatsplice", "--input-dir", "in"]).is_err());
    }

    #[test]
    fn test_zero_window_is_raised() {
        let args = parse(&["--window-size", "0"]);
        assert_eq!(args.ingest_config().merge.window_size, 1);
    }
}
