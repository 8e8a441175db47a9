//! CLI command implementations
//!
//! Each subcommand lives in its own module with its clap argument struct and
//! an async `run` entry point. Flags override values from the loaded
//! [`Config`](crate::config::Config).

pub mod analyze;
pub mod stats;
pub mod watch;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use stats::{run_stats, StatsArgs};
pub use watch::{run_watch, WatchArgs};

use crate::models::LogLevel;
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use std::path::{Path, PathBuf};

/// Exactly one of `--file` or `--dir`.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Single log file to analyze
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Directory to scan recursively for log files
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl Target {
    pub fn path(&self) -> &Path {
        match (&self.file, &self.dir) {
            (Some(file), _) => file.as_path(),
            (None, Some(dir)) => dir.as_path(),
            (None, None) => Path::new("."),
        }
    }
}

pub fn parse_level(text: &str) -> Result<LogLevel, String> {
    LogLevel::parse_user(text)
        .ok_or_else(|| format!("unknown log level '{text}' (expected DEBUG, INFO, WARN, ERROR or FATAL)"))
}

/// Accepts anything the timestamp parser does, or a bare `YYYY-MM-DD`.
fn parse_time_bound(text: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Some(ts) = TimestampParser::parse(text) {
        return Ok(ts);
    }
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid time '{text}' (use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)"))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid time '{text}'"))
}

pub fn parse_since(text: &str) -> Result<DateTime<Utc>, String> {
    parse_time_bound(text, false)
}

pub fn parse_until(text: &str) -> Result<DateTime<Utc>, String> {
    parse_time_bound(text, true)
}
