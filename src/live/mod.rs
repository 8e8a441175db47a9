//! Live tailing of a single growing log file
//!
//! [`LogWatcher`] follows one file like `tail -f`: it remembers a byte offset,
//! wakes on filesystem notifications or a fallback poll timer, and hands every
//! newly appended record that passes the filters to an [`EntrySink`].
//!
//! ## Lifecycle
//!
//! `Initializing` → [`LogWatcher::open`] → `Watching` → cancellation → `Stopped`.
//! A notification failure or an unopenable file ends in `Failed`.

use crate::analyzer::DEFAULT_MAX_LINE_BYTES;
use crate::models::LogLevel;
use std::path::PathBuf;
use std::time::Duration;

pub mod sink;
pub mod watcher;

pub use sink::{ConsoleSink, EntrySink};
pub use watcher::LogWatcher;

/// Settings for one watch session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub path: PathBuf,
    pub pattern: Option<String>,
    pub min_level: Option<LogLevel>,
    /// Fallback poll period; reads happen at least this often.
    pub poll_interval: Duration,
    /// Start from the beginning instead of the current end of file.
    pub show_all: bool,
    /// Period for [`EntrySink::summary`] calls. `None` disables them.
    pub stats_interval: Option<Duration>,
    pub max_line_bytes: usize,
}

impl WatchConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pattern: None,
            min_level: None,
            poll_interval: Duration::from_secs(1),
            show_all: false,
            stats_interval: None,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Initializing,
    Watching,
    Stopped,
    Failed,
}
