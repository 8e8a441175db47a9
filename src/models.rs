//! Core Data Models
//!
//! This module defines the record types that flow through the analysis pipeline.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: a line read from a log file
//! 2. **Record**: [`LogEntry`] - produced by a [`crate::parser::LogParser`], immutable afterwards
//! 3. **Aggregation**: [`Statistics`] - running counters maintained by the
//!    [`crate::aggregator::Aggregator`] (batch mode) or the live watcher
//!
//! ## Core Types
//!
//! - [`LogLevel`] - ordered severity (`Debug < Info < Warn < Error < Fatal`) plus `Unknown`
//! - [`LogEntry`] - one normalized log line
//! - [`Statistics`] - totals, per-level/per-source/per-pattern counts, time bounds and
//!   processing counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// Severity of a log record.
///
/// Variants are declared in ascending severity so the derived `Ord` gives the
/// threshold comparisons. `Unknown` sorts last and is only assigned when the
/// source text names no recognizable level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl LogLevel {
    /// Levels that can be assigned to a parsed record, lowest first.
    pub const KNOWN: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Canonical mapping from level text. Expects upper-case input; `WARNING`
    /// is an alias for `WARN`. Anything else maps to `Unknown`.
    pub fn from_canonical(text: &str) -> Self {
        match text {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            "FATAL" => LogLevel::Fatal,
            _ => LogLevel::Unknown,
        }
    }

    /// Case-insensitive parse for user input (CLI flags, config).
    /// Returns `None` for unrecognized text.
    pub fn parse_user(text: &str) -> Option<Self> {
        match Self::from_canonical(&text.trim().to_ascii_uppercase()) {
            LogLevel::Unknown => None,
            level => Some(level),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width specifiers like {:<5} work
        f.pad(self.as_str())
    }
}

/// One parsed log line. Fields are private; a record never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: String,
    source: String,
    raw: String,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: impl Into<String>,
        source: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            source: source.into(),
            raw: raw.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Label of the originating file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The original line text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True if `pattern` is empty or occurs verbatim (case-sensitive) in the
    /// message or the raw line.
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        pattern.is_empty() || self.message.contains(pattern) || self.raw.contains(pattern)
    }

    /// Exact level equality, as opposed to threshold filtering.
    pub fn matches_level(&self, level: LogLevel) -> bool {
        self.level == level
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} (from: {})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message,
            self.source
        )
    }
}

/// Running aggregate over every record added so far.
///
/// `Statistics` itself is not synchronized; the owner (aggregator or watcher)
/// serializes mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub total_entries: u64,
    pub level_counts: BTreeMap<LogLevel, u64>,
    pub source_counts: HashMap<String, u64>,
    pub pattern_counts: HashMap<String, u64>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub processing_time: Duration,
    pub files_processed: u64,
    pub bytes_processed: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record and widen the observed time range.
    pub fn add_entry(&mut self, entry: &LogEntry) {
        self.total_entries += 1;
        *self.level_counts.entry(entry.level()).or_insert(0) += 1;

        // get_mut first so the common case doesn't allocate a key
        match self.source_counts.get_mut(entry.source()) {
            Some(count) => *count += 1,
            None => {
                self.source_counts.insert(entry.source().to_string(), 1);
            }
        }

        let ts = entry.timestamp();
        if self.first_timestamp.map_or(true, |first| ts <= first) {
            self.first_timestamp = Some(ts);
        }
        if self.last_timestamp.map_or(true, |last| ts > last) {
            self.last_timestamp = Some(ts);
        }
    }

    pub fn increment_pattern(&mut self, pattern: &str, by: u64) {
        if by == 0 {
            return;
        }
        *self.pattern_counts.entry(pattern.to_string()).or_insert(0) += by;
    }

    pub fn add_file(&mut self, bytes: u64) {
        self.files_processed += 1;
        self.bytes_processed += bytes;
    }

    pub fn set_processing_time(&mut self, duration: Duration) {
        self.processing_time = duration;
    }

    pub fn level_count(&self, level: LogLevel) -> u64 {
        self.level_counts.get(&level).copied().unwrap_or(0)
    }

    pub fn source_count(&self, source: &str) -> u64 {
        self.source_counts.get(source).copied().unwrap_or(0)
    }

    /// Span between the earliest and latest record, zero when fewer than two
    /// distinct timestamps were seen.
    pub fn time_span(&self) -> chrono::Duration {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => chrono::Duration::zero(),
        }
    }

    pub fn entries_per_second(&self) -> f64 {
        let secs = self.processing_time.as_secs_f64();
        if secs > 0.0 {
            self.total_entries as f64 / secs
        } else {
            0.0
        }
    }

    /// Patterns ordered by descending count, ties broken alphabetically.
    pub fn top_patterns(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut patterns: Vec<(&str, u64)> = self
            .pattern_counts
            .iter()
            .map(|(p, c)| (p.as_str(), *c))
            .collect();
        patterns.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        patterns.truncate(limit);
        patterns
    }
}
