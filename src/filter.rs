//! Record predicates
//!
//! A [`Filter`] is one boolean test over a [`LogEntry`]; a [`FilterChain`]
//! ANDs an ordered list of them and stops at the first rejection. The
//! analyzer and the live watcher both build their inclusion rule from a chain,
//! so batch and watch mode agree on what "matches" means.

use crate::models::{LogEntry, LogLevel};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Severity at or above the threshold.
    MinLevel(LogLevel),
    /// Severity exactly equal.
    Level(LogLevel),
    /// Literal, case-sensitive substring of the message or raw line.
    Pattern(String),
    /// Inclusive time window; either bound may be open.
    TimeRange {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    /// Source label equality.
    Source(String),
}

impl Filter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            Filter::MinLevel(min) => entry.level() >= *min,
            Filter::Level(level) => entry.matches_level(*level),
            Filter::Pattern(pattern) => entry.matches_pattern(pattern),
            Filter::TimeRange { start, end } => {
                let ts = entry.timestamp();
                start.map_or(true, |s| ts >= s) && end.map_or(true, |e| ts <= e)
            }
            Filter::Source(source) => entry.source() == source,
        }
    }
}

/// Logical AND over an ordered list of filters. An empty chain accepts
/// everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Chain for the usual inclusion rule: optional minimum level, optional
    /// non-empty pattern, optional time window. Unset pieces add no filter.
    pub fn from_criteria(
        min_level: Option<LogLevel>,
        pattern: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        let mut chain = Self::new();
        if let Some(level) = min_level {
            chain.push(Filter::MinLevel(level));
        }
        if let Some(pattern) = pattern.filter(|p| !p.is_empty()) {
            chain.push(Filter::Pattern(pattern.to_string()));
        }
        if start.is_some() || end.is_some() {
            chain.push(Filter::TimeRange { start, end });
        }
        chain
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.filters.iter().all(|f| f.matches(entry))
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FromIterator<Filter> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
