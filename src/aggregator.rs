//! Thread-safe record aggregation
//!
//! The [`Aggregator`] is the one piece of state shared by every analysis
//! worker. A single mutex guards both the record list and the
//! [`Statistics`], so a record and its counters are always updated together.
//! Workers are expected to hand over records in batches to keep lock traffic
//! low.

use crate::models::{LogEntry, Statistics};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Arc<LogEntry>>,
    stats: Statistics,
}

impl Inner {
    fn push(&mut self, entry: LogEntry) {
        self.stats.add_entry(&entry);
        self.entries.push(Arc::new(entry));
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: LogEntry) {
        self.inner.lock().push(entry);
    }

    /// Add a batch under one lock acquisition.
    pub fn add_batch(&self, entries: Vec<LogEntry>) {
        if entries.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.entries.reserve(entries.len());
        for entry in entries {
            inner.push(entry);
        }
    }

    /// Add a batch whose records all matched `pattern`, counting the
    /// occurrences in the same critical section.
    pub fn add_matched_batch(&self, entries: Vec<LogEntry>, pattern: &str) {
        if entries.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.stats.increment_pattern(pattern, entries.len() as u64);
        inner.entries.reserve(entries.len());
        for entry in entries {
            inner.push(entry);
        }
    }

    pub fn increment_pattern(&self, pattern: &str) {
        self.inner.lock().stats.increment_pattern(pattern, 1);
    }

    /// Record one fully processed file of `bytes` size.
    pub fn record_file(&self, bytes: u64) {
        self.inner.lock().stats.add_file(bytes);
    }

    pub fn set_processing_time(&self, duration: Duration) {
        self.inner.lock().stats.set_processing_time(duration);
    }

    /// Snapshot of the collected records. Records are shared, the list is not.
    pub fn entries(&self) -> Vec<Arc<LogEntry>> {
        self.inner.lock().entries.clone()
    }

    /// Snapshot of the statistics. Only meaningful as a final result once
    /// every writer has finished.
    pub fn statistics(&self) -> Statistics {
        self.inner.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable ascending sort by timestamp. Run once, after all writers are done.
    pub fn sort_by_timestamp(&self) {
        self.inner
            .lock()
            .entries
            .sort_by_key(|entry| entry.timestamp());
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<Arc<LogEntry>>
    where
        F: Fn(&LogEntry) -> bool,
    {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }

    /// First `n` records in current order.
    pub fn top_n(&self, n: usize) -> Vec<Arc<LogEntry>> {
        let inner = self.inner.lock();
        inner.entries.iter().take(n).cloned().collect()
    }

    /// Drop every record and start over with empty statistics.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries = Vec::new();
        inner.stats = Statistics::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::models::LogLevel;
    use chrono::{TimeZone, Utc};
    use std::thread;

    fn entry(level: LogLevel, message: &str, source: &str, secs: i64) -> LogEntry {
        let ts = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        LogEntry::new(ts, level, message, source, message)
    }

    #[test]
    fn test_increment_pattern_accumulates() {
        let agg = Aggregator::new();
        agg.increment_pattern("timeout");
        agg.increment_pattern("timeout");
        agg.add_matched_batch(
            vec![entry(LogLevel::Error, "timeout a", "x.log", 0)],
            "timeout",
        );
        agg.increment_pattern("refused");

        let stats = agg.statistics();
        assert_eq!(stats.pattern_counts.get("timeout"), Some(&3));
        assert_eq!(stats.pattern_counts.get("refused"), Some(&1));
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_add_and_snapshot() {
        let agg = Aggregator::new();
        agg.add(entry(LogLevel::Info, "a", "x.log", 0));
        agg.add_batch(vec![
            entry(LogLevel::Error, "b", "x.log", 1),
            entry(LogLevel::Warn, "c", "y.log", 2),
        ]);

        let snapshot = agg.entries();
        agg.add(entry(LogLevel::Info, "d", "x.log", 3));

        assert_eq!(snapshot.len(), 3);
        assert_eq!(agg.len(), 4);
        let stats = agg.statistics();
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.source_count("x.log"), 3);
    }

    #[test]
    fn test_concurrent_batches_lose_nothing() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 2_500;

        let agg = Arc::new(Aggregator::new());
        let handles: Vec<_> = (0..WRITERS)
            .map(|w| {
                let agg = Arc::clone(&agg);
                thread::spawn(move || {
                    let source = format!("w{w}.log");
                    let mut batch = Vec::new();
                    for i in 0..PER_WRITER {
                        let level = LogLevel::KNOWN[i % LogLevel::KNOWN.len()];
                        batch.push(entry(level, "m", &source, i as i64));
                        if batch.len() == 100 {
                            agg.add_batch(std::mem::take(&mut batch));
                        }
                    }
                    agg.add_batch(batch);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stats = agg.statistics();
        assert_eq!(stats.total_entries, (WRITERS * PER_WRITER) as u64);
        assert_eq!(agg.len(), WRITERS * PER_WRITER);
        for level in LogLevel::KNOWN {
            assert_eq!(stats.level_count(level), (WRITERS * PER_WRITER / 5) as u64);
        }
        for w in 0..WRITERS {
            assert_eq!(stats.source_count(&format!("w{w}.log")), PER_WRITER as u64);
        }
    }

    #[test]
    fn test_empty_batches_are_noops() {
        let agg = Aggregator::new();
        agg.add_batch(Vec::new());
        agg.add_matched_batch(Vec::new(), "x");
        assert!(agg.is_empty());
        assert_eq!(agg.statistics(), Statistics::new());
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let agg = Aggregator::new();
        agg.add_batch(vec![
            entry(LogLevel::Info, "late", "a", 30),
            entry(LogLevel::Info, "tie-1", "a", 10),
            entry(LogLevel::Info, "early", "a", 0),
            entry(LogLevel::Info, "tie-2", "a", 10),
        ]);

        agg.sort_by_timestamp();
        let once: Vec<String> = agg.entries().iter().map(|e| e.message().to_string()).collect();
        assert_eq!(once, vec!["early", "tie-1", "tie-2", "late"]);

        agg.sort_by_timestamp();
        let twice: Vec<String> = agg.entries().iter().map(|e| e.message().to_string()).collect();
        assert_eq!(once, twice);

        let entries = agg.entries();
        assert!(entries.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn test_filter_top_n_and_clear() {
        let agg = Aggregator::new();
        agg.add_matched_batch(
            vec![
                entry(LogLevel::Error, "db down", "a", 0),
                entry(LogLevel::Info, "db up", "b", 1),
            ],
            "db",
        );
        agg.record_file(128);

        let errors = agg.filter(|e| Filter::MinLevel(LogLevel::Error).matches(e));
        assert_eq!(errors.len(), 1);
        assert_eq!(agg.top_n(1)[0].message(), "db down");
        assert_eq!(agg.top_n(10).len(), 2);

        let stats = agg.statistics();
        assert_eq!(stats.pattern_counts.get("db"), Some(&2));
        assert_eq!((stats.files_processed, stats.bytes_processed), (1, 128));

        agg.clear();
        assert!(agg.is_empty());
        assert_eq!(agg.statistics().total_entries, 0);
    }
}
