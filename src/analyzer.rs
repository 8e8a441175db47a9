//! Log Analysis Engine
//!
//! This module runs the batch pipeline: it discovers files, streams each one
//! through a parser, applies the filter chain and feeds the shared
//! [`Aggregator`].
//!
//! ## Core Functionality
//!
//! ### Single file
//! - Reads line by line through a [`BoundedLineReader`], so memory per file is
//!   bounded by the batch size and the per-line cap, never by file length
//! - Parses each non-blank line with the detected or fixed parser; lines that
//!   fail to parse are skipped
//! - Filters before aggregation and flushes in batches of
//!   [`AnalysisConfig::batch_size`] records
//!
//! ### Directory
//! 1. **Discovery**: [`FileDiscovery`] lists every file with the configured extension
//! 2. **Scatter**: paths go into a pre-filled, closed queue shared by N blocking workers
//! 3. **Gather**: all workers are joined; per-file failures are collected, not fatal
//! 4. **Finish**: records are sorted by timestamp once and the wall-clock time is stored
//!
//! A directory run with failures still leaves every successful contribution in
//! the aggregator; the returned [`AnalyzerError::PartialFailure`] lists the
//! files that could not be processed.

use crate::aggregator::Aggregator;
use crate::error::{AnalyzerError, Result, WorkerFailure};
use crate::file_discovery::FileDiscovery;
use crate::filter::FilterChain;
use crate::line_reader::{BoundedLineReader, LineStatus};
use crate::models::{LogEntry, LogLevel};
use crate::parser::{detect_parser, parser_for, LogParser, ParserKind};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Read buffer per open file.
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Immutable settings for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub workers: usize,
    pub min_level: Option<LogLevel>,
    pub pattern: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub auto_detect: bool,
    /// Parser used for every line when `auto_detect` is off.
    pub parser_kind: ParserKind,
    pub batch_size: usize,
    pub max_line_bytes: usize,
    pub extension: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            min_level: None,
            pattern: None,
            start_time: None,
            end_time: None,
            auto_detect: true,
            parser_kind: ParserKind::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            extension: "log".to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn filter_chain(&self) -> FilterChain {
        FilterChain::from_criteria(
            self.min_level,
            self.pattern.as_deref(),
            self.start_time,
            self.end_time,
        )
    }

    fn effective_pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }
}

/// Counters for one processed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub lines_read: u64,
    pub entries_added: u64,
    pub lines_skipped: u64,
    pub bytes: u64,
}

/// Batch analyzer. Cheap to clone; clones share the same aggregator.
#[derive(Debug, Clone)]
pub struct LogAnalyzer {
    config: Arc<AnalysisConfig>,
    filters: Arc<FilterChain>,
    aggregator: Arc<Aggregator>,
}

impl LogAnalyzer {
    pub fn new(mut config: AnalysisConfig) -> Self {
        if config.workers == 0 {
            config.workers = DEFAULT_WORKERS;
        }
        if config.batch_size == 0 {
            config.batch_size = DEFAULT_BATCH_SIZE;
        }
        let filters = config.filter_chain();
        Self::with_aggregator(config, filters, Arc::new(Aggregator::new()))
    }

    /// Analyzer writing into an existing aggregator with a caller-built chain.
    pub fn with_aggregator(
        config: AnalysisConfig,
        filters: FilterChain,
        aggregator: Arc<Aggregator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            filters: Arc::new(filters),
            aggregator,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    fn parser_for_line(&self, line: &str) -> &'static dyn LogParser {
        if self.config.auto_detect {
            detect_parser(line)
        } else {
            parser_for(self.config.parser_kind)
        }
    }

    /// Stream one file into the aggregator. Blocking.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn analyze_file(&self, path: &Path) -> Result<FileSummary> {
        let file = File::open(path).map_err(|e| AnalyzerError::file_access(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| AnalyzerError::file_access(path, e))?
            .len();

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut summary = self
            .analyze_reader(file, &source)
            .map_err(|e| AnalyzerError::file_access(path, e))?;

        summary.bytes = size;
        self.aggregator.record_file(size);

        debug!(
            lines = summary.lines_read,
            entries = summary.entries_added,
            skipped = summary.lines_skipped,
            bytes = size,
            "File processed"
        );
        Ok(summary)
    }

    /// Stream any reader into the aggregator, labelling records with
    /// `source`. Blocking.
    ///
    /// On a read error the records accepted before it are still flushed, then
    /// the error is returned. Nothing is recorded as a processed file here.
    pub fn analyze_reader<R: Read>(&self, input: R, source: &str) -> io::Result<FileSummary> {
        let mut reader = BoundedLineReader::new(
            BufReader::with_capacity(READ_BUFFER_BYTES, input),
            self.config.max_line_bytes,
        );
        let batch_size = self.config.batch_size;
        let pattern = self.config.effective_pattern();
        let mut batch: Vec<LogEntry> = Vec::with_capacity(batch_size);
        let mut summary = FileSummary::default();

        loop {
            let status = match reader.read_line() {
                Ok(Some(status)) => status,
                Ok(None) => break,
                Err(e) => {
                    summary.entries_added += batch.len() as u64;
                    self.flush(&mut batch, pattern);
                    warn!(line = summary.lines_read + 1, error = %e, "Read failed, keeping records read so far");
                    return Err(e);
                }
            };

            summary.lines_read += 1;
            if let LineStatus::Oversized { length } = status {
                warn!(line = summary.lines_read, length, "Skipping oversized line");
                summary.lines_skipped += 1;
                continue;
            }

            let line = reader.line();
            if line.trim().is_empty() {
                continue;
            }

            let entry = match self.parser_for_line(&line).parse(&line, source) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(line = summary.lines_read, error = %e, "Skipping unparseable line");
                    summary.lines_skipped += 1;
                    continue;
                }
            };

            if !self.filters.matches(&entry) {
                continue;
            }

            batch.push(entry);
            if batch.len() >= batch_size {
                summary.entries_added += batch.len() as u64;
                self.flush(&mut batch, pattern);
            }
        }

        summary.entries_added += batch.len() as u64;
        self.flush(&mut batch, pattern);
        Ok(summary)
    }

    fn flush(&self, batch: &mut Vec<LogEntry>, pattern: Option<&str>) {
        if batch.is_empty() {
            return;
        }
        let full = std::mem::replace(batch, Vec::with_capacity(self.config.batch_size));
        match pattern {
            Some(p) => self.aggregator.add_matched_batch(full, p),
            None => self.aggregator.add_batch(full),
        }
    }

    /// Analyze every matching file below `dir` with the worker pool.
    ///
    /// On [`AnalyzerError::PartialFailure`] the aggregator still holds the
    /// sorted results of every file that succeeded.
    pub async fn analyze_directory(&self, dir: &Path) -> Result<()> {
        let discovery = FileDiscovery::new(self.config.extension.as_str());
        let files = discovery.find_files(dir)?;
        if files.is_empty() {
            return Err(AnalyzerError::NoFilesFound {
                dir: dir.to_path_buf(),
                extension: discovery.extension().to_string(),
            });
        }

        info!(dir = %dir.display(), files = files.len(), "Starting directory analysis");
        self.analyze_files(files).await
    }

    /// Run the worker pool over an explicit file list.
    ///
    /// Every file is attempted; failures are collected and returned together
    /// as [`AnalyzerError::PartialFailure`] after the successful files have
    /// been aggregated and sorted.
    pub async fn analyze_files(&self, files: Vec<PathBuf>) -> Result<()> {
        let start = Instant::now();
        let worker_count = self.config.workers.min(files.len()).max(1);
        debug!(files = files.len(), workers = worker_count, "Starting worker pool");

        // pre-filled and closed: workers stop once the queue drains
        let (tx, rx) = crossbeam_channel::bounded::<PathBuf>(files.len().max(1));
        for path in files {
            // capacity covers the file count, so this never blocks
            if tx.send(path).is_err() {
                break;
            }
        }
        drop(tx);

        let handles = (0..worker_count).map(|worker| {
            let analyzer = self.clone();
            let queue = rx.clone();
            tokio::task::spawn_blocking(move || {
                let mut failures = Vec::new();
                for path in queue.iter() {
                    if let Err(error) = analyzer.analyze_file(&path) {
                        warn!(worker, path = %path.display(), error = %error, "File failed");
                        failures.push(WorkerFailure {
                            worker,
                            path,
                            error,
                        });
                    }
                }
                failures
            })
        });
        let results = join_all(handles).await;
        drop(rx);

        let mut failures = Vec::new();
        for (worker, result) in results.into_iter().enumerate() {
            match result {
                Ok(worker_failures) => failures.extend(worker_failures),
                Err(e) => {
                    warn!(worker, error = %e, "Worker task failed");
                    failures.push(WorkerFailure {
                        worker,
                        path: PathBuf::new(),
                        error: AnalyzerError::WorkerPanicked { worker },
                    });
                }
            }
        }

        self.finish(start);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AnalyzerError::PartialFailure { failures })
        }
    }

    /// Analyze a single file or a whole directory.
    pub async fn analyze_path(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return self.analyze_directory(path).await;
        }

        let start = Instant::now();
        let analyzer = self.clone();
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || analyzer.analyze_file(&owned))
            .await
            .map_err(|_| AnalyzerError::WorkerPanicked { worker: 0 })??;
        self.finish(start);
        Ok(())
    }

    fn finish(&self, start: Instant) {
        self.aggregator.sort_by_timestamp();
        let elapsed = start.elapsed();
        self.aggregator.set_processing_time(elapsed);
        info!(
            entries = self.aggregator.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_analyze_file_skips_blank_and_bad_lines() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "app.log",
            concat!(
                "{\"timestamp\":\"2024-01-20T15:04:05Z\",\"level\":\"INFO\",\"message\":\"a\"}\n",
                "\n",
                "{\"level\":\"INFO\",\"message\":}\n",
                "[2024-01-20 15:04:06] ERROR: b\n",
            ),
        );

        let analyzer = LogAnalyzer::new(AnalysisConfig::default());
        let summary = analyzer.analyze_file(&path).unwrap();

        assert_eq!(summary.entries_added, 2);
        assert_eq!(summary.lines_skipped, 1);
        let stats = analyzer.aggregator().statistics();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.source_count("app.log"), 2);
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.bytes_processed, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_filters_apply_before_aggregation() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "app.log",
            "INFO: db up\nERROR: db down\nERROR: cache down\nDEBUG: db noise\n",
        );

        let analyzer = LogAnalyzer::new(AnalysisConfig {
            min_level: Some(LogLevel::Warn),
            pattern: Some("db".into()),
            ..AnalysisConfig::default()
        });
        analyzer.analyze_file(&path).unwrap();

        let entries = analyzer.aggregator().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "db down");
        assert_eq!(
            analyzer.aggregator().statistics().pattern_counts.get("db"),
            Some(&1)
        );
    }

    #[test]
    fn test_fixed_parser_without_auto_detect() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "app.log",
            "{\"level\":\"ERROR\",\"message\":\"json\"}\nplain INFO line\n",
        );

        let analyzer = LogAnalyzer::new(AnalysisConfig {
            auto_detect: false,
            parser_kind: ParserKind::Json,
            ..AnalysisConfig::default()
        });
        let summary = analyzer.analyze_file(&path).unwrap();

        assert_eq!(summary.entries_added, 1);
        assert_eq!(summary.lines_skipped, 1);
    }

    #[test]
    fn test_small_batches_flush_everything() {
        let dir = TempDir::new().unwrap();
        let content: String = (0..25).map(|i| format!("WARN: line {i}\n")).collect();
        let path = write(dir.path(), "app.log", &content);

        let analyzer = LogAnalyzer::new(AnalysisConfig {
            batch_size: 7,
            ..AnalysisConfig::default()
        });
        assert_eq!(analyzer.analyze_file(&path).unwrap().entries_added, 25);
        assert_eq!(analyzer.aggregator().len(), 25);
    }

    #[test]
    fn test_missing_file_is_file_access() {
        let analyzer = LogAnalyzer::new(AnalysisConfig::default());
        let err = analyzer.analyze_file(Path::new("/definitely/not/here.log")).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileAccess { .. }));
    }

    #[tokio::test]
    async fn test_empty_directory_is_no_files_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "INFO: x\n");

        let analyzer = LogAnalyzer::new(AnalysisConfig::default());
        let err = analyzer.analyze_directory(dir.path()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::NoFilesFound { .. }));
        assert!(analyzer.aggregator().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_path_single_file_sorts() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "app.log",
            "2024-01-20 15:00:02 INFO b\n2024-01-20 15:00:01 INFO a\n",
        );

        let analyzer = LogAnalyzer::new(AnalysisConfig::default());
        analyzer.analyze_path(&path).await.unwrap();

        let messages: Vec<String> = analyzer
            .aggregator()
            .entries()
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(messages, vec!["a", "b"]);
    }

    #[test]
    fn test_zero_workers_uses_default() {
        let analyzer = LogAnalyzer::new(AnalysisConfig {
            workers: 0,
            ..AnalysisConfig::default()
        });
        assert_eq!(analyzer.config().workers, DEFAULT_WORKERS);
    }

    /// Yields its bytes, then fails every further read.
    struct FailAfter {
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "device gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_read_error_keeps_pending_batch() {
        let analyzer = LogAnalyzer::new(AnalysisConfig {
            batch_size: 100,
            ..AnalysisConfig::default()
        });
        let input = FailAfter {
            data: io::Cursor::new(b"INFO: one\nWARN: two\nERROR: three\n".to_vec()),
        };

        let err = analyzer.analyze_reader(input, "dev.log").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);

        let stats = analyzer.aggregator().statistics();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.source_count("dev.log"), 3);
        assert_eq!(stats.files_processed, 0);
    }

    #[tokio::test]
    async fn test_failed_file_does_not_cancel_others() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "good.log", "2024-01-20 15:00:02 INFO b\n2024-01-20 15:00:01 INFO a\n");
        let other = write(dir.path(), "other.log", "2024-01-20 15:00:00 WARN c\n");
        let missing = dir.path().join("missing.log");

        let analyzer = LogAnalyzer::new(AnalysisConfig {
            workers: 2,
            ..AnalysisConfig::default()
        });
        let err = analyzer
            .analyze_files(vec![good, missing.clone(), other])
            .await
            .unwrap_err();

        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, missing);
        assert!(matches!(failures[0].error, AnalyzerError::FileAccess { .. }));

        let messages: Vec<String> = analyzer
            .aggregator()
            .entries()
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(messages, vec!["c", "a", "b"]);
        assert_eq!(analyzer.aggregator().statistics().files_processed, 2);
    }
}
