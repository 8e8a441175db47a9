//! Offset-tracking file tailer
//!
//! The watcher owns the open file handle and a byte offset. Every wake-up,
//! whether from a filesystem notification or the poll timer, runs the same
//! [`LogWatcher::read_new_lines`], which is idempotent as long as the file
//! only grows or gets truncated.

use crate::error::{AnalyzerError, Result};
use crate::filter::FilterChain;
use crate::line_reader::{BoundedLineReader, LineStatus};
use crate::live::{EntrySink, WatchConfig, WatchState};
use crate::models::Statistics;
use crate::parser::detect_parser;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::fs::{self, File};
use std::future::Future;
use std::io::{BufReader, Read, Seek, SeekFrom};
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub struct LogWatcher<S: EntrySink> {
    config: WatchConfig,
    filters: FilterChain,
    source: String,
    sink: S,
    file: Option<File>,
    offset: u64,
    state: WatchState,
    stats: Statistics,
}

impl<S: EntrySink> LogWatcher<S> {
    pub fn new(config: WatchConfig, sink: S) -> Self {
        let filters = FilterChain::from_criteria(config.min_level, config.pattern.as_deref(), None, None);
        let source = config.path.display().to_string();
        Self {
            config,
            filters,
            source,
            sink,
            file: None,
            offset: 0,
            state: WatchState::Initializing,
            stats: Statistics::new(),
        }
    }

    /// Open the file and pick the starting offset: end of file, or 0 with
    /// `show_all`.
    pub fn open(&mut self) -> Result<()> {
        let path = &self.config.path;
        let opened = File::open(path).and_then(|f| f.metadata().map(|m| (f, m.len())));
        let (file, size) = match opened {
            Ok(pair) => pair,
            Err(e) => {
                self.state = WatchState::Failed;
                return Err(AnalyzerError::file_access(path, e));
            }
        };

        self.offset = if self.config.show_all { 0 } else { size };
        self.file = Some(file);
        self.state = WatchState::Watching;
        info!(path = %path.display(), offset = self.offset, "Watching file");
        Ok(())
    }

    /// Read everything appended since the last call and emit the records
    /// that pass the filters. Returns the number emitted.
    ///
    /// A different file at the path (rename-and-recreate rotation) or a file
    /// smaller than the stored offset (truncation) restarts reading at byte 0
    /// of a freshly opened handle.
    pub fn read_new_lines(&mut self) -> Result<usize> {
        let path = &self.config.path;
        let current = fs::metadata(path).map_err(|e| AnalyzerError::file_access(path, e))?;
        let size = current.len();

        let mut reopen = match self.file.as_ref().map(File::metadata) {
            None => true,
            Some(Ok(open)) if same_file(&open, &current) => false,
            Some(_) => {
                info!(path = %path.display(), old_offset = self.offset, size, "File rotated, reading new file from start");
                self.offset = 0;
                true
            }
        };
        if size < self.offset {
            info!(path = %path.display(), old_offset = self.offset, size, "File truncated, reading from start");
            self.offset = 0;
            reopen = true;
        }
        if reopen {
            self.file = Some(File::open(path).map_err(|e| AnalyzerError::file_access(path, e))?);
        }
        if size == self.offset {
            return Ok(0);
        }

        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        file.seek(SeekFrom::Start(self.offset))
            .map_err(|e| AnalyzerError::file_access(path, e))?;

        // only the bytes that existed at stat time; later appends wait for the next wake-up
        let mut reader = BoundedLineReader::new(
            BufReader::new(file.by_ref().take(size - self.offset)),
            self.config.max_line_bytes,
        );

        let mut emitted = 0;
        while let Some(status) = reader
            .read_line()
            .map_err(|e| AnalyzerError::file_access(path, e))?
        {
            if let LineStatus::Oversized { length } = status {
                warn!(length, "Skipping oversized line");
                continue;
            }
            let line = reader.line();
            if line.trim().is_empty() {
                continue;
            }

            let entry = match detect_parser(&line).parse(&line, &self.source) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unparseable line");
                    continue;
                }
            };
            if !self.filters.matches(&entry) {
                continue;
            }

            self.stats.add_entry(&entry);
            self.sink.emit(&entry);
            emitted += 1;
        }

        self.offset = size;
        Ok(emitted)
    }

    /// Run until `shutdown` resolves.
    ///
    /// Reads happen on change notifications and on every poll tick. Failure of
    /// the notification backend ends the session with an error; read errors
    /// are logged and retried on the next wake-up.
    pub async fn watch<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.state != WatchState::Watching {
            self.open()?;
        }

        let (tx, mut events) = mpsc::unbounded_channel();
        let mut notifier = match notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        }) {
            Ok(w) => w,
            Err(e) => return Err(self.fail(e)),
        };
        if let Err(e) = notifier.watch(&self.config.path, RecursiveMode::NonRecursive) {
            return Err(self.fail(e));
        }

        let mut poll = time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats_tick = self.config.stats_interval.map(|period| {
            let mut tick = time::interval_at(time::Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tick
        });

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(path = %self.config.path.display(), "Watch stopped");
                    self.state = WatchState::Stopped;
                    return Ok(());
                }

                event = events.recv() => match event {
                    Some(Ok(event)) => {
                        if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                            self.read_logged();
                        }
                    }
                    Some(Err(e)) => return Err(self.fail(e)),
                    None => return Err(self.fail(notify::Error::generic("notification channel closed"))),
                },

                _ = poll.tick() => self.read_logged(),

                _ = next_tick(stats_tick.as_mut()) => {
                    self.sink.summary(&self.stats);
                }
            }
        }
    }

    fn read_logged(&mut self) {
        if let Err(e) = self.read_new_lines() {
            warn!(error = %e, "Failed to read new lines");
        }
    }

    fn fail(&mut self, e: notify::Error) -> AnalyzerError {
        error!(path = %self.config.path.display(), error = %e, "File notification failed");
        self.state = WatchState::Failed;
        AnalyzerError::Notification(e)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Statistics over every record emitted so far.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Whether two metadata snapshots describe the same file on disk.
#[cfg(unix)]
fn same_file(open: &fs::Metadata, current: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    open.dev() == current.dev() && open.ino() == current.ino()
}

// no portable identity; rotation is then only seen as a shrink
#[cfg(not(unix))]
fn same_file(_open: &fs::Metadata, _current: &fs::Metadata) -> bool {
    true
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
