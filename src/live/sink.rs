use crate::models::{LogEntry, LogLevel, Statistics};
use crate::report::colored_level;
use colored::Colorize;
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedSender;

/// Receives accepted records from the watcher, in arrival order.
pub trait EntrySink {
    fn emit(&mut self, entry: &LogEntry);

    /// Periodic snapshot of everything emitted so far.
    fn summary(&mut self, _stats: &Statistics) {}
}

impl EntrySink for Vec<LogEntry> {
    fn emit(&mut self, entry: &LogEntry) {
        self.push(entry.clone());
    }
}

impl EntrySink for UnboundedSender<LogEntry> {
    fn emit(&mut self, entry: &LogEntry) {
        // a dropped receiver only means nobody is listening anymore
        let _ = self.send(entry.clone());
    }
}

/// One colored line per record: `[HH:MM:SS] LEVEL message`.
pub struct ConsoleSink<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EntrySink for ConsoleSink<W> {
    fn emit(&mut self, entry: &LogEntry) {
        let stamp = format!("[{}]", entry.timestamp().format("%H:%M:%S"));
        let _ = writeln!(
            self.out,
            "{} {} {}",
            stamp.bright_black(),
            colored_level(entry.level()),
            entry.message()
        );
    }

    fn summary(&mut self, stats: &Statistics) {
        let levels: Vec<String> = LogLevel::KNOWN
            .iter()
            .map(|l| format!("{}={}", l, stats.level_count(*l)))
            .collect();
        let _ = writeln!(
            self.out,
            "{} {} entries | {}",
            "--".bright_black(),
            stats.total_entries,
            levels.join(" ")
        );
        let _ = self.out.flush();
    }
}
