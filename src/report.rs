//! Report Rendering
//!
//! Turns the final record list and [`Statistics`] snapshot into text. The
//! analysis core is done by the time a reporter runs; nothing here mutates
//! state.
//!
//! ## Formats
//!
//! - **Table** ([`TableReporter`]): colored summary block, the first
//!   `max_entries` records with messages cut to `message_width` characters,
//!   then top patterns and a per-source breakdown
//! - **JSON** ([`JsonReporter`]): a `summary` / `statistics` / `entries`
//!   document with RFC 3339 timestamps
//!
//! Truncation only ever happens here; stored records keep their full text.

use crate::config::OutputSettings;
use crate::models::{LogEntry, LogLevel, Statistics};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected table or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        })
    }
}

pub trait Reporter {
    fn report(&self, entries: &[Arc<LogEntry>], stats: &Statistics, out: &mut dyn Write) -> io::Result<()>;
    fn name(&self) -> &'static str;
}

pub fn reporter_for(format: OutputFormat, settings: &OutputSettings, top_patterns: usize) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Json => Box::new(JsonReporter),
        OutputFormat::Table => Box::new(TableReporter {
            max_entries: settings.max_entries,
            message_width: settings.message_width,
            top_patterns,
        }),
    }
}

/// Level text padded to five columns and colored by severity.
pub fn colored_level(level: LogLevel) -> ColoredString {
    let text = format!("{:<5}", level);
    match level {
        LogLevel::Fatal => text.red().bold(),
        LogLevel::Error => text.red(),
        LogLevel::Warn => text.yellow(),
        LogLevel::Info => text.green(),
        LogLevel::Debug => text.cyan(),
        LogLevel::Unknown => text.white(),
    }
}

/// Cut `text` to at most `width` characters, ending in `...` when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn format_span(span: chrono::Duration) -> String {
    let secs = span.num_seconds();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{}s", span.num_milliseconds() as f64 / 1000.0)
    }
}

fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Multi-line human summary of a statistics snapshot.
pub fn summary_text(stats: &Statistics) -> String {
    let rule = "─".repeat(48);
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Log Analysis Summary".bright_white().bold()));
    out.push_str(&format!("{}\n", rule.bright_cyan()));
    out.push_str(&format!("Files Processed:    {}\n", stats.files_processed));
    out.push_str(&format!("Total Entries:      {}\n", stats.total_entries));
    out.push_str(&format!(
        "Bytes Processed:    {:.2} MB\n",
        stats.bytes_processed as f64 / (1024.0 * 1024.0)
    ));
    out.push_str(&format!("Processing Time:    {:?}\n", stats.processing_time));
    out.push_str(&format!("Entries/sec:        {:.0}\n\n", stats.entries_per_second()));

    out.push_str(&format!("{}\n", "Log Levels".bright_white().bold()));
    out.push_str(&format!("{}\n", rule.bright_cyan()));
    for level in LogLevel::KNOWN {
        out.push_str(&format!("{} {:>8}\n", colored_level(level), stats.level_count(level)));
    }
    let unknown = stats.level_count(LogLevel::Unknown);
    if unknown > 0 {
        out.push_str(&format!("{} {:>8}\n", colored_level(LogLevel::Unknown), unknown));
    }

    out.push_str(&format!("\n{}\n", "Time Range".bright_white().bold()));
    out.push_str(&format!("{}\n", rule.bright_cyan()));
    out.push_str(&format!("First Entry:        {}\n", format_time(stats.first_timestamp)));
    out.push_str(&format!("Last Entry:         {}\n", format_time(stats.last_timestamp)));
    out.push_str(&format!("Duration:           {}\n", format_span(stats.time_span())));
    out
}

#[derive(Debug, Clone)]
pub struct TableReporter {
    pub max_entries: usize,
    pub message_width: usize,
    /// Number of top patterns to list; 0 hides the section.
    pub top_patterns: usize,
}

impl Default for TableReporter {
    fn default() -> Self {
        Self {
            max_entries: 50,
            message_width: 70,
            top_patterns: 0,
        }
    }
}

impl TableReporter {
    fn print_entry(&self, out: &mut dyn Write, index: usize, entry: &LogEntry) -> io::Result<()> {
        writeln!(
            out,
            "{:>4}. {} {} {} {}",
            index,
            entry.timestamp().format("%Y-%m-%d %H:%M:%S").to_string().bright_black(),
            colored_level(entry.level()),
            format!("{:<15}", truncate(entry.source(), 15)).bright_blue(),
            truncate(entry.message(), self.message_width)
        )
    }

    fn print_top_patterns(&self, out: &mut dyn Write, stats: &Statistics) -> io::Result<()> {
        let top = stats.top_patterns(self.top_patterns);
        if top.is_empty() {
            return Ok(());
        }
        writeln!(out, "\n{}", "Top Patterns".bright_white().bold())?;
        for (i, (pattern, count)) in top.iter().enumerate() {
            writeln!(out, "{:>4}. {} ({} occurrences)", i + 1, pattern.bright_yellow(), count)?;
        }
        Ok(())
    }

    fn print_source_breakdown(&self, out: &mut dyn Write, stats: &Statistics) -> io::Result<()> {
        if stats.source_counts.len() < 2 {
            return Ok(());
        }
        let mut sources: Vec<(&String, &u64)> = stats.source_counts.iter().collect();
        sources.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        writeln!(out, "\n{}", "Entries by Source".bright_white().bold())?;
        for (source, count) in sources {
            let share = if stats.total_entries > 0 {
                *count as f64 / stats.total_entries as f64 * 100.0
            } else {
                0.0
            };
            writeln!(out, "  {:<30} {:>8} ({:.1}%)", truncate(source, 30), count, share)?;
        }
        Ok(())
    }
}

impl Reporter for TableReporter {
    fn report(&self, entries: &[Arc<LogEntry>], stats: &Statistics, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", summary_text(stats))?;

        if entries.is_empty() {
            writeln!(out, "No entries found matching the criteria")?;
        } else {
            writeln!(out, "{}", "Log Entries".bright_white().bold())?;
            writeln!(out, "{}", "─".repeat(80).bright_cyan())?;
            for (i, entry) in entries.iter().take(self.max_entries).enumerate() {
                self.print_entry(out, i + 1, entry)?;
            }
            if entries.len() > self.max_entries {
                writeln!(
                    out,
                    "  ... and {} more entries (use --format json for all)",
                    entries.len() - self.max_entries
                )?;
            }
        }

        self.print_top_patterns(out, stats)?;
        self.print_source_breakdown(out, stats)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Table"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: JsonSummary,
    statistics: JsonStatistics<'a>,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonSummary {
    total_entries: u64,
    files_processed: u64,
    bytes_processed: u64,
    processing_time_ms: f64,
    entries_per_second: f64,
}

#[derive(Serialize)]
struct JsonStatistics<'a> {
    level_counts: BTreeMap<&'static str, u64>,
    source_counts: BTreeMap<&'a str, u64>,
    pattern_counts: BTreeMap<&'a str, u64>,
    time_range: JsonTimeRange,
}

#[derive(Serialize)]
struct JsonTimeRange {
    start: Option<String>,
    end: Option<String>,
    duration_seconds: f64,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    timestamp: String,
    level: LogLevel,
    message: &'a str,
    source: &'a str,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Reporter for JsonReporter {
    fn report(&self, entries: &[Arc<LogEntry>], stats: &Statistics, out: &mut dyn Write) -> io::Result<()> {
        let report = JsonReport {
            summary: JsonSummary {
                total_entries: stats.total_entries,
                files_processed: stats.files_processed,
                bytes_processed: stats.bytes_processed,
                processing_time_ms: stats.processing_time.as_secs_f64() * 1000.0,
                entries_per_second: stats.entries_per_second(),
            },
            statistics: JsonStatistics {
                level_counts: stats
                    .level_counts
                    .iter()
                    .map(|(level, count)| (level.as_str(), *count))
                    .collect(),
                source_counts: stats
                    .source_counts
                    .iter()
                    .map(|(s, c)| (s.as_str(), *c))
                    .collect(),
                pattern_counts: stats
                    .pattern_counts
                    .iter()
                    .map(|(p, c)| (p.as_str(), *c))
                    .collect(),
                time_range: JsonTimeRange {
                    start: stats.first_timestamp.map(rfc3339),
                    end: stats.last_timestamp.map(rfc3339),
                    duration_seconds: stats.time_span().num_milliseconds() as f64 / 1000.0,
                },
            },
            entries: entries
                .iter()
                .map(|e| JsonEntry {
                    timestamp: rfc3339(e.timestamp()),
                    level: e.level(),
                    message: e.message(),
                    source: e.source(),
                })
                .collect(),
        };

        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)
    }

    fn name(&self) -> &'static str {
        "JSON"
    }
}
