//! Log Analyzer Library
//!
//! Concurrent analysis of line-oriented log files, structured (one JSON object
//! per line) or free text, plus live tailing of a single growing file.
//!
//! ## Core Features
//!
//! - **Format auto-detection**: each line is routed to the JSON or plain-text
//!   parser, so one file may mix both
//! - **Bounded streaming**: files are read line by line with a per-line size
//!   cap and records reach the aggregator in batches
//! - **Worker pool**: a directory is scattered over N blocking workers pulling
//!   from a closed queue; one bad file never cancels the others
//! - **Live tailing**: offset tracking with truncation and rotation handling,
//!   woken by filesystem notifications with a polling fallback
//!
//! ## Architecture Overview
//!
//! - [`models`] - `LogLevel`, `LogEntry` and `Statistics`
//! - [`parser`] - the `LogParser` trait, both parsers and the detector
//! - [`filter`] - predicates and the AND-combining `FilterChain`
//! - [`aggregator`] - the lock-protected record and statistics store
//! - [`analyzer`] - single-file streaming and the directory worker pool
//! - [`live`] - the tailing watcher and its output sinks
//! - [`report`] - table and JSON reporters
//! - [`config`] / [`logging`] - layered settings and `tracing` setup
//!
//! ## Usage Example
//!
//! ```no_run
//! use loganalyzer::{AnalysisConfig, LogAnalyzer, LogLevel};
//!
//! # async fn example() -> Result<(), loganalyzer::AnalyzerError> {
//! let analyzer = LogAnalyzer::new(AnalysisConfig {
//!     min_level: Some(LogLevel::Warn),
//!     ..AnalysisConfig::default()
//! });
//! analyzer.analyze_path("/var/log/myapp".as_ref()).await?;
//!
//! let stats = analyzer.aggregator().statistics();
//! println!("{} warnings or worse", stats.total_entries);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod commands;
pub mod config;
pub mod error;
pub mod file_discovery;
pub mod filter;
pub mod line_reader;
pub mod live;
pub mod logging;
pub mod models;
pub mod parser;
pub mod report;
pub mod timestamp_parser;

pub use aggregator::Aggregator;
pub use analyzer::{AnalysisConfig, LogAnalyzer};
pub use error::{AnalyzerError, WorkerFailure};
pub use filter::{Filter, FilterChain};
pub use live::{LogWatcher, WatchConfig, WatchState};
pub use models::{LogEntry, LogLevel, Statistics};
pub use parser::{LogParser, ParseError, ParserKind};
