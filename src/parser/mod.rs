//! Line parsers
//!
//! Every parser implements the [`LogParser`] capability: `parse` a line into a
//! [`LogEntry`], report whether it `can_parse` a line, and expose a `name`.
//!
//! - [`JsonLogParser`] - one JSON object per line
//! - [`PlainTextLogParser`] - free text with an optional timestamp prefix and level token
//! - [`detect_parser`] - picks one of the above per line when auto-detection is on
//!
//! A parse failure only ever affects the line that caused it; callers skip the
//! line and move on.

use crate::models::LogEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

mod detector;
mod json;
mod plain;

pub use detector::{detect_parser, parser_for};
pub use json::JsonLogParser;
pub use plain::PlainTextLogParser;

/// Why a single line could not be turned into a record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty log line")]
    EmptyLine,

    #[error("invalid log format: {0}")]
    InvalidFormat(#[from] serde_json::Error),
}

pub trait LogParser: Send + Sync {
    /// Parse `line`, labelling the record with `source`.
    fn parse(&self, line: &str, source: &str) -> Result<LogEntry, ParseError>;

    fn can_parse(&self, line: &str) -> bool;

    fn name(&self) -> &'static str;
}

/// Parser selection when auto-detection is turned off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Json,
    #[default]
    PlainText,
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserKind::Json => f.write_str("JSON"),
            ParserKind::PlainText => f.write_str("PlainText"),
        }
    }
}
