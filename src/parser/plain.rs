use super::{LogParser, ParseError};
use crate::models::{LogEntry, LogLevel};
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, Utc};

/// Level keywords in match order. `WARN` precedes `WARNING`; the joiners
/// keep `WARN` from claiming a `WARNING:` prefix.
const LEVEL_TOKENS: [&str; 6] = ["FATAL", "ERROR", "WARN", "WARNING", "INFO", "DEBUG"];

const JOINERS: [&str; 3] = [":", " -", " "];

/// Free-text parser and universal fallback.
///
/// Handles lines such as:
///
/// ```text
/// [2024-01-20 15:04:05] ERROR: Something went wrong
/// 2024-01-20 15:04:05 INFO Something happened
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextLogParser;

impl PlainTextLogParser {
    pub fn new() -> Self {
        Self
    }
}

impl LogParser for PlainTextLogParser {
    fn parse(&self, line: &str, source: &str) -> Result<LogEntry, ParseError> {
        if line.trim().is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let (timestamp, rest) = extract_timestamp(line).unwrap_or_else(|| (Utc::now(), line));
        let (level, message) = extract_level_and_message(rest);

        Ok(LogEntry::new(timestamp, level, message.trim(), source, line))
    }

    fn can_parse(&self, _line: &str) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "PlainText"
    }
}

/// Leading timestamp, optionally wrapped in `[...]`. Returns the remainder
/// with surrounding whitespace removed.
fn extract_timestamp(line: &str) -> Option<(DateTime<Utc>, &str)> {
    let line = line.trim();
    let (bracketed, body) = match line.strip_prefix('[') {
        Some(body) => (true, body),
        None => (false, line),
    };

    let (timestamp, mut rest) = TimestampParser::parse_prefix(body)?;
    if bracketed {
        rest = rest.strip_prefix(']').unwrap_or(rest);
    }
    Some((timestamp, rest.trim()))
}

/// Level token as a case-insensitive prefix (`LEVEL:`, `LEVEL -`, `LEVEL `),
/// else any level keyword anywhere in the text, else `Info`.
fn extract_level_and_message(text: &str) -> (LogLevel, &str) {
    let text = text.trim();

    for token in LEVEL_TOKENS {
        for joiner in JOINERS {
            let width = token.len() + joiner.len();
            let Some(head) = text.get(..width) else {
                continue;
            };
            let (word, sep) = head.as_bytes().split_at(token.len());
            if word.eq_ignore_ascii_case(token.as_bytes()) && sep == joiner.as_bytes() {
                return (LogLevel::from_canonical(token), text[width..].trim());
            }
        }
    }

    let upper = text.to_ascii_uppercase();
    for token in LEVEL_TOKENS {
        if upper.contains(token) {
            return (LogLevel::from_canonical(token), text);
        }
    }

    (LogLevel::Info, text)
}
