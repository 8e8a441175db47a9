use super::{LogParser, ParseError};
use crate::models::{LogEntry, LogLevel};
use crate::timestamp_parser::TimestampParser;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Parses one JSON object per line.
///
/// Recognized fields: `timestamp` (fallback `time`), `level`, `message`
/// (fallback `msg`). Field names match case-insensitively, an exact match
/// winning. `null` reads as an empty string. Unknown fields are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLogParser;

impl JsonLogParser {
    pub fn new() -> Self {
        Self
    }
}

/// String value of `name`, empty when absent or `null`. A non-string value
/// is a format error.
fn string_field(object: &Map<String, Value>, name: &str) -> Result<String, ParseError> {
    let value = object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    });
    match value {
        None => Ok(String::new()),
        Some(value) => Ok(Option::<String>::deserialize(value)?.unwrap_or_default()),
    }
}

/// First non-empty of `primary`, then `fallback`.
fn field_with_fallback(
    object: &Map<String, Value>,
    primary: &str,
    fallback: &str,
) -> Result<String, ParseError> {
    let value = string_field(object, primary)?;
    if value.is_empty() {
        string_field(object, fallback)
    } else {
        Ok(value)
    }
}

impl LogParser for JsonLogParser {
    fn parse(&self, line: &str, source: &str) -> Result<LogEntry, ParseError> {
        if line.trim().is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let object: Map<String, Value> = serde_json::from_str(line)?;

        // a bad or missing timestamp never rejects the line
        let timestamp = TimestampParser::parse(&field_with_fallback(&object, "timestamp", "time")?)
            .unwrap_or_else(Utc::now);
        let level = string_field(&object, "level")?;
        let message = field_with_fallback(&object, "message", "msg")?;

        Ok(LogEntry::new(
            timestamp,
            LogLevel::from_canonical(&level.to_uppercase()),
            message,
            source,
            line,
        ))
    }

    fn can_parse(&self, line: &str) -> bool {
        let line = line.trim();
        !line.is_empty() && line.starts_with('{') && line.ends_with('}')
    }

    fn name(&self) -> &'static str {
        "JSON"
    }
}
