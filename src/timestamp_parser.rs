use chrono::{DateTime, NaiveDateTime, Utc};

/// Layouts accepted for a structured `timestamp`/`time` field after RFC 3339
/// has been tried. Zone-less values are taken as UTC.
const STRUCTURED_LAYOUTS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Fixed-width prefixes recognized at the start of a free-text line.
const PREFIX_LAYOUTS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Width of every layout in [`PREFIX_LAYOUTS`].
pub const PREFIX_WIDTH: usize = 19;

/// Handles parsing timestamps from the formats found in log files
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a structured timestamp field: RFC 3339 (with or without
    /// sub-second precision), then the zone-less layouts.
    pub fn parse(timestamp_str: &str) -> Option<DateTime<Utc>> {
        let timestamp_str = timestamp_str.trim();
        if timestamp_str.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str) {
            return Some(dt.with_timezone(&Utc));
        }

        for layout in STRUCTURED_LAYOUTS {
            if let Some(dt) = parse_naive(timestamp_str, layout) {
                return Some(dt);
            }
        }

        None
    }

    /// Try each fixed-width layout against the first [`PREFIX_WIDTH`] bytes
    /// of `line`. Returns the timestamp and the remainder after the prefix.
    pub fn parse_prefix(line: &str) -> Option<(DateTime<Utc>, &str)> {
        let prefix = line.get(..PREFIX_WIDTH)?;
        PREFIX_LAYOUTS.iter().find_map(|layout| {
            NaiveDateTime::parse_from_str(prefix, layout)
                .ok()
                .map(|naive| (naive.and_utc(), &line[PREFIX_WIDTH..]))
        })
    }
}

fn parse_naive(s: &str, layout: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
        return Some(naive.and_utc());
    }
    // fractional seconds are accepted after any layout
    let with_fraction = format!("{layout}%.f");
    NaiveDateTime::parse_from_str(s, &with_fraction)
        .ok()
        .map(|naive| naive.and_utc())
}
