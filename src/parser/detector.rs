use super::{JsonLogParser, LogParser, ParserKind, PlainTextLogParser};

static JSON: JsonLogParser = JsonLogParser;
static PLAIN_TEXT: PlainTextLogParser = PlainTextLogParser;

/// Pick a parser for one line: JSON if the line looks like an object,
/// otherwise the free-text fallback.
pub fn detect_parser(line: &str) -> &'static dyn LogParser {
    if JSON.can_parse(line) {
        &JSON
    } else {
        &PLAIN_TEXT
    }
}

/// The fixed parser used when auto-detection is off.
pub fn parser_for(kind: ParserKind) -> &'static dyn LogParser {
    match kind {
        ParserKind::Json => &JSON,
        ParserKind::PlainText => &PLAIN_TEXT,
    }
}
