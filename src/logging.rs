//! Structured logging setup
//!
//! - Pretty output for terminals, JSON for machines
//! - Console (stderr), daily rolling file, or both
//! - `RUST_LOG` overrides the configured level

use crate::config::LoggingConfig;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "loganalyzer.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Console,
    File,
    Both,
}

impl Destination {
    fn from_config(output: &str) -> Self {
        match output {
            "file" => Destination::File,
            "both" => Destination::Both,
            _ => Destination::Console,
        }
    }

    fn console(self) -> bool {
        self != Destination::File
    }

    fn file(self) -> bool {
        self != Destination::Console
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process when logging to a file, or buffered lines are lost.
///
/// A second call is a no-op apart from a warning on stderr.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let destination = Destination::from_config(&config.output);
    let json = config.format == "json";

    let (file_writer, guard) = if destination.file() {
        let appender = tracing_appender::rolling::daily(&config.directory, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    // each slot is either a layer or None; unset slots are skipped by the registry
    let console_pretty = (destination.console() && !json).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .pretty()
    });
    let console_json = (destination.console() && json).then(|| {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .with_span_list(true)
    });
    let file_text = file_writer
        .clone()
        .filter(|_| !json)
        .map(|writer| fmt::layer().with_writer(writer).with_ansi(false));
    let file_json = file_writer
        .filter(|_| json)
        .map(|writer| fmt::layer().json().with_writer(writer).with_current_span(true));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_pretty)
        .with(console_json)
        .with(file_text)
        .with(file_json)
        .try_init();

    if let Err(e) = installed {
        eprintln!("Logging already initialized: {e}");
    }

    guard
}
