use super::parse_level;
use crate::config::Config;
use crate::live::{ConsoleSink, LogWatcher};
use crate::models::LogLevel;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Log file to follow
    #[arg(long)]
    pub file: PathBuf,
    /// Only show entries containing this text
    #[arg(long)]
    pub pattern: Option<String>,
    /// Minimum log level to show
    #[arg(long, value_parser = parse_level)]
    pub level: Option<LogLevel>,
    /// Fallback poll interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Show existing entries, not just new ones
    #[arg(long)]
    pub all: bool,
    /// Print a level summary every N seconds
    #[arg(long)]
    pub stats_secs: Option<u64>,
}

pub async fn run_watch(args: WatchArgs, config: &Config) -> Result<()> {
    let mut watch = config.watch_config(&args.file);
    watch.pattern = args.pattern;
    watch.min_level = args.level;
    watch.show_all |= args.all;
    if let Some(ms) = args.interval_ms.filter(|ms| *ms > 0) {
        watch.poll_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = args.stats_secs {
        watch.stats_interval = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let mut watcher = LogWatcher::new(watch, ConsoleSink::stdout());
    watcher
        .open()
        .with_context(|| format!("Cannot watch {}", args.file.display()))?;

    eprintln!("Watching {} (Ctrl+C to stop)", args.file.display());

    watcher
        .watch(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    eprintln!("\nStopped watching {}", args.file.display());
    Ok(())
}
