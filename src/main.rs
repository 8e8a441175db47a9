use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use loganalyzer::commands::{run_analyze, run_stats, run_watch, AnalyzeArgs, StatsArgs, WatchArgs};
use loganalyzer::config::Config;
use loganalyzer::logging::init_logging;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "loganalyzer")]
#[command(about = "Concurrent log file analyzer with live tailing")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the default search path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze log files and print a report
    Analyze(AnalyzeArgs),
    /// Follow a log file in real time
    Watch(WatchArgs),
    /// Show statistics for log files
    Stats(StatsArgs),
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from_file(path)?;
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => handle_error(e),
    };
    let _log_guard = init_logging(&config.logging);

    let result = match cli.command {
        Commands::Analyze(args) => run_analyze(args, &config).await,
        Commands::Watch(args) => run_watch(args, &config).await,
        Commands::Stats(args) => run_stats(args, &config).await,
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e),
    }
}

fn handle_error(e: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), e);
    process::exit(1);
}
