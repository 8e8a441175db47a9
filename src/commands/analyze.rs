use super::{parse_level, parse_since, parse_until, Target};
use crate::analyzer::LogAnalyzer;
use crate::config::Config;
use crate::error::AnalyzerError;
use crate::models::LogLevel;
use crate::parser::ParserKind;
use crate::report::{reporter_for, OutputFormat};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ParserChoice {
    /// Pick per line
    Auto,
    Json,
    Plain,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub target: Target,
    /// Minimum log level (DEBUG, INFO, WARN, ERROR, FATAL)
    #[arg(long, value_parser = parse_level)]
    pub level: Option<LogLevel>,
    /// Literal text to search for
    #[arg(long)]
    pub pattern: Option<String>,
    /// Only entries at or after this time
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,
    /// Only entries at or before this time
    #[arg(long, value_parser = parse_until)]
    pub until: Option<DateTime<Utc>>,
    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long, value_enum, default_value_t = ParserChoice::Auto)]
    pub parser: ParserChoice,
    /// Output format: table or json
    #[arg(long)]
    pub format: Option<OutputFormat>,
    /// Write the report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Show the top N patterns
    #[arg(long, default_value_t = 0)]
    pub top_patterns: usize,
}

pub async fn run_analyze(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let mut analysis = config.analysis_config();
    analysis.min_level = args.level;
    analysis.pattern = args.pattern.clone();
    analysis.start_time = args.since;
    analysis.end_time = args.until;
    if let Some(workers) = args.workers {
        analysis.workers = workers;
    }
    match args.parser {
        ParserChoice::Auto => analysis.auto_detect = true,
        ParserChoice::Json => {
            analysis.auto_detect = false;
            analysis.parser_kind = ParserKind::Json;
        }
        ParserChoice::Plain => {
            analysis.auto_detect = false;
            analysis.parser_kind = ParserKind::PlainText;
        }
    }

    let format = match args.format {
        Some(format) => format,
        None => config.output.format.parse().map_err(|e: String| anyhow!(e))?,
    };

    let target = args.target.path();
    let analyzer = LogAnalyzer::new(analysis);

    eprintln!("Starting analysis of {}...", target.display());
    let started = Instant::now();
    let partial = match analyzer.analyze_path(target).await {
        Ok(()) => None,
        Err(e @ AnalyzerError::PartialFailure { .. }) => Some(e),
        Err(e) => return Err(e).with_context(|| format!("Analysis of {} failed", target.display())),
    };
    eprintln!("Analysis complete in {:?}", started.elapsed());

    let entries = analyzer.aggregator().entries();
    let stats = analyzer.aggregator().statistics();
    let reporter = reporter_for(format, &config.output, args.top_patterns);
    info!(reporter = reporter.name(), entries = entries.len(), "Writing report");

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            reporter.report(&entries, &stats, &mut writer)?;
            writer.flush()?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            reporter.report(&entries, &stats, &mut writer)?;
            writer.flush()?;
        }
    }

    match partial {
        Some(e) => {
            for failure in e.failures() {
                eprintln!("  {failure}");
            }
            Err(e.into())
        }
        None => Ok(()),
    }
}
