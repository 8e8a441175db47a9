use super::Target;
use crate::analyzer::LogAnalyzer;
use crate::config::Config;
use crate::error::AnalyzerError;
use crate::report::summary_text;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub target: Target,
    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Print the statistics summary only, no entries.
pub async fn run_stats(args: StatsArgs, config: &Config) -> Result<()> {
    let mut analysis = config.analysis_config();
    if let Some(workers) = args.workers {
        analysis.workers = workers;
    }

    let target = args.target.path();
    let analyzer = LogAnalyzer::new(analysis);

    eprintln!("Gathering statistics...");
    let partial = match analyzer.analyze_path(target).await {
        Ok(()) => None,
        Err(e @ AnalyzerError::PartialFailure { .. }) => Some(e),
        Err(e) => return Err(e).with_context(|| format!("Analysis of {} failed", target.display())),
    };

    println!("{}", summary_text(&analyzer.aggregator().statistics()));

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
