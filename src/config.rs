//! Layered configuration
//!
//! Settings are resolved in order:
//! - Built-in defaults
//! - The first config file found (`loganalyzer.toml`, `.loganalyzer.toml`,
//!   `<config dir>/loganalyzer/config.toml`)
//! - Environment variable overrides
//!
//! Command-line flags are applied on top by the binary. The resolved value is
//! passed around explicitly.

use crate::analyzer::{AnalysisConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_LINE_BYTES, DEFAULT_WORKERS};
use crate::live::WatchConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const MIN_LINE_BYTES: usize = 1024;
const MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub analysis: AnalysisSettings,
    pub watch: WatchSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// `console`, `file` or `both`
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub workers: usize,
    pub batch_size: usize,
    pub max_line_bytes: usize,
    pub extension: String,
    pub auto_detect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub poll_interval_ms: u64,
    pub show_all: bool,
    /// 0 disables periodic summaries.
    pub stats_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// `table` or `json`
    pub format: String,
    pub max_entries: usize,
    pub message_width: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            extension: "log".to_string(),
            auto_detect: true,
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            show_all: false,
            stats_interval_secs: 0,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            max_entries: 50,
            message_width: 70,
        }
    }
}

impl Config {
    /// Load configuration from defaults, file and environment
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            Some(PathBuf::from("loganalyzer.toml")),
            Some(PathBuf::from(".loganalyzer.toml")),
            dirs::config_dir().map(|d| d.join("loganalyzer").join("config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("LOGANALYZER_LOG_DIR") {
            self.logging.directory = PathBuf::from(val);
        }

        if let Ok(val) = env::var("LOGANALYZER_WORKERS") {
            self.analysis.workers = val.parse().context("Invalid LOGANALYZER_WORKERS")?;
        }
        if let Ok(val) = env::var("LOGANALYZER_BATCH_SIZE") {
            self.analysis.batch_size = val.parse().context("Invalid LOGANALYZER_BATCH_SIZE")?;
        }
        if let Ok(val) = env::var("LOGANALYZER_MAX_LINE_BYTES") {
            self.analysis.max_line_bytes = val
                .parse()
                .context("Invalid LOGANALYZER_MAX_LINE_BYTES")?;
        }
        if let Ok(val) = env::var("LOGANALYZER_EXTENSION") {
            self.analysis.extension = val;
        }

        if let Ok(val) = env::var("LOGANALYZER_POLL_INTERVAL_MS") {
            self.watch.poll_interval_ms = val
                .parse()
                .context("Invalid LOGANALYZER_POLL_INTERVAL_MS")?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.workers == 0 {
            return Err(anyhow::anyhow!("Worker count must be greater than 0"));
        }

        if self.analysis.batch_size == 0 {
            return Err(anyhow::anyhow!("Batch size must be greater than 0"));
        }

        if !(MIN_LINE_BYTES..=MAX_LINE_BYTES).contains(&self.analysis.max_line_bytes) {
            return Err(anyhow::anyhow!(
                "Max line size must be between {} and {} bytes, got {}",
                MIN_LINE_BYTES,
                MAX_LINE_BYTES,
                self.analysis.max_line_bytes
            ));
        }

        if self.analysis.extension.trim_start_matches('.').is_empty() {
            return Err(anyhow::anyhow!("File extension cannot be empty"));
        }

        if self.watch.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("Poll interval must be greater than 0"));
        }

        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }

    /// Analysis settings with no filters set.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            workers: self.analysis.workers,
            auto_detect: self.analysis.auto_detect,
            batch_size: self.analysis.batch_size,
            max_line_bytes: self.analysis.max_line_bytes,
            extension: self.analysis.extension.clone(),
            ..AnalysisConfig::default()
        }
    }

    pub fn watch_config(&self, path: impl Into<PathBuf>) -> WatchConfig {
        let mut watch = WatchConfig::new(path);
        watch.poll_interval = Duration::from_millis(self.watch.poll_interval_ms);
        watch.show_all = self.watch.show_all;
        watch.stats_interval =
            (self.watch.stats_interval_secs > 0).then(|| Duration::from_secs(self.watch.stats_interval_secs));
        watch.max_line_bytes = self.analysis.max_line_bytes;
        watch
    }
}
