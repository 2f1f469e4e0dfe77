//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.recensio.toml` files.

use crate::analysis::{SortOrder, ThemeConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".recensio.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling cadence and limits.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Keyword tables for the theme classifier.
    #[serde(default)]
    pub themes: ThemeConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// How long a validation notice stays up.
    #[serde(default = "default_notice_seconds")]
    pub notice_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            notice_seconds: default_notice_seconds(),
        }
    }
}

fn default_output() -> String {
    "recensio_report.md".to_string()
}

fn default_notice_seconds() -> u64 {
    5
}

/// Backend API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub agents_interval_ms: u64,

    #[serde(default = "default_interval_ms")]
    pub status_interval_ms: u64,

    /// Give up following a task after this many seconds.
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            agents_interval_ms: default_interval_ms(),
            status_interval_ms: default_interval_ms(),
            max_wait_seconds: default_max_wait(),
        }
    }
}

fn default_interval_ms() -> u64 {
    crate::sync::poller::DEFAULT_PERIOD.as_millis() as u64
}

fn default_max_wait() -> u64 {
    900 // generation of a full swarm can take several minutes
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Themes shown per list in the Markdown report.
    #[serde(default = "default_top_themes")]
    pub top_themes: usize,

    /// Include each agent's full review text.
    #[serde(default = "default_true")]
    pub include_reviews: bool,

    /// Order of the agent review list.
    #[serde(default)]
    pub sort: SortOrder,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_themes: default_top_themes(),
            include_reviews: true,
            sort: SortOrder::Default,
        }
    }
}

fn default_top_themes() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Look for `.recensio.toml` in `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject values the poller and HTTP client cannot run with.
    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("polling.agents_interval_ms", self.polling.agents_interval_ms),
            ("polling.status_interval_ms", self.polling.status_interval_ms),
            ("polling.max_wait_seconds", self.polling.max_wait_seconds),
            ("api.timeout_seconds", self.api.timeout_seconds),
        ];
        for (key, value) in non_zero {
            if value == 0 {
                anyhow::bail!("{} must be greater than 0", key);
            }
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_url) = args.api_url {
            self.api.base_url = api_url.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(sort) = args.sort {
            self.report.sort = sort;
        }
        if let Some(top_themes) = args.top_themes {
            self.report.top_themes = top_themes;
        }
        if let Some(max_wait) = args.max_wait {
            self.polling.max_wait_seconds = max_wait;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
