//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::SortOrder;
use clap::Parser;
use std::path::PathBuf;

/// Recensio - follow a swarm of simulated reviewers rating a website
///
/// Launches AI reviewer agents against a URL through the Recensio backend,
/// follows them live and writes a Markdown/JSON report of scores and themes.
///
/// Examples:
///   recensio --url https://example.com
///   recensio --url https://example.com --format json -o report.json
///   recensio --task-id 3f2a9c --sort rating-desc
///   recensio --chat-agent 4 --message "What confused you?"
///   recensio --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Website URL to review
    #[arg(
        short,
        long,
        value_name = "URL",
        required_unless_present_any = ["task_id", "chat_agent", "init_config"],
        conflicts_with = "task_id"
    )]
    pub url: Option<String>,

    /// Follow an existing task instead of launching a new one
    #[arg(long, value_name = "ID")]
    pub task_id: Option<String>,

    /// Backend base URL
    ///
    /// Defaults to the config file value, then http://localhost:8000.
    #[arg(long, value_name = "URL", env = "RECENSIO_API_URL")]
    pub api_url: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .recensio.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Launch without asking the backend for a target audience
    #[arg(long)]
    pub no_audience: bool,

    /// Order of the agent reviews in the report
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortOrder>,

    /// Number of pain points and liked features shown in the report
    #[arg(long, value_name = "COUNT")]
    pub top_themes: Option<usize>,

    /// Stop following the task after this many seconds
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Fail if the final mean overall score is below this value
    ///
    /// Useful for CI pipelines. Exit code 2 when the score is lower.
    #[arg(long, value_name = "SCORE")]
    pub min_score: Option<f64>,

    /// Chat with one agent instead of running a review
    #[arg(long, value_name = "AGENT_ID", requires = "message")]
    pub chat_agent: Option<i64>,

    /// Message to send with --chat-agent
    #[arg(long, value_name = "TEXT", requires = "chat_agent")]
    pub message: Option<String>,

    /// Generate a default .recensio.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !is_http_url(url) {
                return Err("Website URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref api_url) = self.api_url {
            if !is_http_url(api_url) {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref task_id) = self.task_id {
            if task_id.trim().is_empty() {
                return Err("Task id must not be empty".to_string());
            }
        }

        if let Some(ref message) = self.message {
            if message.trim().is_empty() {
                return Err("Chat message must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(score) = self.min_score {
            if !(0.0..=100.0).contains(&score) {
                return Err("Minimum score must be between 0 and 100".to_string());
            }
        }

        if self.top_themes == Some(0) {
            return Err("Top themes must be at least 1".to_string());
        }

        if self.max_wait == Some(0) {
            return Err("Max wait must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
