//! Recensio - live follower for swarms of simulated website reviewers
//!
//! A CLI tool that launches AI reviewer agents through the Recensio
//! backend, follows their progress live and generates a report of the
//! scores and recurring themes in their reviews.
//!
//! Exit codes:
//!   0 - Success (score at or above --min-score, or no --min-score set)
//!   1 - Runtime error or rejected URL
//!   2 - Mean overall score below --min-score

mod analysis;
mod api;
mod chat;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod session;
mod sync;

use analysis::summary_line;
use anyhow::{Context, Result};
use api::BackendClient;
use chat::Conversation;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use session::{Session, SessionOutcome, SessionSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (mut config, origin) = load_config(&args)?;
    config.merge_with_args(&args);

    init_logging(&args, &config);
    info!("Recensio v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    origin.log();

    let result = if args.chat_agent.is_some() {
        run_chat(&args, &config).await
    } else {
        run_review(&args, &config).await
    };

    match result {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Recensio failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .recensio.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the backend URL, polling, report and theme keywords.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Where the configuration came from; logged once logging is up.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    BrokenDefault(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::BrokenDefault(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // An explicit path must load
    let (config, origin) = if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        (config, ConfigOrigin::File(config_path.clone()))
    } else {
        // Try default location
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigOrigin::File(PathBuf::from(DEFAULT_CONFIG_FILE))),
            Ok(None) => (Config::default(), ConfigOrigin::Defaults),
            Err(e) => (Config::default(), ConfigOrigin::BrokenDefault(e)),
        }
    };

    if let ConfigOrigin::File(ref path) = origin {
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
    }
    Ok((config, origin))
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run a review session and write the report. Returns exit code (0, 1 or 2).
async fn run_review(args: &Args, config: &Config) -> Result<i32> {
    let client = BackendClient::new(&config.api.base_url, config.api.timeout_seconds)
        .context("Failed to create backend client")?;
    println!("🔗 Backend: {}", client.base_url());

    let settings = SessionSettings::from_config(config, !args.no_audience, !args.quiet);
    let session = Session::new(Arc::new(client), settings);

    let summary = match (&args.task_id, &args.url) {
        (Some(task_id), _) => {
            println!("👀 Following task {}...\n", task_id);
            session.attach(task_id, ctrl_c()).await
        }
        (None, Some(url)) => {
            println!("🚀 Launching reviewers for {}...\n", url);
            match session.launch(url, ctrl_c()).await {
                SessionOutcome::Finished(summary) => summary,
                SessionOutcome::Rejected(notice) => {
                    eprintln!("\n⚠️  {}", notice.message());
                    return Ok(1);
                }
            }
        }
        (None, None) => anyhow::bail!("Either --url or --task-id is required"),
    };

    println!("\n📝 Generating report...");
    let report = report::build_report(&summary, config.report.sort);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let mut output_path = PathBuf::from(&config.general.output);
    if args.output.is_none() && args.format == OutputFormat::Json {
        output_path.set_extension("json");
    }
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Review Summary:");
    println!(
        "   {}",
        summary_line(&report.progress, report.aggregate.as_ref())
    );
    if let Some(pain) = report.pain_points.first() {
        println!("   Top pain point: {} ({} mentions)", pain.text, pain.mentions);
    }
    if let Some(liked) = report.liked_features.first() {
        println!("   Most liked: {} ({} mentions)", liked.text, liked.mentions);
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    if summary.interrupted {
        println!("   ⚠️  Stopped before the task finished; results are partial.");
    }
    println!(
        "\n✅ Review complete! Report saved to: {}",
        output_path.display()
    );

    // Check --min-score threshold
    if let Some(min_score) = args.min_score {
        let overall = report.aggregate.map(|stats| stats.overall);
        match overall {
            Some(score) if score >= min_score => {}
            Some(score) => {
                eprintln!(
                    "\n⛔ Mean overall score {:.1} is below {:.1}. Failing (exit code 2).",
                    score, min_score
                );
                return Ok(2);
            }
            None => {
                eprintln!("\n⛔ No completed reviews to compare against --min-score. Failing (exit code 2).");
                return Ok(2);
            }
        }
    }

    Ok(0)
}

/// Send one message to an agent and print the reply.
async fn run_chat(args: &Args, config: &Config) -> Result<i32> {
    let agent_id = args
        .chat_agent
        .context("--chat-agent is required for chat")?;
    let message = args
        .message
        .as_deref()
        .context("--message is required for chat")?;

    let client = BackendClient::new(&config.api.base_url, config.api.timeout_seconds)
        .context("Failed to create backend client")?;

    let mut conversation = Conversation::start(&client, agent_id)
        .await
        .with_context(|| format!("Failed to start a conversation with agent {}", agent_id))?;
    let reply = conversation
        .send(&client, message)
        .await
        .context("Failed to send message")?;

    debug!(
        "Conversation {} has {} messages",
        conversation.conversation_id(),
        conversation.history().len()
    );

    let speaker = match (&reply.agent_emoji, &reply.agent_name) {
        (Some(emoji), Some(name)) => format!("{} {}", emoji, name),
        (None, Some(name)) => name.clone(),
        _ => format!("Agent {}", agent_id),
    };
    println!("💬 {}: {}", speaker, reply.message);

    Ok(0)
}
