//! glossa CLI — the main entry point.
//!
//! Commands:
//! - `generate`  — Generate commentary for one topic
//! - `context`   — Inspect which domain context a query selects
//! - `providers` — Show the configured fallback chain
//! - `usage`     — Run a batch of topics and report which model answered
//! - `doctor`    — Diagnose configuration, context and credentials
//! - `config`    — Validate, show or locate the configuration

use clap::{Parser, Subcommand};
use glossa_config::{AppConfig, ConfigError, LoggingConfig};
use std::path::{Path, PathBuf};

mod commands;

#[derive(Parser)]
#[command(
    name = "glossa",
    about = "glossa — resilient AI commentary for generated reports",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.glossa/config.toml)
    #[arg(short, long, global = true, env = "GLOSSA_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate commentary for a topic
    Generate(commands::generate::GenerateArgs),

    /// Show the domain context selected for a set of keywords
    Context {
        /// Comma-separated keywords
        #[arg(short, long, value_delimiter = ',', required = true)]
        keywords: Vec<String>,

        /// Context budget in characters (defaults to the configured budget)
        #[arg(short, long)]
        budget: Option<usize>,
    },

    /// Show the configured fallback chain in trial order
    Providers {
        /// Run a health check against every candidate's endpoint
        #[arg(long)]
        check: bool,
    },

    /// Run one request per line of a file and report which model answered
    Usage {
        /// File with one topic per line
        #[arg(short, long)]
        topics_file: PathBuf,

        /// Comma-separated context keywords shared by every request
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration, context and credentials
    Doctor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the configuration file
    Validate,
    /// Print the effective configuration (keys redacted)
    Show,
    /// Print the configuration file path
    Path,
    /// Print a default configuration file
    Default,
}

/// Load the configuration from an explicit path, or from the default
/// location, then apply environment overrides.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides_with(|name| std::env::var(name).ok())?;
            Ok(config)
        }
        None => AppConfig::load(),
    }
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    // A broken config still gets default logging; the command reports the error.
    let logging = load_config(config_path)
        .map(|c| c.logging)
        .unwrap_or_default();
    init_logging(&logging, cli.verbose);

    match cli.command {
        Commands::Generate(args) => commands::generate::run(config_path, args).await?,
        Commands::Context { keywords, budget } => {
            commands::context::run(config_path, keywords, budget).await?
        }
        Commands::Providers { check } => commands::providers::run(config_path, check).await?,
        Commands::Usage {
            topics_file,
            keywords,
            json,
        } => commands::usage::run(config_path, &topics_file, keywords, json).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Default => commands::config_cmd::default().await?,
        },
    }

    Ok(())
}
