//! CodeLore CLI - Knowledge graph construction from source facts
//!
//! A command-line interface for building a repository knowledge graph from
//! extracted per-file facts, persisting it, and inspecting the result.
//!
//! # Usage
//!
//! ```bash
//! # Build the graph from a fact bundle or a directory of fact records
//! codelore build --facts facts/
//!
//! # Inspect one node
//! codelore show src/auth/login.ts
//!
//! # Node counts per type
//! codelore stats --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use codelore_config::LogFormat;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

/// CodeLore - Repository knowledge graphs with structural metrics
#[derive(Parser, Debug)]
#[command(name = "codelore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Workspace root directory (defaults to the current directory)
    #[arg(long, short = 'w', global = true, env = "CODELORE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "CODELORE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> codelore_config::ConfigOverrides {
        let log_level = if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        };

        codelore_config::ConfigOverrides {
            log_level,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the knowledge graph from fact files and persist it
    Build(commands::build::BuildArgs),

    /// Show one persisted node
    Show(commands::show::ShowArgs),

    /// Show node and edge counts of the persisted graph
    Stats(commands::stats::StatsArgs),

    /// View and initialize configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the global tracing subscriber, writing to stderr.
fn init_tracing(level: Level, format: LogFormat) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(builder.with_ansi(true).finish())?
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags win; otherwise the configured level, when the config loads at all.
    // A broken config is reported by the command itself.
    let logging = commands::configured_logging(&cli.global);
    let log_level = if cli.global.quiet {
        Level::ERROR
    } else if cli.global.verbose {
        Level::DEBUG
    } else {
        logging
            .as_ref()
            .and_then(|l| l.level.parse().ok())
            .unwrap_or(Level::INFO)
    };
    let log_format = logging.map(|l| l.format).unwrap_or_default();
    init_tracing(log_level, log_format)?;

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.global).await,
        Commands::Show(args) => commands::show::execute(args, cli.global).await,
        Commands::Stats(args) => commands::stats::execute(args, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}
