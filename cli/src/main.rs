//! AI Sentinel CLI
//!
//! Triage proxy logs for unsanctioned AI usage from the command line.
//!
//! # Usage
//!
//! ```bash
//! ai-sentinel analyze logs.json
//! ai-sentinel analyze logs.json --agentic --concurrency 8 --format json
//! ai-sentinel policy
//! ai-sentinel scan "Transfer to NL91ABNA0417164300"
//! ai-sentinel search "payroll export" --limit 5
//! ai-sentinel config init
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod history;
mod output;

#[derive(Parser)]
#[command(name = "ai-sentinel")]
#[command(version)]
#[command(about = "Ghost AI request triage and mitigation", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.ai-sentinel/config.toml)
    #[arg(long, short, env = "AI_SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Analysis history file (defaults to ~/.ai-sentinel/history.json)
    #[arg(long, env = "AI_SENTINEL_HISTORY")]
    history: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a JSON array of request log entries
    Analyze {
        /// Log file
        file: PathBuf,
        /// Run the agentic mitigation workflow
        #[arg(long)]
        agentic: bool,
        /// Concurrent requests (1 = sequential)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Do not record results in the history file
        #[arg(long)]
        no_history: bool,
    },
    /// Show the resolved policy store
    Policy,
    /// Scan text for sensitive data
    Scan {
        /// Text to scan
        text: String,
    },
    /// Search previously analyzed requests
    Search {
        /// Keywords to match
        query: String,
        /// Maximum records returned
        #[arg(long, short, default_value_t = 3)]
        limit: usize,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            file,
            agentic,
            concurrency,
            no_history,
        } => {
            let history = (!no_history).then_some(cli.history.as_deref());
            commands::analyze::handle(cli.config.as_deref(), history, &file, agentic, concurrency, cli.format).await
        }
        Commands::Policy => commands::policy::handle(cli.config.as_deref(), cli.format),
        Commands::Scan { text } => commands::scan::handle(cli.config.as_deref(), &text, cli.format),
        Commands::Search { query, limit } => {
            commands::search::handle(cli.history.as_deref(), &query, limit, cli.format)
        }
        Commands::Config { action } => match action {
            ConfigCommands::Show => commands::config::show(cli.config.as_deref()),
            ConfigCommands::Init { force } => commands::config::init(cli.config.as_deref(), force),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
