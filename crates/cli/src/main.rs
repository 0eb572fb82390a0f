//! StateBench CLI: the main entry point.
//!
//! Commands:
//! - `replay`: replay timelines through a strategy and print the prompts
//! - `strategies`: list registered memory strategies
//! - `tracks`: list benchmark tracks
//! - `config`: show or initialize configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::replay::{OutputFormat, ReplayArgs};

#[derive(Parser)]
#[command(
    name = "statebench",
    about = "StateBench: state-correctness benchmark driver",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay JSONL timelines and print the prompt produced at each query
    Replay {
        /// Timeline file (defaults to run.data from the config)
        file: Option<PathBuf>,

        /// Memory strategy to use
        #[arg(short, long)]
        strategy: Option<String>,

        /// Only replay these tracks (repeatable)
        #[arg(short, long = "track")]
        tracks: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List registered memory strategies
    Strategies,

    /// List benchmark tracks
    Tracks,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            file,
            strategy,
            tracks,
            format,
        } => {
            commands::replay::run(ReplayArgs {
                file,
                strategy,
                tracks,
                format,
            })
            .await?
        }
        Commands::Strategies => commands::strategies::run().await?,
        Commands::Tracks => commands::tracks::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
