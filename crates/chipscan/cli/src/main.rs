//! `chipscan` command-line front-end

use std::path::PathBuf;

use chipscan_apdu_transport_pcsc::PcscDeviceManager;
use clap::{Parser, Subcommand};
use tracing::debug;

mod commands;
mod config;

use config::{Overrides, load_config};

#[derive(Parser)]
#[command(version, about = "Authenticate NFC implants against the verification service")]
struct Cli {
    /// Configuration file (default: ~/.chipscan/chipscan.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key for the verification service
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Reader name to use (auto-detected if not specified)
    #[arg(short, long, global = true)]
    reader: Option<String>,

    /// Base URL of the verification service
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Debug level output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    List,

    /// Scan the card currently on the reader once
    Scan,

    /// Scan every card placed on the reader until interrupted
    Watch,
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let overrides = Overrides {
        api_key: cli.api_key,
        reader: cli.reader,
        base_url: cli.base_url,
    };
    let config = load_config(cli.config.as_deref(), &overrides)?;
    debug!(reader = ?config.reader, base_url = %config.base_url, "Configuration loaded");

    let manager = PcscDeviceManager::new()?;

    match cli.command {
        Commands::List => commands::list_readers(&manager),
        Commands::Scan => commands::scan_once(&manager, &config),
        Commands::Watch => commands::watch(&manager, &config),
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();
}
