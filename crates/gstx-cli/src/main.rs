//! CLI client for the GST invoice extraction service.

mod clipboard;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, extract, history, show, stats, ConfigSource};

/// GST invoice extractor - Turn Indian GST invoices into structured data
#[derive(Parser)]
#[command(name = "gstx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the extraction service
    #[arg(long, global = true, env = "GSTX_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract invoice data from an image or text
    Extract(extract::ExtractArgs),

    /// Submit multiple invoice images
    Batch(batch::BatchArgs),

    /// Show an extracted invoice
    Show(show::ShowArgs),

    /// Browse, delete and download past extractions
    History(history::HistoryArgs),

    /// Show service-wide extraction stats
    Stats(stats::StatsArgs),

    /// Check that the extraction service is reachable
    Health(stats::HealthArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let source = ConfigSource {
        path: cli.config.as_deref(),
        api_url: cli.api_url.as_deref(),
    };

    match cli.command {
        Commands::Extract(args) => extract::run(args, source).await,
        Commands::Batch(args) => batch::run(args, source).await,
        Commands::Show(args) => show::run(args, source).await,
        Commands::History(args) => history::run(args, source).await,
        Commands::Stats(args) => stats::run(args, source).await,
        Commands::Health(args) => stats::health(args, source).await,
        Commands::Config(args) => config::run(args, source.path).await,
    }
}
