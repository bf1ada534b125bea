//! Cairn - persistent session cache
//!
//! Main entry point for the Cairn CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod commands;

use commands::{config, delete, list, show, stats, sweep};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Cairn - inspect and maintain the persistent session cache
#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage root for all namespaces
    #[arg(long, global = true, env = "CAIRN_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory holding config.toml and logs/
    #[arg(long, global = true, env = "CAIRN_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List live sessions in a namespace
    List(list::ListArgs),

    /// Show one session, including its payload
    Show(show::ShowArgs),

    /// Delete a session
    Delete(delete::DeleteArgs),

    /// Show namespace statistics
    Stats(stats::StatsArgs),

    /// Remove expired and corrupt entries from a namespace
    Sweep(sweep::SweepArgs),

    /// Show loaded configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "cairn=debug,cairn_session=debug,cairn_config=debug,info"
    } else {
        "cairn=warn,cairn_session=warn,cairn_config=warn,error"
    };

    let log_dir = cli
        .config_dir
        .clone()
        .or_else(cairn_config::xdg_config_dir)
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    // An unwritable log directory only loses the file layer.
    let (file_writer, _guard) = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cairn")
        .filename_suffix("log")
        .build(&log_dir)
    {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Err(_) => (None, None),
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "cairn=trace,cairn_session=trace,cairn_config=trace,info",
                ))
        }))
        .init();

    let ctx = commands::Context::load(
        cli.cache_dir.as_deref(),
        cli.config_dir.as_deref(),
        cli.json,
        cli.verbose,
    )?;

    match cli.command {
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Show(args) => show::run(args, &ctx).await,
        Commands::Delete(args) => delete::run(args, &ctx).await,
        Commands::Stats(args) => stats::run(args, &ctx).await,
        Commands::Sweep(args) => sweep::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
