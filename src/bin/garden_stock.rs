//! CLI binary for garden-stock.

use clap::{Parser, Subcommand};
use garden_stock::{Dispatcher, StockConfig, channels, render_failure};
use garden_feed::HttpStockSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Watches the grow-a-garden shop stock and posts changes to Discord.
#[derive(Parser)]
#[command(name = "garden-stock", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll on schedule and serve the HTTP and Discord surfaces (default).
    Run,

    /// Run a single cycle, print the message and exit.
    Once {
        /// Print only; do not send the notification.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("garden_stock=info,garden_feed=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = StockConfig::load(cli.config.as_deref())?;
    config.apply_env_overrides()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!("garden-stock v{}", env!("CARGO_PKG_VERSION"));
            garden_stock::runtime::run(config, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("failed to listen for ctrl-c: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await
        }
        Command::Once { dry_run } => run_once(config, dry_run).await,
    }
}

async fn run_once(config: StockConfig, dry_run: bool) -> anyhow::Result<()> {
    config.validate()?;
    let source = Arc::new(HttpStockSource::new(&config.feed)?);
    let notifier = if dry_run {
        None
    } else {
        channels::notifier_from_config(&config)?
    };
    let dispatcher = Dispatcher::new(source, notifier);

    let result = dispatcher.run_cycle().await;
    match result.render() {
        Some(content) => {
            println!("{content}");
            Ok(())
        }
        None => {
            println!("{}", render_failure());
            anyhow::bail!("cycle failed: {result:?}")
        }
    }
}
