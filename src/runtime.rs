//! Process wiring: config → collaborators → background tasks → shutdown.

use crate::channels::{self, DiscordAdapter, GatewayState};
use crate::config::StockConfig;
use crate::dispatcher::Dispatcher;
use crate::scheduler::Scheduler;
use garden_feed::{HttpStockSource, StockSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Run the service until `shutdown` resolves.
///
/// Starts the scheduler, the HTTP gateway (when enabled) and the Discord
/// command gateway (when a bot token is set), then waits. On shutdown the
/// tasks are cancelled and awaited; an in-flight cycle finishes first.
///
/// # Errors
///
/// Returns an error for invalid configuration, or if the HTTP gateway
/// fails while running.
pub async fn run(config: StockConfig, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    config.validate()?;
    if !config.has_notification_target() {
        tracing::warn!("neither a webhook nor a bot channel is configured");
    }

    let source: Arc<dyn StockSource> = Arc::new(HttpStockSource::new(&config.feed)?);
    let notifier = channels::notifier_from_config(&config)?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&source), notifier));

    let cancel = CancellationToken::new();
    let mut workers: JoinSet<anyhow::Result<()>> = JoinSet::new();

    let scheduler = Scheduler::new(Arc::clone(&dispatcher), config.schedule.clone());
    let scheduler_handle = scheduler.run(cancel.child_token());
    workers.spawn(async move {
        scheduler_handle.await?;
        Ok(())
    });

    if config.server.enabled {
        let state = GatewayState {
            dispatcher: Arc::clone(&dispatcher),
            source: Arc::clone(&source),
        };
        let host = config.server.host.clone();
        let port = config.server.port;
        let cancel = cancel.child_token();
        workers.spawn(async move { channels::run_gateway(&host, port, state, cancel).await });
    }

    if config.discord.register_commands && config.discord.token().is_some() {
        let timeout = Duration::from_secs(config.notify.send_timeout_secs);
        let adapter = Arc::new(DiscordAdapter::new(&config.discord, timeout)?);
        let dispatcher = Arc::clone(&dispatcher);
        let cancel = cancel.child_token();
        workers.spawn(async move {
            channels::run_discord_supervised(adapter, dispatcher, cancel).await;
            Ok(())
        });
    }

    tracing::info!(tasks = workers.len(), "garden-stock started");

    let mut failure = None;
    tokio::select! {
        () = shutdown => tracing::info!("shutdown requested"),
        Some(joined) = workers.join_next() => {
            failure = worker_error(joined);
        }
    }

    cancel.cancel();
    while let Some(joined) = workers.join_next().await {
        if let Some(err) = worker_error(joined) {
            failure.get_or_insert(err);
        }
    }
    tracing::info!("garden-stock stopped");

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn worker_error(
    joined: Result<anyhow::Result<()>, tokio::task::JoinError>,
) -> Option<anyhow::Error> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(err)) => {
            tracing::error!("background task failed: {err}");
            Some(err)
        }
        Err(err) => {
            tracing::error!("background task panicked: {err}");
            Some(err.into())
        }
    }
}
