//! External communication channels (webhook, Discord, HTTP gateway).
//!
//! Outbound notifications go through the [`Notifier`] trait; at most one
//! transport is active. Inbound requests (the `/stock` command and the HTTP
//! routes) all end in [`Dispatcher::run_cycle`].

pub mod discord;
pub mod gateway;
pub mod traits;
pub mod webhook;

pub use discord::DiscordAdapter;
pub use gateway::{GatewayState, run_gateway};
pub use traits::{DeferredReply, Notifier};
pub use webhook::WebhookNotifier;

use crate::config::StockConfig;
use crate::dispatcher::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Initial restart delay for a failed gateway connection.
const INITIAL_BACKOFF_SECS: u64 = 2;
/// Restart delay ceiling.
const MAX_BACKOFF_SECS: u64 = 60;

/// Choose the notification transport: webhook first, then the bot channel.
///
/// Returns `None` when neither is configured; cycles then log and skip.
///
/// # Errors
///
/// Returns an error if the selected transport cannot be constructed.
pub fn notifier_from_config(config: &StockConfig) -> crate::Result<Option<Arc<dyn Notifier>>> {
    let timeout = Duration::from_secs(config.notify.send_timeout_secs);
    if let Some(url) = &config.notify.webhook_url {
        tracing::info!("notifications via webhook");
        return Ok(Some(Arc::new(WebhookNotifier::new(url.clone(), timeout)?)));
    }
    if config.discord.token().is_some() && config.discord.channel_id.is_some() {
        tracing::info!("notifications via discord bot channel");
        return Ok(Some(Arc::new(DiscordAdapter::new(&config.discord, timeout)?)));
    }
    tracing::warn!("no notification target configured; changes will only be logged");
    Ok(None)
}

/// Keep the Discord gateway connected until `cancel` fires.
///
/// Every disconnect is retried, backing off from 2s up to 60s.
pub async fn run_discord_supervised(
    adapter: Arc<DiscordAdapter>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) {
    let mut backoff_secs = INITIAL_BACKOFF_SECS;
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            result = adapter.run(Arc::clone(&dispatcher)) => {
                match result {
                    Ok(()) => tracing::warn!("discord gateway stopped; restarting"),
                    Err(err) => tracing::warn!(
                        "discord gateway failed: {err}; retrying in {backoff_secs}s"
                    ),
                }
            }
        }
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
        }
        backoff_secs = next_backoff(backoff_secs);
    }
    tracing::info!("discord gateway supervisor stopped");
}

fn next_backoff(current: u64) -> u64 {
    current.saturating_mul(2).min(MAX_BACKOFF_SECS)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let mut delay = INITIAL_BACKOFF_SECS;
        let mut seen = vec![delay];
        for _ in 0..6 {
            delay = next_backoff(delay);
            seen.push(delay);
        }
        assert_eq!(seen, [2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn no_target_means_no_notifier() {
        let config = StockConfig::default();
        assert!(notifier_from_config(&config).expect("notifier").is_none());
    }

    #[test]
    fn webhook_takes_precedence_over_bot() {
        let mut config = StockConfig::default();
        config.notify.webhook_url = Some("https://discord.test/api/webhooks/1/x".to_owned());
        config.discord.bot_token = Some("token".to_owned());
        config.discord.channel_id = Some("123".to_owned());
        let notifier = notifier_from_config(&config).expect("notifier").expect("some");
        assert_eq!(notifier.id(), "webhook");
    }

    #[test]
    fn bot_channel_used_without_webhook() {
        let mut config = StockConfig::default();
        config.discord.bot_token = Some("token".to_owned());
        config.discord.channel_id = Some("123".to_owned());
        let notifier = notifier_from_config(&config).expect("notifier").expect("some");
        assert_eq!(notifier.id(), "discord");
    }

    #[test]
    fn bot_without_channel_is_not_a_notifier() {
        let mut config = StockConfig::default();
        config.discord.bot_token = Some("token".to_owned());
        assert!(notifier_from_config(&config).expect("notifier").is_none());
    }
}
