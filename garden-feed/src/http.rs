//! Shared HTTP client for upstream requests.

use crate::config::FeedConfig;
use crate::error::FeedError;
use std::time::Duration;

/// User-Agent sent when the config does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("garden-stock/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for the stock API.
///
/// The client has:
/// - Timeout from config (applies to connect + body)
/// - Configured or default User-Agent
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`FeedError::Http`] if the client cannot be constructed.
pub fn build_client(config: &FeedConfig) -> Result<reqwest::Client, FeedError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| FeedError::Http(format!("failed to build HTTP client: {e}")))
}
