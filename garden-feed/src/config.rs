//! Feed configuration with sensible defaults.

use crate::error::FeedError;
use serde::{Deserialize, Serialize};

/// Public upstream serving the stock, egg and weather documents.
pub const DEFAULT_BASE_URL: &str = "https://growagardenstock.com";

/// Configuration for the upstream stock API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Scheme and host of the upstream API, without a trailing path.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. `None` uses the crate default.
    pub user_agent: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_seconds: 10,
            user_agent: None,
        }
    }
}

impl FeedConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` must be greater than 0
    /// - `base_url` must be an absolute `http`/`https` URL
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.timeout_seconds == 0 {
            return Err(FeedError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| FeedError::Config(format!("invalid base_url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FeedError::Config(format!(
                "base_url must use http or https, got {}",
                parsed.scheme()
            )));
        }
        Ok(())
    }
}
