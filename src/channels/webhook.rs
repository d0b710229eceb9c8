use crate::channels::traits::Notifier;
use crate::error::StockError;
use crate::notify::{MAX_MESSAGE_CHARS, clamp_to_limit};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Notifier that posts `{"content": …}` to a Discord-style webhook URL.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a webhook notifier whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Config`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::Config(format!("failed to build webhook client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn id(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, content: &str) -> crate::Result<()> {
        let body = json!({
            "content": clamp_to_limit(content, MAX_MESSAGE_CHARS)
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StockError::Send(format!("webhook request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::Send(format!(
                "webhook send failed ({status}): {body}"
            )));
        }
        tracing::debug!(channel = self.id(), "notification delivered");
        Ok(())
    }
}
