//! Upstream fetch collaborator.
//!
//! [`StockSource`] is the seam the dispatcher depends on; [`HttpStockSource`]
//! is the production implementation backed by [`reqwest`].

use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::http::build_client;
use crate::types::{Endpoint, RawPayload};
use async_trait::async_trait;

/// A source of raw stock documents.
///
/// All implementations must be `Send + Sync` so one source can be shared
/// between the scheduler, the HTTP gateway and the chat command handler.
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Fetch a single upstream document as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure, timeout, non-2xx status
    /// or a body that is not JSON.
    async fn fetch_endpoint(&self, endpoint: Endpoint) -> Result<serde_json::Value>;

    /// Fetch every document needed for one observation.
    ///
    /// The three reads are issued concurrently. Any failure fails the whole
    /// payload so callers never see a partial observation.
    async fn fetch_payload(&self) -> Result<RawPayload> {
        let (stock, eggs, weather) = futures::try_join!(
            self.fetch_endpoint(Endpoint::GearSeeds),
            self.fetch_endpoint(Endpoint::Eggs),
            self.fetch_endpoint(Endpoint::Weather),
        )?;
        Ok(RawPayload {
            stock,
            eggs,
            weather,
        })
    }
}

/// [`StockSource`] that reads the public stock API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStockSource {
    client: reqwest::Client,
    base: url::Url,
}

impl HttpStockSource {
    /// Create a source from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] for an invalid config, or
    /// [`FeedError::Http`] if the client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        config.validate()?;
        let base = url::Url::parse(&config.base_url)
            .map_err(|e| FeedError::Config(format!("invalid base_url: {e}")))?;
        Ok(Self {
            client: build_client(config)?,
            base,
        })
    }
}

#[async_trait]
impl StockSource for HttpStockSource {
    async fn fetch_endpoint(&self, endpoint: Endpoint) -> Result<serde_json::Value> {
        let ts = chrono::Utc::now().timestamp_millis();
        let url = endpoint
            .url(&self.base, ts)
            .map_err(|e| FeedError::Config(format!("cannot build {endpoint} url: {e}")))?;

        tracing::debug!(%endpoint, "fetching upstream document");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(endpoint.name(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                endpoint: endpoint.name().to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FeedError::from_reqwest(endpoint.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        calls: AtomicUsize,
        fail: Option<Endpoint>,
    }

    #[async_trait]
    impl StockSource for StaticSource {
        async fn fetch_endpoint(&self, endpoint: Endpoint) -> Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail == Some(endpoint) {
                return Err(FeedError::Status {
                    endpoint: endpoint.name().to_owned(),
                    status: 500,
                });
            }
            Ok(json!({ "endpoint": endpoint.name() }))
        }
    }

    #[tokio::test]
    async fn default_payload_joins_all_endpoints() {
        let source = StaticSource {
            calls: AtomicUsize::new(0),
            fail: None,
        };
        let payload = source.fetch_payload().await.expect("payload");
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(payload.stock["endpoint"], "gear-seeds");
        assert_eq!(payload.eggs["endpoint"], "egg");
        assert_eq!(payload.weather["endpoint"], "weather");
    }

    #[tokio::test]
    async fn any_endpoint_failure_fails_payload() {
        let source = StaticSource {
            calls: AtomicUsize::new(0),
            fail: Some(Endpoint::Weather),
        };
        let err = source.fetch_payload().await.unwrap_err();
        assert!(err.to_string().contains("weather"));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = FeedConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(HttpStockSource::new(&config).is_err());
    }
}
