//! Error types for the garden-feed crate.
//!
//! Messages are stable and safe to show to users; they never contain
//! response bodies beyond a short status line.

/// Errors that can occur while reading the upstream stock API.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The upstream answered with a non-success status code.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Endpoint that was queried.
        endpoint: String,
        /// Status code returned by the upstream.
        status: u16,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body was not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid feed configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl FeedError {
    /// Classify a transport-level [`reqwest::Error`] for the given endpoint.
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(endpoint.to_owned())
        } else if err.is_decode() {
            Self::Decode(format!("{endpoint}: {err}"))
        } else {
            Self::Http(format!("{endpoint}: {err}"))
        }
    }
}

/// Convenience type alias for garden-feed results.
pub type Result<T> = std::result::Result<T, FeedError>;
