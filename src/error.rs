//! Error types for the stock watcher.

/// Top-level error type for the stock watcher.
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// Upstream read failed (network, timeout, non-2xx, malformed JSON).
    #[error("fetch error: {0}")]
    Fetch(#[from] garden_feed::FeedError),

    /// Upstream payload is missing its required shape.
    #[error("normalization error: {0}")]
    Normalization(String),

    /// Notification transport failed to deliver a message.
    #[error("send error: {0}")]
    Send(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, StockError>;
