//! # garden-feed
//!
//! Client for the public grow-a-garden stock API.
//!
//! The API publishes three JSON documents: gear/seed shop stock, egg shop
//! stock and the current weather. None of them is versioned, so this crate
//! deliberately stops at raw JSON; turning a [`RawPayload`] into typed data is
//! the caller's job.
//!
//! ## Design
//!
//! - One shared [`reqwest::Client`] with a bounded per-request timeout
//! - Every request carries a millisecond cache-busting query parameter
//! - The three documents are fetched concurrently and fail together
//! - No authentication, no retries: one observation is one attempt

pub mod config;
pub mod error;
pub mod http;
pub mod source;
pub mod types;

pub use config::FeedConfig;
pub use error::{FeedError, Result};
pub use source::{HttpStockSource, StockSource};
pub use types::{Endpoint, RawPayload};
