//! garden-stock: change notifications for the grow-a-garden shop stock.
//!
//! Each cycle reads the public stock API, normalizes it into a
//! [`StockSnapshot`], compares it with the last stored snapshot and, on a
//! material change, sends a formatted message through the configured
//! [`Notifier`](channels::Notifier).
//!
//! # Architecture
//!
//! - **Fetch**: [`garden_feed`] issues the three upstream reads concurrently
//! - **Snapshot**: [`snapshot`] normalizes and compares observations
//! - **Notify**: [`notify`] renders the message text (pure)
//! - **Dispatch**: [`Dispatcher`] owns the stored snapshot and serializes cycles
//! - **Schedule**: [`scheduler`] triggers cycles on wall-clock boundaries
//! - **Channels**: webhook / Discord delivery, the `/stock` command and the
//!   HTTP gateway

pub mod channels;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notify;
pub mod runtime;
pub mod scheduler;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::StockConfig;
pub use dispatcher::{CycleResult, Delivery, Dispatcher};
pub use error::{Result, StockError};
pub use notify::{render, render_failure};
pub use snapshot::{Category, Delta, StockItem, StockSnapshot, WeatherReport};
