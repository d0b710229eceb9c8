//! Notification content.

pub mod format;

pub use format::{MAX_MESSAGE_CHARS, clamp_to_limit, render, render_failure};
