//! Cycle scheduling.
//!
//! [`schedule`] holds the pure timing arithmetic; [`runner`] drives the
//! dispatcher from a tokio interval.

pub mod runner;
pub mod schedule;

pub use runner::Scheduler;
pub use schedule::{Alignment, ScheduleConfig, delay_until_next_boundary};
