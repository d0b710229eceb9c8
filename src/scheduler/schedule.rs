use crate::error::{Result, StockError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How cycle start times are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// First cycle immediately, then every interval from there.
    FreeRunning,
    /// Cycles start on epoch multiples of the interval (…:00, …:05, …)
    /// plus a settle delay, tracking upstream restock boundaries.
    #[default]
    WallClock,
}

/// Cycle timing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between cycles.
    pub interval_secs: u64,
    pub alignment: Alignment,
    /// Extra wait after a wall-clock boundary so upstream has refreshed.
    pub settle_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            alignment: Alignment::WallClock,
            settle_secs: 5,
        }
    }
}

impl std::fmt::Display for ScheduleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.interval_secs;
        if secs >= 3600 && secs % 3600 == 0 {
            write!(f, "every {} hours", secs / 3600)?;
        } else if secs >= 60 && secs % 60 == 0 {
            write!(f, "every {} minutes", secs / 60)?;
        } else {
            write!(f, "every {secs} seconds")?;
        }
        match self.alignment {
            Alignment::FreeRunning => f.write_str(", free-running"),
            Alignment::WallClock => write!(f, " on the clock (+{}s settle)", self.settle_secs),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    /// Delay before the first cycle when starting at `now`.
    pub fn first_delay(&self, now: DateTime<Utc>) -> Duration {
        match self.alignment {
            Alignment::FreeRunning => Duration::ZERO,
            Alignment::WallClock => delay_until_next_boundary(now, self.interval(), self.settle()),
        }
    }

    /// # Errors
    ///
    /// Returns [`StockError::Config`] for a zero interval, or a settle delay
    /// that is not shorter than the interval.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(StockError::Config(
                "schedule.interval_secs must be greater than zero".to_owned(),
            ));
        }
        if self.settle_secs >= self.interval_secs {
            return Err(StockError::Config(format!(
                "schedule.settle_secs ({}) must be shorter than the interval ({})",
                self.settle_secs, self.interval_secs
            )));
        }
        Ok(())
    }
}

/// Time from `now` to the next epoch multiple of `interval`, plus `settle`.
///
/// Exactly on a boundary the boundary wait is zero.
pub fn delay_until_next_boundary(
    now: DateTime<Utc>,
    interval: Duration,
    settle: Duration,
) -> Duration {
    let period = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX).max(1);
    let into_period = now.timestamp_millis().rem_euclid(period);
    let to_boundary = if into_period == 0 {
        0
    } else {
        period - into_period
    };
    Duration::from_millis(u64::try_from(to_boundary).unwrap_or(0)) + settle
}
