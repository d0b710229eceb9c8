//! Scheduler background loop.
//!
//! Spawns a tokio task that runs one dispatcher cycle per tick. Cycles run
//! inline, so a slow cycle delays the next tick instead of overlapping it.

use crate::dispatcher::{CycleResult, Delivery, Dispatcher};
use crate::scheduler::ScheduleConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives [`Dispatcher::run_cycle`] on a fixed schedule.
pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ScheduleConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Start the loop on the current runtime.
    ///
    /// The loop exits at the next tick after `cancel` fires. A cycle that is
    /// already running is allowed to finish.
    pub fn run(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        self.run_from(chrono::Utc::now(), cancel)
    }

    /// Like [`Scheduler::run`], aligning the first cycle as if started at `now`.
    fn run_from(
        self,
        now: chrono::DateTime<chrono::Utc>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let first = self.config.first_delay(now);
            info!(schedule = %self.config, first_run_in = ?first, "scheduler started");

            let period = self.config.interval().max(Duration::from_secs(1));
            let mut interval = tokio::time::interval_at(Instant::now() + first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
                debug!("scheduled cycle triggered");
                let result = self.dispatcher.run_cycle().await;
                log_cycle(&result);
            }
            info!("scheduler stopped");
        })
    }
}

fn log_cycle(result: &CycleResult) {
    match result {
        CycleResult::Failed(reason) => warn!(outcome = result.outcome(), %reason, "scheduled cycle failed"),
        CycleResult::Unchanged { .. } => debug!(outcome = result.outcome(), "scheduled cycle finished"),
        _ => {
            let sent = matches!(result.delivery(), Some(Delivery::Sent));
            info!(
                outcome = result.outcome(),
                deltas = result.deltas().len(),
                sent,
                "scheduled cycle finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::channels::Notifier;
    use crate::scheduler::Alignment;
    use crate::test_utils::{RecordingNotifier, ScriptedSource, payload};

    fn free_running(interval_secs: u64) -> ScheduleConfig {
        ScheduleConfig {
            interval_secs,
            alignment: Alignment::FreeRunning,
            settle_secs: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn free_running_ticks_every_interval() {
        let p = payload(&[("Carrot", "5")], &[]);
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(p.clone()),
            Ok(p.clone()),
            Ok(p.clone()),
            Ok(p),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Arc::new(Dispatcher::new(
            source.clone(),
            Some(notifier.clone() as Arc<dyn Notifier>),
        ));

        let cancel = CancellationToken::new();
        let handle = Scheduler::new(dispatcher, free_running(300)).run(cancel.clone());

        tokio::time::sleep(Duration::from_secs(650)).await;
        cancel.cancel();
        handle.await.expect("scheduler task");

        // Ticks at 0s, 300s and 600s; only the first one notifies.
        assert_eq!(source.fetches(), 3);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_first_tick_runs_nothing() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let dispatcher = Arc::new(Dispatcher::new(source.clone(), None));
        let config = ScheduleConfig {
            interval_secs: 3600,
            alignment: Alignment::WallClock,
            settle_secs: 5,
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let handle = Scheduler::new(dispatcher, config).run(cancel);
        handle.await.expect("scheduler task");
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycles_do_not_stop_the_loop() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(garden_feed::FeedError::Http("connection reset".into())),
            Ok(payload(&[("Carrot", "1")], &[])),
        ]));
        let dispatcher = Arc::new(Dispatcher::new(source.clone(), None));

        let cancel = CancellationToken::new();
        let handle = Scheduler::new(dispatcher, free_running(60)).run(cancel.clone());
        tokio::time::sleep(Duration::from_secs(90)).await;
        cancel.cancel();
        handle.await.expect("scheduler task");
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_waits_for_boundary_then_repeats() {
        use chrono::TimeZone;

        let p = payload(&[("Carrot", "5")], &[]);
        let source = Arc::new(ScriptedSource::new(vec![Ok(p.clone()), Ok(p.clone()), Ok(p)]));
        let dispatcher = Arc::new(Dispatcher::new(source.clone(), None));
        let config = ScheduleConfig {
            interval_secs: 300,
            alignment: Alignment::WallClock,
            settle_secs: 5,
        };
        // 12:03:30 → next boundary 12:05:00, plus settle: first cycle at +95s.
        let started = chrono::Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 3, 30)
            .single()
            .expect("timestamp");

        let cancel = CancellationToken::new();
        let handle = Scheduler::new(dispatcher, config).run_from(started, cancel.clone());

        tokio::time::sleep(Duration::from_secs(94)).await;
        assert_eq!(source.fetches(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(298)).await;
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.fetches(), 2);

        cancel.cancel();
        handle.await.expect("scheduler task");
    }
}
