//! Cycle orchestration: fetch → normalize → compare → format → send.
//!
//! The [`Dispatcher`] is the single owner of the last known snapshot. Every
//! trigger (scheduler tick, HTTP call, chat command) goes through
//! [`Dispatcher::run_cycle`], which is single-flight: a caller that arrives
//! while a cycle is running waits for it and shares its result instead of
//! starting a second fetch.

use crate::channels::Notifier;
use crate::error::StockError;
use crate::notify::render;
use crate::snapshot::{Delta, StockSnapshot, diff, materially_equal, normalize};
use garden_feed::StockSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// What happened to the notification produced by a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The transport accepted the message.
    Sent,
    /// No notification target is configured.
    Skipped,
    /// The transport failed; the snapshot was still advanced.
    Failed(String),
}

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResult {
    /// First successful observation; stored and announced without deltas.
    Initialized {
        snapshot: Arc<StockSnapshot>,
        delivery: Delivery,
    },
    /// Upstream matches the stored snapshot. `snapshot` is the fresh read.
    Unchanged { snapshot: Arc<StockSnapshot> },
    /// Material change; stored snapshot replaced and announced with deltas.
    Updated {
        snapshot: Arc<StockSnapshot>,
        deltas: Vec<Delta>,
        delivery: Delivery,
    },
    /// Fetch or normalization failed; stored snapshot untouched.
    Failed(String),
}

impl CycleResult {
    /// Short machine-readable outcome name.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "initialized",
            Self::Unchanged { .. } => "unchanged",
            Self::Updated { .. } => "updated",
            Self::Failed(_) => "failed",
        }
    }

    /// Snapshot observed by this cycle, if the read succeeded.
    pub fn snapshot(&self) -> Option<&Arc<StockSnapshot>> {
        match self {
            Self::Initialized { snapshot, .. }
            | Self::Unchanged { snapshot }
            | Self::Updated { snapshot, .. } => Some(snapshot),
            Self::Failed(_) => None,
        }
    }

    /// Deltas announced by this cycle (empty unless `Updated`).
    pub fn deltas(&self) -> &[Delta] {
        match self {
            Self::Updated { deltas, .. } => deltas,
            _ => &[],
        }
    }

    /// Delivery status, when the cycle produced a notification.
    pub fn delivery(&self) -> Option<&Delivery> {
        match self {
            Self::Initialized { delivery, .. } | Self::Updated { delivery, .. } => Some(delivery),
            _ => None,
        }
    }

    /// Render the observed state the same way the notification does.
    ///
    /// Returns `None` for a failed cycle.
    pub fn render(&self) -> Option<String> {
        self.snapshot()
            .map(|snapshot| render(snapshot, Some(self.deltas())))
    }
}

#[derive(Default)]
struct CycleState {
    last: Option<Arc<StockSnapshot>>,
    last_result: Option<CycleResult>,
}

/// Owns the last known snapshot and runs serialized cycles.
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    source: Arc<dyn StockSource>,
    notifier: Option<Arc<dyn Notifier>>,
    state: Mutex<CycleState>,
    /// Incremented under `state` each time a cycle completes.
    completed: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher. A `None` notifier disables sending.
    pub fn new(source: Arc<dyn StockSource>, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                source,
                notifier,
                state: Mutex::new(CycleState::default()),
                completed: AtomicU64::new(0),
            }),
        }
    }

    /// Whether a notification target is configured.
    pub fn has_notifier(&self) -> bool {
        self.inner.notifier.is_some()
    }

    /// Run one cycle, or join the cycle already in flight.
    ///
    /// The cycle runs on its own task: dropping the returned future stops
    /// the wait, not the cycle, so a stored change is always delivered.
    pub async fn run_cycle(&self) -> CycleResult {
        let seen = self.inner.completed.load(Ordering::Acquire);
        let inner = Arc::clone(&self.inner);
        match tokio::spawn(async move { inner.run_guarded(seen).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "cycle task aborted");
                CycleResult::Failed(format!("cycle task aborted: {e}"))
            }
        }
    }
}

impl DispatcherInner {
    async fn run_guarded(&self, seen: u64) -> CycleResult {
        let mut state = self.state.lock().await;

        if self.completed.load(Ordering::Acquire) != seen
            && let Some(result) = state.last_result.clone()
        {
            debug!(outcome = result.outcome(), "joined in-flight cycle");
            return result;
        }

        let result = self.execute(&mut state).await;
        state.last_result = Some(result.clone());
        self.completed.fetch_add(1, Ordering::Release);
        result
    }

    async fn execute(&self, state: &mut CycleState) -> CycleResult {
        let payload = match self.source.fetch_payload().await {
            Ok(payload) => payload,
            Err(e) => {
                let err = StockError::from(e);
                warn!(error = %err, "stock fetch failed");
                return CycleResult::Failed(err.to_string());
            }
        };

        let snapshot = match normalize(&payload, chrono::Utc::now()) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!(error = %e, "stock payload rejected");
                return CycleResult::Failed(e.to_string());
            }
        };

        let Some(previous) = state.last.clone() else {
            state.last = Some(Arc::clone(&snapshot));
            info!(items = snapshot.item_count(), "first stock snapshot stored");
            let delivery = self.deliver(&render(&snapshot, None)).await;
            return CycleResult::Initialized { snapshot, delivery };
        };

        if materially_equal(&previous, &snapshot) {
            debug!("stock unchanged");
            return CycleResult::Unchanged { snapshot };
        }

        let deltas = diff(&previous, &snapshot);
        state.last = Some(Arc::clone(&snapshot));
        info!(deltas = deltas.len(), "stock changed");
        let delivery = self.deliver(&render(&snapshot, Some(&deltas))).await;
        CycleResult::Updated {
            snapshot,
            deltas,
            delivery,
        }
    }

    async fn deliver(&self, content: &str) -> Delivery {
        let Some(notifier) = &self.notifier else {
            debug!("no notification target configured; skipping send");
            return Delivery::Skipped;
        };
        match notifier.send(content).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                error!(channel = notifier.id(), error = %e, "notification delivery failed");
                Delivery::Failed(e.to_string())
            }
        }
    }
}
