//! Shared test doubles for the dispatcher, command and gateway tests.

use crate::channels::{DeferredReply, Notifier};
use crate::error::StockError;
use async_trait::async_trait;
use garden_feed::{Endpoint, FeedError, RawPayload, StockSource};
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Build a payload with the given seed and egg listings and no gear.
pub fn payload(seeds: &[(&str, &str)], eggs: &[(&str, &str)]) -> RawPayload {
    let to_map = |entries: &[(&str, &str)]| {
        entries
            .iter()
            .map(|(name, qty)| ((*name).to_owned(), Value::String((*qty).to_owned())))
            .collect::<Map<String, Value>>()
    };
    RawPayload {
        stock: json!({ "gear": {}, "seeds": to_map(seeds) }),
        eggs: json!({ "egg": to_map(eggs) }),
        weather: json!({ "weather": "Sunny", "temp": "21" }),
    }
}

/// Source that replays a fixed script of payloads, one per fetch.
///
/// Once the script is exhausted every fetch fails.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<RawPayload, FeedError>>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<RawPayload, FeedError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delay: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of observations fetched so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockSource for ScriptedSource {
    async fn fetch_endpoint(&self, endpoint: Endpoint) -> garden_feed::Result<Value> {
        Err(FeedError::Http(format!("{endpoint} is not scripted")))
    }

    async fn fetch_payload(&self) -> garden_feed::Result<RawPayload> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(FeedError::Http("script exhausted".into())))
    }
}

/// Notifier that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    /// Sleep for `delay` inside every send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A notifier whose every send fails after being counted.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock").clone()
    }

    /// Send attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, content: &str) -> crate::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StockError::Send("recording notifier set to fail".into()));
        }
        self.sent.lock().expect("sent lock").push(content.to_owned());
        Ok(())
    }
}

/// Events observed by a [`RecordingReply`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    Acknowledged,
    Completed(String),
}

/// Deferred reply that records acknowledge/complete calls into a shared log.
pub struct RecordingReply {
    log: Arc<Mutex<Vec<ReplyEvent>>>,
    fail_acknowledge: bool,
}

impl RecordingReply {
    pub fn new() -> (Self, Arc<Mutex<Vec<ReplyEvent>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&log),
                fail_acknowledge: false,
            },
            log,
        )
    }

    /// Make `acknowledge` fail without recording an event.
    pub fn failing_acknowledge(mut self) -> Self {
        self.fail_acknowledge = true;
        self
    }
}

#[async_trait]
impl DeferredReply for RecordingReply {
    async fn acknowledge(&mut self) -> crate::Result<()> {
        if self.fail_acknowledge {
            return Err(StockError::Send("interaction expired".into()));
        }
        self.log.lock().expect("log lock").push(ReplyEvent::Acknowledged);
        Ok(())
    }

    async fn complete(self: Box<Self>, content: String) -> crate::Result<()> {
        self.log
            .lock()
            .expect("log lock")
            .push(ReplyEvent::Completed(content));
        Ok(())
    }
}
