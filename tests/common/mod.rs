#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use logfollow::{
    CompactedRequest, Context, EventlogItem, FollowerMetrics, LiveRequest, LogSource, MemoryLog,
    SourceError,
};

/// Installs a test subscriber so `RUST_LOG=logfollow=debug` shows follower logs.
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a log with `count` articles, ids `1..=count`.
pub fn article_log(count: usize) -> MemoryLog {
    let log = MemoryLog::new();
    for n in 0..count {
        log.append("article", "document", format!("doc-{n}"), "");
    }
    log
}

pub fn ids(items: &[EventlogItem]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

/// Log source wrapper that records every request it forwards.
#[derive(Debug, Default)]
pub struct RecordingSource {
    pub log: MemoryLog,
    live: Mutex<Vec<LiveRequest>>,
    compacted: Mutex<Vec<CompactedRequest>>,
    latest_delay: Option<Duration>,
    latest_calls: AtomicUsize,
}

impl RecordingSource {
    pub fn new(log: MemoryLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Slows down boundary reads so concurrent callers overlap.
    pub fn with_latest_delay(mut self, delay: Duration) -> Self {
        self.latest_delay = Some(delay);
        self
    }

    pub fn live_requests(&self) -> Vec<LiveRequest> {
        self.live.lock().unwrap().clone()
    }

    pub fn compacted_requests(&self) -> Vec<CompactedRequest> {
        self.compacted.lock().unwrap().clone()
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }
}

impl LogSource for RecordingSource {
    fn fetch_live(
        &self,
        ctx: &Context,
        request: &LiveRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        if request.is_latest() {
            self.latest_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.latest_delay {
                thread::sleep(delay);
            }
        }
        self.live.lock().unwrap().push(*request);
        self.log.fetch_live(ctx, request)
    }

    fn fetch_compacted(
        &self,
        ctx: &Context,
        request: &CompactedRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        self.compacted.lock().unwrap().push(request.clone());
        self.log.fetch_compacted(ctx, request)
    }
}

/// Metrics sink that keeps every observation.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    observations: Mutex<Vec<(String, String, i64)>>,
}

impl RecordingMetrics {
    pub fn observations(&self) -> Vec<(String, String, i64)> {
        self.observations.lock().unwrap().clone()
    }
}

impl FollowerMetrics for RecordingMetrics {
    fn observe(&self, follower: &str, mode: &str, position: i64) {
        self.observations
            .lock()
            .unwrap()
            .push((follower.to_string(), mode.to_string(), position));
    }
}
