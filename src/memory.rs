//! In-process [`LogSource`] backed by a vector.
//!
//! [`MemoryLog`] behaves like a small event log service: the live view
//! long-polls for appends and the compacted view drops superseded revisions
//! of a document. It is meant for tests, demos and local tooling.

use std::{
    sync::{
        Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    context::Context,
    error::SourceError,
    item::{CompactedRequest, EventlogItem, LiveRequest},
    source::LogSource,
};

const WAIT_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Inner {
    items: Vec<EventlogItem>,
    last_id: i64,
    fail_live: Option<SourceError>,
    fail_compacted: Option<SourceError>,
}

/// Append-only in-memory event log.
#[derive(Debug, Default)]
pub struct MemoryLog {
    inner: Mutex<Inner>,
    appended: Condvar,
    live_calls: AtomicUsize,
    compacted_calls: AtomicUsize,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an event and returns its id. Ids start at 1.
    pub fn append(
        &self,
        doc_type: impl Into<String>,
        event: impl Into<String>,
        document: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> i64 {
        let mut inner = self.lock();
        inner.last_id += 1;
        let id = inner.last_id;
        inner.items.push(EventlogItem {
            id,
            doc_type: doc_type.into(),
            event: event.into(),
            document: document.into(),
            payload: payload.into(),
        });
        drop(inner);

        self.appended.notify_all();
        id
    }

    /// Leaves a gap of `count` ids before the next append.
    pub fn skip_ids(&self, count: i64) {
        let mut inner = self.lock();
        inner.last_id = inner.last_id.saturating_add(count);
    }

    /// Id of the most recent entry, or `None` if the log is empty.
    pub fn last_id(&self) -> Option<i64> {
        self.lock().items.last().map(|item| item.id)
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes the next live read fail with `err`.
    pub fn fail_next_live(&self, err: SourceError) {
        self.lock().fail_live = Some(err);
    }

    /// Makes the next compacted read fail with `err`.
    pub fn fail_next_compacted(&self, err: SourceError) {
        self.lock().fail_compacted = Some(err);
    }

    /// Number of live reads served, including failed ones.
    pub fn live_calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }

    /// Number of compacted reads served, including failed ones.
    pub fn compacted_calls(&self) -> usize {
        self.compacted_calls.load(Ordering::SeqCst)
    }
}

fn items_after(items: &[EventlogItem], after: i64, limit: usize) -> Vec<EventlogItem> {
    let start = items.partition_point(|item| item.id <= after);
    items[start..].iter().take(limit).cloned().collect()
}

impl LogSource for MemoryLog {
    fn fetch_live(
        &self,
        ctx: &Context,
        request: &LiveRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.lock();
        if let Some(err) = inner.fail_live.take() {
            return Err(err);
        }
        ctx.check()?;

        if request.is_latest() {
            return Ok(inner.items.last().cloned().into_iter().collect());
        }

        let wait = Duration::from_millis(u64::from(request.wait_ms.unsigned_abs()));
        let deadline = Instant::now() + wait;
        loop {
            let batch = items_after(&inner.items, request.after, request.batch_size);
            let now = Instant::now();
            if !batch.is_empty() || now >= deadline {
                return Ok(batch);
            }

            let slice = (deadline - now).min(WAIT_SLICE);
            inner = self
                .appended
                .wait_timeout(inner, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            ctx.check()?;
        }
    }

    fn fetch_compacted(
        &self,
        ctx: &Context,
        request: &CompactedRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        self.compacted_calls.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.lock();
        if let Some(err) = inner.fail_compacted.take() {
            return Err(err);
        }
        ctx.check()?;

        if request.until <= request.after {
            return Ok(Vec::new());
        }

        // Compacted as of `until`: a revision survives unless the same
        // document has a later revision before `until`.
        let visible: Vec<&EventlogItem> = inner
            .items
            .iter()
            .take_while(|item| item.id < request.until)
            .collect();
        let items = visible
            .iter()
            .enumerate()
            .filter(|(_, item)| item.id >= request.after)
            .filter(|(idx, item)| {
                !visible[idx + 1..]
                    .iter()
                    .any(|later| later.document == item.document)
            })
            .filter(|(_, item)| {
                request
                    .doc_type
                    .as_deref()
                    .is_none_or(|doc_type| item.doc_type == doc_type)
            })
            .map(|(_, item)| (*item).clone())
            .collect();

        Ok(items)
    }
}
