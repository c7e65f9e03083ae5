//! Log follower that replays the compacted log and then tails the live log.
//!
//! On first use the follower reads the last entry of the live log. That id is
//! the boundary between history and the live tail. Until the follower reaches
//! it, batches come from the compacted log in fixed-size id windows; from then
//! on they come from long-polling the live log.

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::{
    context::Context,
    error::{FollowError, Operation},
    item::{CompactedRequest, EventlogItem, LiveRequest},
    metrics::{FollowerMetrics, NoopMetrics},
    source::LogSource,
    state::{Boundary, FollowerState, Mode},
};

/// Maximum number of items requested from the live log per call.
pub const EVENTLOG_BATCH_SIZE: usize = 100;

/// Width of the id window read from the compacted log per call.
pub const COMPACTED_BLOCK_SIZE: i64 = 500;

/// Name used for a follower that has no label and reports to an unnamed sink.
pub const DEFAULT_LABEL: &str = "default";

/// Long-poll wait used when none is configured.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(10);

/// Construction-time settings for a [`LogFollower`].
#[derive(Clone)]
pub struct FollowerOptions {
    /// Position to start after.
    pub start_after: i64,
    /// Start directly in tailing mode.
    pub caught_up: bool,
    /// Only return items of this type.
    pub doc_type: Option<String>,
    /// How long a live poll may block waiting for new items.
    pub wait: Duration,
    /// Sink for position observations.
    pub metrics: Arc<dyn FollowerMetrics>,
    /// Name of this follower in metrics. When unset, the metrics sink
    /// decides (see [`crate::GaugeMetrics::with_name`]).
    pub label: Option<String>,
}

impl Default for FollowerOptions {
    fn default() -> Self {
        Self {
            start_after: 0,
            caught_up: false,
            doc_type: None,
            wait: DEFAULT_WAIT,
            metrics: Arc::new(NoopMetrics),
            label: None,
        }
    }
}

impl FollowerOptions {
    /// Sets the position to start after.
    #[must_use]
    pub fn with_start_after(mut self, position: i64) -> Self {
        self.start_after = position;
        self
    }

    /// Starts in tailing mode when `caught_up` is set.
    #[must_use]
    pub fn with_caught_up(mut self, caught_up: bool) -> Self {
        self.caught_up = caught_up;
        self
    }

    /// Restricts returned items to `doc_type`. An empty string disables the filter.
    #[must_use]
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        let doc_type = doc_type.into();
        self.doc_type = (!doc_type.is_empty()).then_some(doc_type);
        self
    }

    /// Sets the long-poll wait for live reads.
    #[must_use]
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Reports positions to `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: impl FollowerMetrics + 'static) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Reports positions to a sink shared with other followers.
    #[must_use]
    pub fn with_shared_metrics(mut self, metrics: Arc<dyn FollowerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Names this follower in metrics, overriding the sink's own name.
    /// An empty label leaves the naming to the sink.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = (!label.is_empty()).then_some(label);
        self
    }
}

impl fmt::Debug for FollowerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowerOptions")
            .field("start_after", &self.start_after)
            .field("caught_up", &self.caught_up)
            .field("doc_type", &self.doc_type)
            .field("wait", &self.wait)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Converts a wait duration to the wire's millisecond field, saturating at
/// `i32::MAX`.
pub fn clamp_wait_ms(wait: Duration) -> i32 {
    i32::try_from(wait.as_millis()).unwrap_or(i32::MAX)
}

/// Follows an event log through its compacted history into the live tail.
///
/// [`LogFollower::fetch_next`] takes `&mut self`: position and mode have a
/// single writer. Boundary resolution goes through [`Boundary`] and is safe to
/// trigger from several threads via [`LogFollower::ensure_boundary`].
pub struct LogFollower<S> {
    source: S,
    doc_type: Option<String>,
    start_after: i64,
    position: i64,
    mode: Mode,
    wait_ms: i32,
    label: Option<String>,
    metrics: Arc<dyn FollowerMetrics>,
    boundary: Boundary,
}

impl<S: LogSource> LogFollower<S> {
    pub fn new(source: S, options: FollowerOptions) -> Self {
        let FollowerOptions {
            start_after,
            caught_up,
            doc_type,
            wait,
            metrics,
            label,
        } = options;

        Self {
            source,
            doc_type: doc_type.filter(|t| !t.is_empty()),
            start_after,
            position: start_after,
            mode: Mode::from_caught_up(caught_up),
            wait_ms: clamp_wait_ms(wait),
            label: label.filter(|l| !l.is_empty()),
            metrics,
            boundary: Boundary::new(),
        }
    }

    /// Returns the current position and whether the follower is tailing.
    pub fn state(&self) -> FollowerState {
        FollowerState {
            position: self.position,
            tailing: self.mode.is_tailing(),
        }
    }

    /// Current log position.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Which view of the log the next fetch reads.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The boundary between history and the live tail, once resolved.
    pub fn boundary(&self) -> Option<i64> {
        self.boundary.get()
    }

    /// Name of this follower in logs; [`DEFAULT_LABEL`] when none is configured.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    /// Long-poll wait sent with live requests, in milliseconds.
    pub fn wait_ms(&self) -> i32 {
        self.wait_ms
    }

    /// Resolves the boundary if that has not happened yet and returns it.
    ///
    /// Concurrent callers share a single read of the live log. On failure the
    /// boundary stays unresolved and the next call tries again.
    pub fn ensure_boundary(&self, ctx: &Context) -> Result<i64, FollowError> {
        self.boundary.get_or_try_resolve(|| self.read_log_end(ctx))
    }

    /// Returns the next batch of items.
    ///
    /// An empty batch means nothing new arrived this round; the log is
    /// unbounded and callers keep polling. On error, position and mode are
    /// left untouched.
    pub fn fetch_next(&mut self, ctx: &Context) -> Result<Vec<EventlogItem>, FollowError> {
        let boundary = self.ensure_boundary(ctx)?;

        let items = match self.mode {
            Mode::Tailing => self.poll_tail(ctx)?,
            Mode::Compacted => self.poll_compacted(ctx, boundary)?,
        };

        // An unlabelled follower leaves the name to the sink.
        let label = self.label.as_deref().unwrap_or_default();
        self.metrics.observe(label, self.mode.label(), self.position);

        Ok(items)
    }

    fn read_log_end(&self, ctx: &Context) -> Result<i64, FollowError> {
        let operation = Operation::ResolveBoundary;
        ctx.check()
            .map_err(|err| FollowError::from_source(operation, err))?;

        let items = self
            .source
            .fetch_live(ctx, &LiveRequest::latest())
            .map_err(|err| FollowError::from_source(operation, err))?;

        // An empty log has no history to replay.
        let end = items.last().map_or(self.start_after, |item| item.id);
        debug!(
            follower = %self.label(),
            boundary = end,
            empty = items.is_empty(),
            "resolved compacted log boundary"
        );

        Ok(end)
    }

    fn poll_tail(&mut self, ctx: &Context) -> Result<Vec<EventlogItem>, FollowError> {
        let operation = Operation::PollTail;
        ctx.check()
            .map_err(|err| FollowError::from_source(operation, err))?;

        let request = LiveRequest {
            after: self.position,
            batch_size: EVENTLOG_BATCH_SIZE,
            wait_ms: self.wait_ms,
        };
        let raw = self
            .source
            .fetch_live(ctx, &request)
            .map_err(|err| FollowError::from_source(operation, err))?;

        // Filtered-out items still move the position.
        if let Some(last) = raw.last() {
            self.position = self.position.max(last.id);
        }
        debug!(
            follower = %self.label(),
            after = request.after,
            received = raw.len(),
            position = self.position,
            "polled eventlog"
        );

        let items = match &self.doc_type {
            Some(doc_type) => raw
                .into_iter()
                .filter(|item| &item.doc_type == doc_type)
                .collect(),
            None => raw,
        };

        Ok(items)
    }

    fn poll_compacted(
        &mut self,
        ctx: &Context,
        boundary: i64,
    ) -> Result<Vec<EventlogItem>, FollowError> {
        let operation = Operation::PollCompacted;
        let until = boundary
            .min(self.position.saturating_add(COMPACTED_BLOCK_SIZE))
            .max(self.position);

        // The window covers ids in (position, until]; the source takes a
        // half-open [after, until) range.
        let items = if until > self.position {
            ctx.check()
                .map_err(|err| FollowError::from_source(operation, err))?;

            let request = CompactedRequest {
                after: self.position.saturating_add(1),
                until: until.saturating_add(1),
                doc_type: self.doc_type.clone(),
            };
            self.source
                .fetch_compacted(ctx, &request)
                .map_err(|err| FollowError::from_source(operation, err))?
        } else {
            Vec::new()
        };

        debug!(
            follower = %self.label(),
            after = self.position,
            until,
            items = items.len(),
            "polled compacted eventlog"
        );

        // Compacted windows can be sparse, so the position moves by window.
        self.position = until;

        if until >= boundary {
            self.mode = Mode::Tailing;
            info!(
                follower = %self.label(),
                position = self.position,
                "caught up with compacted eventlog, tailing"
            );
        }

        Ok(items)
    }
}

impl<S> fmt::Debug for LogFollower<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFollower")
            .field("label", &self.label)
            .field("doc_type", &self.doc_type)
            .field("position", &self.position)
            .field("mode", &self.mode)
            .field("boundary", &self.boundary.get())
            .field("wait_ms", &self.wait_ms)
            .finish_non_exhaustive()
    }
}
