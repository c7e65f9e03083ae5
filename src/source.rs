use crate::{
    context::Context,
    error::SourceError,
    item::{CompactedRequest, EventlogItem, LiveRequest},
};

/// Read access to an event log that exposes both a compacted and a live view.
///
/// The compacted view is bounded and may have gaps: compaction removes
/// superseded revisions, so a window can legitimately come back empty. The
/// live view is unbounded and supports long-polling.
///
/// Implementations typically wrap an RPC client. They should honor the
/// [`Context`] passed to each call and return [`SourceError::Cancelled`] or
/// [`SourceError::DeadlineExceeded`] when it fires. Retrying is left to the
/// caller.
pub trait LogSource {
    /// Reads the live log.
    ///
    /// Returns up to `batch_size` items with an id greater than `after`, in
    /// ascending id order, blocking for at most `wait_ms` while no such item
    /// exists. When `after` is [`crate::item::LATEST`] only the most recent
    /// entry is returned, or nothing if the log is empty.
    fn fetch_live(
        &self,
        ctx: &Context,
        request: &LiveRequest,
    ) -> Result<Vec<EventlogItem>, SourceError>;

    /// Reads the compacted log in `[after, until)`, in ascending id order,
    /// keeping only items of `doc_type` when one is given.
    fn fetch_compacted(
        &self,
        ctx: &Context,
        request: &CompactedRequest,
    ) -> Result<Vec<EventlogItem>, SourceError>;
}

impl<T: LogSource + ?Sized> LogSource for &T {
    fn fetch_live(
        &self,
        ctx: &Context,
        request: &LiveRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        (**self).fetch_live(ctx, request)
    }

    fn fetch_compacted(
        &self,
        ctx: &Context,
        request: &CompactedRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        (**self).fetch_compacted(ctx, request)
    }
}

impl<T: LogSource + ?Sized> LogSource for std::sync::Arc<T> {
    fn fetch_live(
        &self,
        ctx: &Context,
        request: &LiveRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        (**self).fetch_live(ctx, request)
    }

    fn fetch_compacted(
        &self,
        ctx: &Context,
        request: &CompactedRequest,
    ) -> Result<Vec<EventlogItem>, SourceError> {
        (**self).fetch_compacted(ctx, request)
    }
}
