/// A single entry of the event log.
///
/// Items are identified by a monotonically increasing `id`. The `doc_type`
/// is the type tag the follower filters on; `document` names the entity whose
/// revisions compaction collapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventlogItem {
    pub id: i64,
    pub doc_type: String,
    pub event: String,
    pub document: String,
    pub payload: Vec<u8>,
}

/// Sentinel `after` value that asks the live log for its most recent entry only.
pub const LATEST: i64 = -1;

/// Request against the live, unbounded log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRequest {
    /// Return items with an id strictly greater than this.
    pub after: i64,
    /// Maximum number of items to return.
    pub batch_size: usize,
    /// How long the source may block waiting for new items.
    pub wait_ms: i32,
}

impl LiveRequest {
    /// Builds the request used to read the last entry of the log.
    pub fn latest() -> Self {
        Self {
            after: LATEST,
            batch_size: 1,
            wait_ms: 0,
        }
    }

    /// Returns `true` if this is a "most recent entry only" request.
    pub fn is_latest(&self) -> bool {
        self.after == LATEST
    }
}

/// Request against the bounded, compacted log.
///
/// The follower reads ids in `(position, ceiling]`, so it sends
/// `after = position + 1` and `until = ceiling + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactedRequest {
    /// Inclusive lower bound of the window.
    pub after: i64,
    /// Exclusive upper bound of the window.
    pub until: i64,
    /// Server-side type filter.
    pub doc_type: Option<String>,
}
