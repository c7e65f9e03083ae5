//! Position reporting for followers.
//!
//! The follower reports its mode and position after every successful fetch.
//! [`GaugeMetrics`] publishes them through the `metrics` facade, so whatever
//! recorder the process installs (Prometheus exporter or otherwise) sees them.

use metrics::{describe_gauge, gauge};

use crate::follower::DEFAULT_LABEL;

/// Gauge holding the current log position of a follower.
pub const FOLLOWER_POSITION: &str = "eventlog_follower_position";

/// Registers the follower metric descriptions.
///
/// Call this once at application startup after installing the metrics recorder.
pub fn register_metrics() {
    describe_gauge!(FOLLOWER_POSITION, "Current log position for eventlog follower");
}

/// Receives position observations from a follower.
pub trait FollowerMetrics: Send + Sync {
    /// Records that `follower` is at `position` in the given mode.
    ///
    /// `follower` is empty when the follower has no label of its own.
    fn observe(&self, follower: &str, mode: &str, position: i64);
}

/// Discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl FollowerMetrics for NoopMetrics {
    fn observe(&self, _follower: &str, _mode: &str, _position: i64) {}
}

/// Publishes positions as the [`FOLLOWER_POSITION`] gauge, labelled by
/// follower and state.
#[derive(Debug, Clone, Default)]
pub struct GaugeMetrics {
    name: String,
}

impl GaugeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sink that labels observations with `follower_name` when the
    /// follower itself has no label. Unnamed sinks fall back to
    /// [`DEFAULT_LABEL`].
    #[must_use]
    pub fn with_name(&self, follower_name: impl Into<String>) -> Self {
        Self {
            name: follower_name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FollowerMetrics for GaugeMetrics {
    fn observe(&self, follower: &str, mode: &str, position: i64) {
        let follower = [follower, self.name.as_str()]
            .into_iter()
            .find(|name| !name.is_empty())
            .unwrap_or(DEFAULT_LABEL);

        gauge!(FOLLOWER_POSITION, "follower" => follower.to_string(), "state" => mode.to_string())
            .set(position as f64);
    }
}
