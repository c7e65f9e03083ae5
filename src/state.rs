//! Position, mode and the compacted/live boundary of a follower.

use std::{
    fmt,
    sync::{Mutex, OnceLock, PoisonError},
};

/// Which view of the log the follower is reading.
///
/// A follower starts in either mode and moves from [`Mode::Compacted`] to
/// [`Mode::Tailing`] at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replaying history from the compacted log.
    Compacted,
    /// Following the live log.
    Tailing,
}

impl Mode {
    pub(crate) fn from_caught_up(caught_up: bool) -> Self {
        if caught_up { Mode::Tailing } else { Mode::Compacted }
    }

    /// Label used when reporting the mode to metrics.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Compacted => "compact",
            Mode::Tailing => "tail",
        }
    }

    pub fn is_tailing(self) -> bool {
        self == Mode::Tailing
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only snapshot of a follower, for liveness and health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowerState {
    /// Current log position.
    pub position: i64,
    /// `true` once the follower has caught up and is tailing the live log.
    pub tailing: bool,
}

/// End of history: the id of the last live entry when the follower first ran.
///
/// The value is resolved lazily, at most once, and never changes afterwards.
/// Concurrent first callers serialize on an internal lock so only one of them
/// runs the resolution; a failed resolution leaves the boundary unresolved.
#[derive(Debug, Default)]
pub struct Boundary {
    value: OnceLock<i64>,
    init: Mutex<()>,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved boundary, if resolution has happened.
    pub fn get(&self) -> Option<i64> {
        self.value.get().copied()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    /// Returns the boundary, running `resolve` first if it is not known yet.
    pub fn get_or_try_resolve<E>(
        &self,
        resolve: impl FnOnce() -> Result<i64, E>,
    ) -> Result<i64, E> {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        // The guard protects no data, so a panic in another resolver is harmless.
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let value = resolve()?;
        Ok(*self.value.get_or_init(|| value))
    }
}
