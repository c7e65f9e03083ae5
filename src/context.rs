//! Cooperative cancellation for blocking follower calls.
//!
//! A [`Context`] is handed to every [`crate::LogSource`] call. Sources check it
//! while they block so a shutdown does not have to wait out a full long-poll.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crate::error::SourceError;

const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Cancellation signal and optional deadline for a call.
#[derive(Debug, Clone)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

/// Handle that cancels every [`Context`] derived from it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Creates a cancellable context.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let ctx = Self::background();
        let handle = CancelHandle {
            cancelled: Arc::clone(&ctx.cancelled),
        };
        (ctx, handle)
    }

    /// Returns a copy of this context that also expires after `timeout`.
    ///
    /// An earlier deadline already on the context is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(current), Some(next)) => Some(current.min(next)),
            (current, next) => current.or(next),
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline,
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Reports whether the context is done, and why.
    pub fn check(&self) -> Result<(), SourceError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(SourceError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SourceError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Sleeps for up to `duration`, waking early if the context is done.
    ///
    /// Returns `false` if the context ended the sleep.
    pub fn sleep(&self, duration: Duration) -> bool {
        let until = Instant::now().checked_add(duration);
        loop {
            if self.is_done() {
                return false;
            }
            let remaining = match until {
                Some(until) => until.saturating_duration_since(Instant::now()),
                None => SLEEP_SLICE,
            };
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.sleep(Duration::from_millis(1)));
    }

    #[test]
    fn cancel_reaches_clones() {
        let (ctx, handle) = Context::with_cancel();
        let derived = ctx.with_timeout(Duration::from_secs(60));
        handle.cancel();
        assert_eq!(ctx.check(), Err(SourceError::Cancelled));
        assert_eq!(derived.check(), Err(SourceError::Cancelled));
    }

    #[test]
    fn expired_deadline_is_reported() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        assert_eq!(ctx.check(), Err(SourceError::DeadlineExceeded));
        assert!(!ctx.sleep(Duration::from_secs(5)));
    }

    #[test]
    fn earlier_deadline_wins() {
        let short = Context::background().with_timeout(Duration::from_millis(5));
        let long = short.with_timeout(Duration::from_secs(60));
        assert_eq!(short.deadline(), long.deadline());
    }
}
