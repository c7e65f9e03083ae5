//! Error types for the follower and its log source.

use std::fmt;

/// Errors returned by a [`crate::LogSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The caller's context was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The caller's context deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The service could not be reached or failed to answer.
    #[error("unavailable: {message}")]
    Unavailable {
        /// Description of the transport failure.
        message: String,
    },

    /// The service answered but refused the request.
    #[error("rejected: {message}")]
    Rejected {
        /// Reason given by the service.
        message: String,
    },
}

impl SourceError {
    /// Creates a transport failure with the given message.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if the error stems from the caller's context.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// The follower step an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ResolveBoundary,
    PollCompacted,
    PollTail,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ResolveBoundary => "resolving boundary",
            Operation::PollCompacted => "polling compacted region",
            Operation::PollTail => "polling tail",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`crate::LogFollower::fetch_next`].
///
/// A failed call never changes the follower's position or mode, so the call
/// can always be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FollowError {
    /// The context was cancelled or its deadline passed.
    #[error("cancelled while {operation}")]
    Cancelled {
        /// Step that observed the cancellation.
        operation: Operation,
    },

    /// The log source failed.
    #[error("{operation}: {source}")]
    Source {
        /// Step that issued the failing request.
        operation: Operation,
        /// The underlying source error.
        #[source]
        source: SourceError,
    },
}

impl FollowError {
    pub(crate) fn from_source(operation: Operation, source: SourceError) -> Self {
        if source.is_cancellation() {
            Self::Cancelled { operation }
        } else {
            Self::Source { operation, source }
        }
    }

    /// Returns `true` if the follower was shut down rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns the step the error happened in.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Cancelled { operation } | Self::Source { operation, .. } => *operation,
        }
    }
}

/// Errors raised while turning configuration into follower options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("wait duration must not be negative, got {wait_ms}ms")]
    NegativeWait { wait_ms: i64 },

    #[error("start position must not be negative, got {start_after}")]
    InvalidStartPosition { start_after: i64 },

    #[error("failed to parse follower config: {0}")]
    Parse(#[from] serde_json::Error),
}
