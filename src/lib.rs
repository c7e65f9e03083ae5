//! Follow an event log from its compacted history into the live tail.
//!
//! A [`LogFollower`] replays the compacted log up to the point where it first
//! saw the live log end, then switches to long-polling the live log. Both
//! phases go through one call, [`LogFollower::fetch_next`]. The position only
//! moves forward and the switch from compacted to tailing happens once.

pub mod config;
pub mod consumer;
pub mod context;
pub mod error;
pub mod follower;
pub mod item;
pub mod memory;
pub mod metrics;
pub mod source;
pub mod state;

pub use config::FollowerConfig;
pub use consumer::Handler;
pub use context::{CancelHandle, Context};
pub use error::{ConfigError, FollowError, Operation, SourceError};
pub use follower::{
    COMPACTED_BLOCK_SIZE, EVENTLOG_BATCH_SIZE, FollowerOptions, LogFollower, clamp_wait_ms,
};
pub use item::{CompactedRequest, EventlogItem, LATEST, LiveRequest};
pub use memory::MemoryLog;
pub use crate::metrics::{FollowerMetrics, GaugeMetrics, NoopMetrics};
pub use source::LogSource;
pub use state::{Boundary, FollowerState, Mode};
