use std::time::Duration;

use tracing::warn;

use crate::{
    context::Context,
    error::FollowError,
    follower::LogFollower,
    item::EventlogItem,
    source::LogSource,
    state::FollowerState,
};

/// Processing logic driven by [`run`].
pub trait Handler {
    /// Handles one batch of items.
    ///
    /// `state` is the follower's state after the batch was fetched. The batch
    /// may be empty: a follower still in compacted mode hit a sparse window,
    /// or a tailing follower's long-poll expired without new items.
    ///
    /// Returns `true` to continue processing, or `false` to stop.
    fn handle(&mut self, items: &[EventlogItem], state: FollowerState) -> bool;
}

impl<F> Handler for F
where
    F: FnMut(&[EventlogItem], FollowerState) -> bool,
{
    fn handle(&mut self, items: &[EventlogItem], state: FollowerState) -> bool {
        self(items, state)
    }
}

/// Runs the follower loop, passing every batch to `handler`.
///
/// The loop continues until [`Handler::handle`] returns `false`, which yields
/// `Ok(())`, or until `ctx` is cancelled, which yields the cancellation error.
/// Source failures are logged and retried after `retry_delay`. A failed fetch
/// leaves the follower untouched, so the retry re-requests the same range.
pub fn run<S, H>(
    follower: &mut LogFollower<S>,
    ctx: &Context,
    handler: &mut H,
    retry_delay: Duration,
) -> Result<(), FollowError>
where
    S: LogSource,
    H: Handler + ?Sized,
{
    loop {
        match follower.fetch_next(ctx) {
            Ok(items) => {
                if !handler.handle(&items, follower.state()) {
                    return Ok(());
                }
            }
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                warn!(
                    follower = %follower.label(),
                    error = %err,
                    retry_in_ms = u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX),
                    "eventlog fetch failed, retrying"
                );
                if !ctx.sleep(retry_delay) {
                    return Err(FollowError::Cancelled {
                        operation: err.operation(),
                    });
                }
            }
        }
    }
}
