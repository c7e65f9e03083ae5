//! Property-based tests for follower position and mode invariants.

mod common;

use std::time::Duration;

use logfollow::{Context, FollowerOptions, LogFollower, MemoryLog, Mode};
use proptest::prelude::*;

/// `(document, is_article, id gap before the entry)`
fn arb_entries() -> impl Strategy<Value = Vec<(u8, bool, i64)>> {
    prop::collection::vec((0u8..5, any::<bool>(), 0i64..800), 0..40)
}

fn build_log(entries: &[(u8, bool, i64)]) -> MemoryLog {
    let log = MemoryLog::new();
    for (doc, is_article, gap) in entries {
        log.skip_ids(*gap);
        let doc_type = if *is_article { "article" } else { "planning" };
        log.append(doc_type, "document", format!("doc-{doc}"), "");
    }
    log
}

proptest! {
    #[test]
    fn position_is_monotonic_and_mode_switches_once(
        entries in arb_entries(),
        start_after in 0i64..1000,
        filtered in any::<bool>(),
    ) {
        let log = build_log(&entries);
        let mut options = FollowerOptions::default()
            .with_wait(Duration::ZERO)
            .with_start_after(start_after);
        if filtered {
            options = options.with_doc_type("article");
        }
        let mut follower = LogFollower::new(&log, options);
        let ctx = Context::background();

        let last_id = log.last_id().unwrap_or(0);
        let max_steps = usize::try_from(last_id / 500).unwrap_or(0) + 4;

        let mut delivered = Vec::new();
        let mut position = follower.position();
        let mut was_tailing = false;
        for _ in 0..max_steps {
            let items = follower.fetch_next(&ctx).unwrap();

            prop_assert!(follower.position() >= position);
            position = follower.position();

            if was_tailing {
                prop_assert_eq!(follower.mode(), Mode::Tailing);
            }
            was_tailing = follower.mode().is_tailing();

            if filtered {
                prop_assert!(items.iter().all(|item| item.doc_type == "article"));
            }
            delivered.extend(items.into_iter().map(|item| item.id));
        }

        prop_assert_eq!(follower.mode(), Mode::Tailing);
        prop_assert_eq!(follower.position(), start_after.max(last_id));
        prop_assert!(delivered.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(delivered.iter().all(|id| *id > start_after));

        // The boundary entry is the newest revision of its document, so it is
        // delivered exactly once unless the start position or filter excludes it.
        let boundary_is_article = entries.last().is_some_and(|(_, is_article, _)| *is_article);
        if last_id > start_after && (!filtered || boundary_is_article) {
            prop_assert_eq!(delivered.iter().filter(|id| **id == last_id).count(), 1);
        }
    }
}
