//! Follows an in-memory event log from its history into the live tail.
//!
//! A writer thread keeps appending documents while the follower replays the
//! compacted history and then tails new entries.
//!
//! Run with: `RUST_LOG=logfollow=debug cargo run --example follow`

use logfollow::consumer;
use logfollow::metrics::register_metrics;
use logfollow::{
    Context, EventlogItem, FollowerOptions, FollowerState, GaugeMetrics, LogFollower, MemoryLog,
};

use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logfollow=info".into()),
        )
        .init();
    register_metrics();

    let log = MemoryLog::new();

    // History: a few documents with several revisions each. Compaction keeps
    // only the latest revision of every document.
    for revision in 0..3 {
        for doc in 0..400 {
            let doc_type = if doc % 4 == 0 { "planning" } else { "article" };
            log.append(doc_type, "document", format!("doc-{doc}"), format!("rev {revision}"));
        }
    }
    println!("[log] history ends at id {:?}", log.last_id());

    let (ctx, cancel) = Context::with_cancel();
    let options = FollowerOptions::default()
        .with_doc_type("article")
        .with_wait(Duration::from_millis(200))
        .with_label("demo")
        .with_metrics(GaugeMetrics::new());
    let mut follower = LogFollower::new(&log, options);

    thread::scope(|s| {
        s.spawn(|| {
            for n in 0..10 {
                thread::sleep(Duration::from_millis(100));
                let id = log.append("article", "document", format!("live-{n}"), "live");
                println!("[writer] appended {id}");
            }
            thread::sleep(Duration::from_millis(500));
            cancel.cancel();
        });

        let mut handler = |items: &[EventlogItem], state: FollowerState| {
            let mode = if state.tailing { "tail" } else { "compact" };
            println!(
                "[follower] {mode} position={} items={}",
                state.position,
                items.len()
            );
            true
        };

        match consumer::run(&mut follower, &ctx, &mut handler, Duration::from_secs(1)) {
            Ok(()) => println!("[follower] handler stopped"),
            Err(err) if err.is_cancelled() => println!("[follower] shut down"),
            Err(err) => eprintln!("[follower] failed: {err}"),
        }
    });

    let state = follower.state();
    println!(
        "[follower] final position={} tailing={}",
        state.position, state.tailing
    );
}
