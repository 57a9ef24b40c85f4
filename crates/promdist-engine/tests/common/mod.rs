//! Shared fixtures for engine integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use promdist_core::format::format_value;
use promdist_engine::{Clock, Context, ManualClock, MemoryStore, SetupOptions};

/// Fixed scrape-comparison start time (ms since epoch).
pub const START_MS: u64 = 1_549_444_326_429;

pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub ctx: Context,
}

impl Fixture {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_prefix("prometheus", ttl_secs)
    }

    pub fn with_prefix(prefix: &str, ttl_secs: u64) -> Self {
        let clock = Arc::new(ManualClock::new(Duration::from_millis(START_MS)));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let ctx = Context::new();
        ctx.setup(
            SetupOptions::new(store.clone())
                .prefix(prefix)
                .ttl_secs(ttl_secs)
                .clock(clock.clone()),
        )
        .unwrap();
        Self { clock, store, ctx }
    }

    /// Rendered `_created` value for the current clock reading.
    pub fn now_str(&self) -> String {
        format_value(self.clock.epoch_secs())
    }
}

/// Lines of an exposition document, sorted, so family and series order do not matter.
pub fn sorted_lines(doc: &str) -> Vec<String> {
    let mut lines: Vec<String> = doc.lines().map(str::to_string).collect();
    lines.sort();
    lines
}

pub fn expected(lines: &[String]) -> Vec<String> {
    let mut v = lines.to_vec();
    v.sort();
    v
}
