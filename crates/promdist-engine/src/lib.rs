//! promdist engine library entry.
//!
//! This crate wires the shared store, push/pull backends, metric families and
//! the exposition builder into one accounting layer that many worker processes
//! can write to and any process can scrape. It is consumed by the exporter
//! binary (`main.rs`), by instrumented applications, and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod backend;
pub mod cell;
pub mod clock;
pub mod collector;
pub mod config;
pub mod context;
pub mod exposition;
pub mod family;
pub mod ops;
pub mod router;
pub mod store;

pub use backend::{BackendRouter, CellAddr, MetricBackend, PullBackend, PushBackend};
pub use cell::ValueCell;
pub use clock::{Clock, ManualClock, SystemClock};
pub use collector::{Collector, FamilySnapshot, Registry, Sample, Series};
pub use context::{Context, SetupOptions};
pub use exposition::ExpositionBuilder;
pub use family::{Counter, Gauge, Histogram, Summary};
pub use store::{HashEntries, MemoryStore, RedisStore, SharedStore};
