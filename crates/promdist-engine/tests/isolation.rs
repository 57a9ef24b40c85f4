//! Prefix isolation, re-setup and backend routing.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use common::Fixture;
use promdist_core::MetricDefinition;
use promdist_engine::{Context, Counter, Gauge, MemoryStore, Registry, SetupOptions, SharedStore};

fn shruberry() -> MetricDefinition {
    MetricDefinition::counter("shruberry", "shruberry").build().unwrap()
}

#[test]
fn prefixes_do_not_share_series() {
    let fx = Fixture::with_prefix("patang", 0);
    let a = Counter::new(&fx.ctx, shruberry()).unwrap();
    a.inc().unwrap();
    assert_eq!(a.get().unwrap(), 1.0);
    assert!(a.labels(&[]).unwrap().created().unwrap().is_some());

    fx.ctx
        .setup(SetupOptions::new(fx.store.clone()).prefix("eki").clock(fx.clock.clone()))
        .unwrap();
    let b = Counter::new(&fx.ctx, shruberry()).unwrap();
    b.inc_by(10.0).unwrap();
    assert_eq!(b.get().unwrap(), 10.0);
    assert!(b.labels(&[]).unwrap().created().unwrap().is_some());

    fx.ctx
        .setup(SetupOptions::new(fx.store.clone()).prefix("patang").clock(fx.clock.clone()))
        .unwrap();
    assert_eq!(a.get().unwrap(), 1.0);
    assert_eq!(b.get().unwrap(), 10.0);

    assert_eq!(fx.store.get("patang_shruberry_total", "{}").unwrap(), Some(1.0));
    assert_eq!(fx.store.get("eki_shruberry_total", "{}").unwrap(), Some(10.0));
}

#[test]
fn two_contexts_on_one_store() {
    let store = Arc::new(MemoryStore::new());
    let patang = Context::new();
    patang.setup(SetupOptions::new(store.clone()).prefix("patang")).unwrap();
    let eki = Context::new();
    eki.setup(SetupOptions::new(store.clone()).prefix("eki")).unwrap();

    let a = Counter::new(&patang, shruberry()).unwrap();
    let b = Counter::new(&eki, shruberry()).unwrap();
    a.inc().unwrap();
    b.inc_by(10.0).unwrap();
    assert_eq!(a.get().unwrap(), 1.0);
    assert_eq!(b.get().unwrap(), 10.0);
}

#[test]
fn processes_sharing_a_prefix_aggregate() {
    let store = Arc::new(MemoryStore::new());
    // two "workers", each with its own context and family instance
    let workers: Vec<Counter> = (0..2)
        .map(|_| {
            let ctx = Context::new();
            ctx.setup(SetupOptions::new(store.clone())).unwrap();
            Counter::new(&ctx, shruberry()).unwrap()
        })
        .collect();
    workers[0].inc().unwrap();
    workers[1].inc_by(4.0).unwrap();
    assert_eq!(workers[0].get().unwrap(), 5.0);
    assert_eq!(workers[1].get().unwrap(), 5.0);
}

#[test]
fn pull_metrics_stay_in_process() {
    let fx = Fixture::new(0);
    let def = MetricDefinition::gauge("queue_depth", "q")
        .labels(["queue"])
        .pull()
        .build()
        .unwrap();
    let metric = Gauge::new(&fx.ctx, def).unwrap();
    metric.labels(&["mail"]).unwrap().set(4.0).unwrap();
    metric.labels(&["mail"]).unwrap().inc().unwrap();

    // nothing reached the shared store
    assert!(fx.store.get_all("prometheus_queue_depth").unwrap().is_empty());

    let buffered = fx.ctx.pull_backend().collect();
    assert_eq!(buffered["queue_depth"][r#"{"queue":"mail"}"#], 5.0);

    let registry = Registry::new();
    registry.register(metric).unwrap();
    assert!(registry
        .render()
        .unwrap()
        .contains("queue_depth{queue=\"mail\"} 5.0\n"));
}

#[test]
fn pull_counter_tracks_created() {
    let ctx = Context::new();
    ctx.setup(SetupOptions::local()).unwrap();
    let def = MetricDefinition::counter("jobs", "j").pull().build().unwrap();
    let metric = Counter::new(&ctx, def).unwrap();
    metric.inc().unwrap();
    metric.inc().unwrap();
    assert_eq!(metric.get().unwrap(), 2.0);
    let buffered = ctx.pull_backend().collect();
    assert_eq!(buffered["jobs_total"]["{}"], 2.0);
    assert!(buffered["jobs_created"].contains_key("{}"));
}

#[test]
fn push_metric_without_store_is_not_configured() {
    let ctx = Context::new();
    ctx.setup(SetupOptions::local()).unwrap();
    let err = Counter::new(&ctx, shruberry()).err().unwrap();
    assert_eq!(err.code().as_str(), "NOT_CONFIGURED");
}
