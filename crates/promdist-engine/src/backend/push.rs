//! Push backend: eager pre-aggregation in the shared store.
//!
//! Storage layout: hash key `{prefix}_{metric}{suffix}`, field = canonical
//! label key, value = number. Each operation is a single store primitive.

use std::sync::Arc;
use std::time::Duration;

use promdist_core::{MetricDefinition, Result, Suffix};

use super::{CellAddr, MetricBackend};
use crate::store::{HashEntries, SharedStore};

pub struct PushBackend {
    store: Arc<dyn SharedStore>,
    prefix: String,
    ttl: Option<Duration>,
}

impl PushBackend {
    pub fn new(store: Arc<dyn SharedStore>, prefix: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Hash key for one suffix of a metric.
    pub fn hash_key(&self, metric: &str, suffix: Suffix) -> String {
        format!("{}_{}{}", self.prefix, metric, suffix.storage_suffix())
    }
}

impl MetricBackend for PushBackend {
    fn name(&self) -> &'static str {
        "push"
    }

    fn accepts(&self, def: &MetricDefinition) -> bool {
        def.is_push()
    }

    fn increment(&self, cell: &CellAddr, delta: f64) -> Result<f64> {
        let key = self.hash_key(&cell.metric, cell.suffix);
        self.store.incr_by(&key, &cell.label_key, delta, self.ttl)
    }

    fn set(&self, cell: &CellAddr, value: f64) -> Result<()> {
        let key = self.hash_key(&cell.metric, cell.suffix);
        self.store.set(&key, &cell.label_key, value, self.ttl)
    }

    fn set_if_absent(&self, cell: &CellAddr, value: f64) -> Result<bool> {
        let key = self.hash_key(&cell.metric, cell.suffix);
        self.store.set_if_absent(&key, &cell.label_key, value, self.ttl)
    }

    fn get(&self, cell: &CellAddr) -> Result<Option<f64>> {
        let key = self.hash_key(&cell.metric, cell.suffix);
        self.store.get(&key, &cell.label_key)
    }

    fn read_all(&self, metric: &str, suffix: Suffix) -> Result<HashEntries> {
        self.store.get_all(&self.hash_key(metric, suffix))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn key_layout() {
        let store = Arc::new(MemoryStore::new());
        let b = PushBackend::new(store.clone(), "prometheus", None);
        assert_eq!(b.hash_key("reqs", Suffix::Total), "prometheus_reqs_total");
        assert_eq!(b.hash_key("temp", Suffix::Value), "prometheus_temp");
        assert_eq!(b.hash_key("lat", Suffix::Bucket(0.5)), "prometheus_lat_bucket:0.5");

        b.increment(&CellAddr::new("reqs", Suffix::Total, "{}"), 2.0).unwrap();
        assert_eq!(store.get("prometheus_reqs_total", "{}").unwrap(), Some(2.0));
    }

    #[test]
    fn observe_updates_sum_count_and_cumulative_buckets() {
        let store = Arc::new(MemoryStore::new());
        let b = PushBackend::new(store.clone(), "p", None);
        let def = MetricDefinition::histogram("lat", "h")
            .buckets([1.0, 2.0])
            .build()
            .unwrap();
        b.observe(&def, "{}", 1.5).unwrap();
        b.observe(&def, "{}", 0.5).unwrap();
        b.observe(&def, "{}", 9.0).unwrap();

        assert_eq!(store.get("p_lat_sum", "{}").unwrap(), Some(11.0));
        assert_eq!(store.get("p_lat_count", "{}").unwrap(), Some(3.0));
        assert_eq!(store.get("p_lat_bucket:1.0", "{}").unwrap(), Some(1.0));
        assert_eq!(store.get("p_lat_bucket:2.0", "{}").unwrap(), Some(2.0));
        assert_eq!(store.get("p_lat_bucket:+Inf", "{}").unwrap(), Some(3.0));
    }
}
