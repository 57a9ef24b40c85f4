//! Pull backend: in-process accumulator read directly at scrape time.
//!
//! No cross-process aggregation and no expiry; values live until the
//! process exits.

use std::collections::BTreeMap;

use dashmap::DashMap;

use promdist_core::{MetricDefinition, Result, Suffix};

use super::{CellAddr, MetricBackend};
use crate::store::HashEntries;

#[derive(Debug, Default)]
pub struct PullBackend {
    series: DashMap<String, BTreeMap<String, f64>>,
}

impl PullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn series_key(metric: &str, suffix: Suffix) -> String {
        format!("{metric}{}", suffix.storage_suffix())
    }

    /// Snapshot of everything buffered: series key -> label key -> value.
    pub fn collect(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.series
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

impl MetricBackend for PullBackend {
    fn name(&self) -> &'static str {
        "pull"
    }

    fn accepts(&self, def: &MetricDefinition) -> bool {
        !def.is_push()
    }

    fn increment(&self, cell: &CellAddr, delta: f64) -> Result<f64> {
        let mut series = self
            .series
            .entry(Self::series_key(&cell.metric, cell.suffix))
            .or_default();
        let v = series.entry(cell.label_key.clone()).or_insert(0.0);
        *v += delta;
        Ok(*v)
    }

    fn set(&self, cell: &CellAddr, value: f64) -> Result<()> {
        self.series
            .entry(Self::series_key(&cell.metric, cell.suffix))
            .or_default()
            .insert(cell.label_key.clone(), value);
        Ok(())
    }

    fn set_if_absent(&self, cell: &CellAddr, value: f64) -> Result<bool> {
        let mut series = self
            .series
            .entry(Self::series_key(&cell.metric, cell.suffix))
            .or_default();
        if series.contains_key(&cell.label_key) {
            return Ok(false);
        }
        series.insert(cell.label_key.clone(), value);
        Ok(true)
    }

    fn get(&self, cell: &CellAddr) -> Result<Option<f64>> {
        Ok(self
            .series
            .get(&Self::series_key(&cell.metric, cell.suffix))
            .and_then(|s| s.get(&cell.label_key).copied()))
    }

    fn read_all(&self, metric: &str, suffix: Suffix) -> Result<HashEntries> {
        Ok(HashEntries::new(
            self.series
                .get(&Self::series_key(metric, suffix))
                .map(|s| s.iter().map(|(k, v)| (k.clone(), *v)).collect())
                .unwrap_or_default(),
        ))
    }
}
