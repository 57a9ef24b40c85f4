//! Metric backends and the router that picks one per metric.
//!
//! A backend executes cell operations either against the shared store
//! (push) or against an in-process accumulator (pull). Families never talk to
//! a store directly; they hold the backend their definition resolved to.

pub mod pull;
pub mod push;
pub mod router;

use promdist_core::{MetricDefinition, MetricKind, PromDistError, Result, Suffix};

use crate::store::HashEntries;

pub use pull::PullBackend;
pub use push::PushBackend;
pub use router::BackendRouter;

/// Address of one value cell: metric name, cell suffix, canonical label key.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAddr {
    pub metric: String,
    pub suffix: Suffix,
    pub label_key: String,
}

impl CellAddr {
    pub fn new(metric: impl Into<String>, suffix: Suffix, label_key: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            suffix,
            label_key: label_key.into(),
        }
    }
}

pub trait MetricBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Routing predicate.
    fn accepts(&self, def: &MetricDefinition) -> bool;

    fn increment(&self, cell: &CellAddr, delta: f64) -> Result<f64>;

    fn decrement(&self, cell: &CellAddr, delta: f64) -> Result<f64> {
        self.increment(cell, -delta)
    }

    fn set(&self, cell: &CellAddr, value: f64) -> Result<()>;

    /// Write only if the cell is absent; refreshes its lifetime either way.
    fn set_if_absent(&self, cell: &CellAddr, value: f64) -> Result<bool>;

    fn get(&self, cell: &CellAddr) -> Result<Option<f64>>;

    /// Every live `(label_key, value)` for one suffix of a metric, plus the
    /// number of stored entries that could not be decoded.
    fn read_all(&self, metric: &str, suffix: Suffix) -> Result<HashEntries>;

    /// Record one histogram or summary observation.
    ///
    /// Non-finite values are rejected before any write: a NaN matches no
    /// bucket, so `_count` would drift from `le="+Inf"`, and an infinite sum
    /// cannot be accumulated by the store.
    ///
    /// Sum, count and buckets are separate atomic writes, not one
    /// transaction: a concurrent scrape may see `_sum`/`_count` from a
    /// different set of observations than the `_bucket` cells.
    fn observe(&self, def: &MetricDefinition, label_key: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(PromDistError::InvalidValue(format!(
                "{} observations must be finite, got {value}",
                def.kind().as_str()
            )));
        }
        let cell = |suffix| CellAddr::new(def.name(), suffix, label_key);
        self.increment(&cell(Suffix::Sum), value)?;
        self.increment(&cell(Suffix::Count), 1.0)?;
        if def.kind() == MetricKind::Histogram {
            for suffix in def.bucket_suffixes() {
                if let Suffix::Bucket(le) = suffix {
                    if value <= le {
                        self.increment(&cell(suffix), 1.0)?;
                    }
                }
            }
        }
        Ok(())
    }
}
