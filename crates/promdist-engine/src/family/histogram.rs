use std::sync::Arc;

use promdist_core::error::Result;
use promdist_core::{MetricDefinition, MetricKind, Suffix};

use super::FamilyCore;
use crate::collector::{Collector, FamilySnapshot};
use crate::context::Context;

/// Cumulative histogram over the definition's bounds plus `+Inf`.
#[derive(Clone)]
pub struct Histogram {
    core: Arc<FamilyCore>,
}

impl Histogram {
    pub fn new(ctx: &Context, def: MetricDefinition) -> Result<Self> {
        Ok(Self {
            core: FamilyCore::new(ctx, def, MetricKind::Histogram)?,
        })
    }

    pub fn definition(&self) -> &MetricDefinition {
        self.core.definition()
    }

    pub fn labels(&self, values: &[&str]) -> Result<HistogramChild> {
        Ok(HistogramChild {
            label_key: self.core.key_for(values)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn labels_named(&self, pairs: &[(&str, &str)]) -> Result<HistogramChild> {
        Ok(HistogramChild {
            label_key: self.core.key_for_pairs(pairs)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn observe(&self, value: f64) -> Result<()> {
        self.labels(&[])?.observe(value)
    }
}

impl Collector for Histogram {
    fn name(&self) -> &str {
        self.core.definition().name()
    }

    fn collect(&self) -> Result<FamilySnapshot> {
        self.core.snapshot()
    }
}

#[derive(Clone)]
pub struct HistogramChild {
    core: Arc<FamilyCore>,
    label_key: String,
}

impl HistogramChild {
    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    /// Add `value` to `_sum`, 1 to `_count` and to every bucket with bound >= `value`.
    /// Non-finite values are rejected with `InvalidValue` before any write.
    pub fn observe(&self, value: f64) -> Result<()> {
        self.core.observe(&self.label_key, value)?;
        self.core.touch_created(&self.label_key)
    }

    pub fn sum(&self) -> Result<Option<f64>> {
        self.core.cell(Suffix::Sum, &self.label_key)?.get()
    }

    pub fn count(&self) -> Result<Option<f64>> {
        self.core.cell(Suffix::Count, &self.label_key)?.get()
    }

    /// `(upper bound, cumulative count)` for every bucket, `+Inf` last.
    pub fn buckets(&self) -> Result<Vec<(f64, f64)>> {
        let mut out = Vec::new();
        for suffix in self.core.definition().bucket_suffixes() {
            if let Suffix::Bucket(le) = suffix {
                let v = self.core.cell(suffix, &self.label_key)?.get()?.unwrap_or(0.0);
                out.push((le, v));
            }
        }
        Ok(out)
    }

    pub fn created(&self) -> Result<Option<f64>> {
        self.core.cell(Suffix::Created, &self.label_key)?.get()
    }
}
