use std::sync::Arc;

use promdist_core::error::{PromDistError, Result};
use promdist_core::{MetricDefinition, MetricKind, Suffix};

use super::FamilyCore;
use crate::cell::ValueCell;
use crate::collector::{Collector, FamilySnapshot};
use crate::context::Context;

/// Value that can go up and down. No `_created` is tracked.
#[derive(Clone)]
pub struct Gauge {
    core: Arc<FamilyCore>,
}

impl Gauge {
    pub fn new(ctx: &Context, def: MetricDefinition) -> Result<Self> {
        Ok(Self {
            core: FamilyCore::new(ctx, def, MetricKind::Gauge)?,
        })
    }

    pub fn definition(&self) -> &MetricDefinition {
        self.core.definition()
    }

    pub fn labels(&self, values: &[&str]) -> Result<GaugeChild> {
        Ok(GaugeChild {
            label_key: self.core.key_for(values)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn labels_named(&self, pairs: &[(&str, &str)]) -> Result<GaugeChild> {
        Ok(GaugeChild {
            label_key: self.core.key_for_pairs(pairs)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn inc(&self) -> Result<()> {
        self.labels(&[])?.inc()
    }

    pub fn dec(&self) -> Result<()> {
        self.labels(&[])?.dec()
    }

    pub fn set(&self, value: f64) -> Result<()> {
        self.labels(&[])?.set(value)
    }

    pub fn get(&self) -> Result<Option<f64>> {
        self.labels(&[])?.get()
    }
}

impl Collector for Gauge {
    fn name(&self) -> &str {
        self.core.definition().name()
    }

    fn collect(&self) -> Result<FamilySnapshot> {
        self.core.snapshot()
    }
}

#[derive(Clone)]
pub struct GaugeChild {
    core: Arc<FamilyCore>,
    label_key: String,
}

impl GaugeChild {
    fn cell(&self) -> Result<ValueCell> {
        self.core.cell(Suffix::Value, &self.label_key)
    }

    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    pub fn inc(&self) -> Result<()> {
        self.inc_by(1.0)
    }

    /// Add `amount`, which must be finite; `set` accepts any value.
    pub fn inc_by(&self, amount: f64) -> Result<()> {
        finite(amount)?;
        self.cell()?.increment(amount).map(|_| ())
    }

    pub fn dec(&self) -> Result<()> {
        self.dec_by(1.0)
    }

    pub fn dec_by(&self, amount: f64) -> Result<()> {
        finite(amount)?;
        self.cell()?.decrement(amount).map(|_| ())
    }

    pub fn set(&self, value: f64) -> Result<()> {
        self.cell()?.set(value)
    }

    /// `None` if never written or expired.
    pub fn get(&self) -> Result<Option<f64>> {
        self.cell()?.get()
    }
}

fn finite(amount: f64) -> Result<()> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(PromDistError::InvalidValue(format!(
            "gauge increments must be finite, got {amount}"
        )))
    }
}
