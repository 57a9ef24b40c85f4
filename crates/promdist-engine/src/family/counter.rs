use std::sync::Arc;

use promdist_core::error::{PromDistError, Result};
use promdist_core::{MetricDefinition, MetricKind, Suffix};

use super::FamilyCore;
use crate::collector::{Collector, FamilySnapshot};
use crate::context::Context;

/// Monotonic counter. Exposed as `<name>_total` plus a `<name>_created` gauge.
#[derive(Clone)]
pub struct Counter {
    core: Arc<FamilyCore>,
}

impl Counter {
    pub fn new(ctx: &Context, def: MetricDefinition) -> Result<Self> {
        Ok(Self {
            core: FamilyCore::new(ctx, def, MetricKind::Counter)?,
        })
    }

    pub fn definition(&self) -> &MetricDefinition {
        self.core.definition()
    }

    /// Child for label values given in declaration order.
    pub fn labels(&self, values: &[&str]) -> Result<CounterChild> {
        Ok(CounterChild {
            label_key: self.core.key_for(values)?,
            core: Arc::clone(&self.core),
        })
    }

    /// Child for `(name, value)` pairs in any order.
    pub fn labels_named(&self, pairs: &[(&str, &str)]) -> Result<CounterChild> {
        Ok(CounterChild {
            label_key: self.core.key_for_pairs(pairs)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn inc(&self) -> Result<()> {
        self.labels(&[])?.inc()
    }

    pub fn inc_by(&self, amount: f64) -> Result<()> {
        self.labels(&[])?.inc_by(amount)
    }

    pub fn get(&self) -> Result<f64> {
        self.labels(&[])?.get()
    }
}

impl Collector for Counter {
    fn name(&self) -> &str {
        self.core.definition().name()
    }

    fn collect(&self) -> Result<FamilySnapshot> {
        self.core.snapshot()
    }
}

#[derive(Clone)]
pub struct CounterChild {
    core: Arc<FamilyCore>,
    label_key: String,
}

impl CounterChild {
    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    pub fn inc(&self) -> Result<()> {
        self.inc_by(1.0)
    }

    /// Add `amount` (finite, non-negative). Rejected before any store call.
    pub fn inc_by(&self, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PromDistError::InvalidValue(format!(
                "counters can only be incremented by finite non-negative amounts, got {amount}"
            )));
        }
        self.core.cell(Suffix::Total, &self.label_key)?.increment(amount)?;
        self.core.touch_created(&self.label_key)
    }

    /// Current value; an absent or expired counter reads as zero.
    pub fn get(&self) -> Result<f64> {
        Ok(self.core.cell(Suffix::Total, &self.label_key)?.get()?.unwrap_or(0.0))
    }

    /// Raw value, `None` if absent or expired.
    pub fn value(&self) -> Result<Option<f64>> {
        self.core.cell(Suffix::Total, &self.label_key)?.get()
    }

    pub fn created(&self) -> Result<Option<f64>> {
        self.core.cell(Suffix::Created, &self.label_key)?.get()
    }
}
