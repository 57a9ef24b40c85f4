use std::sync::Arc;

use promdist_core::error::Result;
use promdist_core::{MetricDefinition, MetricKind, Suffix};

use super::FamilyCore;
use crate::collector::{Collector, FamilySnapshot};
use crate::context::Context;

/// Sum and count of observations; no quantiles.
#[derive(Clone)]
pub struct Summary {
    core: Arc<FamilyCore>,
}

impl Summary {
    pub fn new(ctx: &Context, def: MetricDefinition) -> Result<Self> {
        Ok(Self {
            core: FamilyCore::new(ctx, def, MetricKind::Summary)?,
        })
    }

    pub fn definition(&self) -> &MetricDefinition {
        self.core.definition()
    }

    pub fn labels(&self, values: &[&str]) -> Result<SummaryChild> {
        Ok(SummaryChild {
            label_key: self.core.key_for(values)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn labels_named(&self, pairs: &[(&str, &str)]) -> Result<SummaryChild> {
        Ok(SummaryChild {
            label_key: self.core.key_for_pairs(pairs)?,
            core: Arc::clone(&self.core),
        })
    }

    pub fn observe(&self, value: f64) -> Result<()> {
        self.labels(&[])?.observe(value)
    }
}

impl Collector for Summary {
    fn name(&self) -> &str {
        self.core.definition().name()
    }

    fn collect(&self) -> Result<FamilySnapshot> {
        self.core.snapshot()
    }
}

#[derive(Clone)]
pub struct SummaryChild {
    core: Arc<FamilyCore>,
    label_key: String,
}

impl SummaryChild {
    pub fn label_key(&self) -> &str {
        &self.label_key
    }

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

    pub fn created(&self) -> Result<Option<f64>> {
        self.core.cell(Suffix::Created, &self.label_key)?.get()
    }
}
