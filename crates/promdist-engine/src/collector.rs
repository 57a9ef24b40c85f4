//! Collector surface and registry.
//!
//! A `Collector` produces one `FamilySnapshot` per call; the registry gathers
//! every registered collector and hands the snapshots to the exposition
//! builder.

use std::sync::{Arc, RwLock};

use promdist_core::error::{PromDistError, Result};
use promdist_core::{MetricDefinition, Suffix};

use crate::exposition::ExpositionBuilder;

/// One rendered value of a label combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub suffix: Suffix,
    pub value: f64,
}

impl Sample {
    pub fn new(suffix: Suffix, value: f64) -> Self {
        Self { suffix, value }
    }
}

/// All samples of one live label combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// `(name, value)` sorted by name.
    pub labels: Vec<(String, String)>,
    pub samples: Vec<Sample>,
    /// Epoch seconds the combination was established, if tracked and present.
    pub created: Option<f64>,
}

/// Everything read for one metric family at scrape time.
#[derive(Debug, Clone)]
pub struct FamilySnapshot {
    pub definition: Arc<MetricDefinition>,
    pub series: Vec<Series>,
    /// Entries dropped because their label key failed to decode.
    pub skipped: usize,
}

impl FamilySnapshot {
    pub fn new(definition: Arc<MetricDefinition>) -> Self {
        Self {
            definition,
            series: Vec::new(),
            skipped: 0,
        }
    }
}

pub trait Collector: Send + Sync {
    /// Family name, unique within a registry.
    fn name(&self) -> &str;

    fn collect(&self) -> Result<FamilySnapshot>;
}

#[derive(Default)]
pub struct Registry {
    collectors: RwLock<Vec<Arc<dyn Collector>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: Collector + 'static>(&self, collector: C) -> Result<()> {
        let mut collectors = self.collectors.write().unwrap_or_else(|e| e.into_inner());
        if collectors.iter().any(|c| c.name() == collector.name()) {
            return Err(PromDistError::InvalidDefinition(format!(
                "duplicate metric family: {}",
                collector.name()
            )));
        }
        collectors.push(Arc::new(collector));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.collectors.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot every family. A store failure aborts the whole gather.
    pub fn gather(&self) -> Result<Vec<FamilySnapshot>> {
        let collectors: Vec<Arc<dyn Collector>> =
            self.collectors.read().unwrap_or_else(|e| e.into_inner()).clone();
        collectors.iter().map(|c| c.collect()).collect()
    }

    /// Render the exposition document.
    pub fn render(&self) -> Result<String> {
        let families = self.gather()?;
        let skipped: usize = families.iter().map(|f| f.skipped).sum();
        if skipped > 0 {
            tracing::warn!(skipped, "exposition omitted corrupt entries");
        }
        Ok(ExpositionBuilder::new().build(&families))
    }
}
