//! Metric families: one definition, one value cell set per label combination.
//!
//! Each family type wraps a shared `FamilyCore` that owns the definition, the
//! label codec and the backend binding. Children returned by `labels(..)` are
//! cheap handles carrying the canonical label key.

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod summary;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use promdist_core::error::{PromDistError, Result};
use promdist_core::{LabelKeyCodec, MetricDefinition, MetricKind, Suffix};

use crate::backend::{CellAddr, MetricBackend};
use crate::cell::ValueCell;
use crate::clock::Clock;
use crate::collector::{FamilySnapshot, Sample, Series};
use crate::context::Context;
use crate::store::HashEntries;

pub use counter::{Counter, CounterChild};
pub use gauge::{Gauge, GaugeChild};
pub use histogram::{Histogram, HistogramChild};
pub use summary::{Summary, SummaryChild};

struct Binding {
    backend: Arc<dyn MetricBackend>,
    clock: Arc<dyn Clock>,
}

pub(crate) struct FamilyCore {
    def: Arc<MetricDefinition>,
    codec: LabelKeyCodec,
    ctx: Context,
    bound: OnceLock<Binding>,
}

impl FamilyCore {
    pub(crate) fn new(ctx: &Context, def: MetricDefinition, expected: MetricKind) -> Result<Arc<Self>> {
        if def.kind() != expected {
            return Err(PromDistError::InvalidDefinition(format!(
                "{} is a {}, not a {}",
                def.name(),
                def.kind().as_str(),
                expected.as_str()
            )));
        }
        let core = Arc::new(Self {
            codec: LabelKeyCodec::new(def.label_names()),
            def: Arc::new(def),
            ctx: ctx.clone(),
            bound: OnceLock::new(),
        });
        // Pin to the current configuration if there is one; otherwise bind on first use.
        if ctx.is_configured() {
            core.binding()?;
        }
        Ok(core)
    }

    pub(crate) fn definition(&self) -> &Arc<MetricDefinition> {
        &self.def
    }

    fn binding(&self) -> Result<&Binding> {
        if let Some(b) = self.bound.get() {
            return Ok(b);
        }
        let generation = self.ctx.generation()?;
        let backend = generation.router().select(&self.def)?;
        Ok(self.bound.get_or_init(|| Binding {
            backend,
            clock: Arc::clone(generation.clock()),
        }))
    }

    pub(crate) fn key_for(&self, values: &[&str]) -> Result<String> {
        self.codec.encode(values)
    }

    pub(crate) fn key_for_pairs(&self, pairs: &[(&str, &str)]) -> Result<String> {
        self.codec.encode_pairs(pairs)
    }

    pub(crate) fn cell(&self, suffix: Suffix, label_key: &str) -> Result<ValueCell> {
        let b = self.binding()?;
        Ok(ValueCell::new(
            Arc::clone(&b.backend),
            CellAddr::new(self.def.name(), suffix, label_key),
        ))
    }

    pub(crate) fn observe(&self, label_key: &str, value: f64) -> Result<()> {
        self.binding()?.backend.observe(&self.def, label_key, value)
    }

    /// Establish `_created` if the combination was absent or expired, and
    /// push its deadline forward otherwise.
    pub(crate) fn touch_created(&self, label_key: &str) -> Result<()> {
        if !self.def.kind().tracks_created() {
            return Ok(());
        }
        let now = self.binding()?.clock.epoch_secs();
        self.cell(Suffix::Created, label_key)?.set_if_absent(now)?;
        Ok(())
    }

    fn read_all(&self, suffix: Suffix) -> Result<HashEntries> {
        self.binding()?.backend.read_all(self.def.name(), suffix)
    }

    /// Read one suffix keyed by label key, adding undecodable entries to `skipped`.
    fn read_map(&self, suffix: Suffix, skipped: &mut usize) -> Result<HashMap<String, f64>> {
        let entries = self.read_all(suffix)?;
        *skipped += entries.skipped;
        Ok(entries.fields.into_iter().collect())
    }

    /// Read every live combination and assemble its samples.
    ///
    /// The driver cell (`_total`, value, or `_count`) decides which
    /// combinations exist. Keys that fail to decode, and stored entries the
    /// backend could not read, are skipped and counted.
    /// Components are read one suffix at a time, so a scrape racing an
    /// observation may see sum/count and buckets from different moments.
    pub(crate) fn snapshot(&self) -> Result<FamilySnapshot> {
        let kind = self.def.kind();
        let driver = match kind {
            MetricKind::Counter => Suffix::Total,
            MetricKind::Gauge => Suffix::Value,
            MetricKind::Histogram | MetricKind::Summary => Suffix::Count,
        };
        let mut skipped = 0;
        let rows = self.read_all(driver)?;
        skipped += rows.skipped;

        let created = if kind.tracks_created() {
            self.read_map(Suffix::Created, &mut skipped)?
        } else {
            HashMap::new()
        };
        let sums = match kind {
            MetricKind::Histogram | MetricKind::Summary => self.read_map(Suffix::Sum, &mut skipped)?,
            _ => HashMap::new(),
        };
        let buckets = match kind {
            MetricKind::Histogram => self
                .def
                .bucket_suffixes()
                .into_iter()
                .map(|s| Ok((s, self.read_map(s, &mut skipped)?)))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let mut snap = FamilySnapshot::new(Arc::clone(&self.def));
        snap.skipped = skipped;
        for (label_key, value) in rows.fields {
            let labels = match self.codec.decode(&label_key) {
                Ok(l) => l.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(metric = %self.def.name(), error = %e, "skipping corrupt label key");
                    snap.skipped += 1;
                    continue;
                }
            };

            let mut samples = Vec::new();
            match kind {
                MetricKind::Counter | MetricKind::Gauge => samples.push(Sample::new(driver, value)),
                MetricKind::Histogram => {
                    for (suffix, cells) in &buckets {
                        let v = cells.get(&label_key).copied().unwrap_or(0.0);
                        samples.push(Sample::new(*suffix, v));
                    }
                    samples.push(Sample::new(Suffix::Count, value));
                    samples.push(Sample::new(Suffix::Sum, sums.get(&label_key).copied().unwrap_or(0.0)));
                }
                MetricKind::Summary => {
                    samples.push(Sample::new(Suffix::Count, value));
                    samples.push(Sample::new(Suffix::Sum, sums.get(&label_key).copied().unwrap_or(0.0)));
                }
            }

            snap.series.push(Series {
                labels,
                samples,
                created: created.get(&label_key).copied(),
            });
        }

        // An unlabelled counter reads as zero before its first increment.
        if kind == MetricKind::Counter && self.def.label_names().is_empty() && snap.series.is_empty() {
            snap.series.push(Series {
                labels: Vec::new(),
                samples: vec![Sample::new(Suffix::Total, 0.0)],
                created: None,
            });
        }

        if snap.skipped > 0 {
            tracing::warn!(metric = %self.def.name(), skipped = snap.skipped, "scrape skipped corrupt entries");
        }
        Ok(snap)
    }
}
