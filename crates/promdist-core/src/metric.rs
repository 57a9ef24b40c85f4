//! Metric definitions and storage suffixes.
//!
//! A `MetricDefinition` is immutable once built. The builder applies the
//! same naming rules the exposition format requires, so a definition that
//! builds is always renderable.

use serde::Deserialize;

use crate::error::{PromDistError, Result};
use crate::format::format_value;

/// Default histogram bounds (the implicit `+Inf` is not listed).
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    /// Name used on `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }

    /// Whether label combinations carry a `_created` cell.
    pub fn tracks_created(self) -> bool {
        !matches!(self, MetricKind::Gauge)
    }
}

/// How mutations reach the scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Pre-aggregated in the shared store, visible to every process.
    #[default]
    Push,
    /// Buffered in this process and read directly at scrape time.
    Pull,
}

/// Which cell of a label combination is addressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Suffix {
    /// Gauge value.
    Value,
    /// Counter value.
    Total,
    Sum,
    Count,
    /// Cumulative bucket with the given upper bound (`+Inf` included).
    Bucket(f64),
    /// Epoch seconds at which the combination was (re)established.
    Created,
}

impl Suffix {
    /// Suffix appended to the metric name in the storage key.
    pub fn storage_suffix(&self) -> String {
        match self {
            Suffix::Bucket(le) => format!("_bucket:{}", format_value(*le)),
            other => other.sample_suffix().to_string(),
        }
    }

    /// Suffix appended to the metric name on exposition lines.
    pub fn sample_suffix(&self) -> &'static str {
        match self {
            Suffix::Value => "",
            Suffix::Total => "_total",
            Suffix::Sum => "_sum",
            Suffix::Count => "_count",
            Suffix::Bucket(_) => "_bucket",
            Suffix::Created => "_created",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    name: String,
    help: String,
    kind: MetricKind,
    label_names: Vec<String>,
    buckets: Vec<f64>,
    delivery: Delivery,
}

impl MetricDefinition {
    pub fn builder(kind: MetricKind, name: impl Into<String>, help: impl Into<String>) -> MetricDefinitionBuilder {
        MetricDefinitionBuilder {
            kind,
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            buckets: None,
            delivery: Delivery::default(),
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> MetricDefinitionBuilder {
        Self::builder(MetricKind::Counter, name, help)
    }

    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> MetricDefinitionBuilder {
        Self::builder(MetricKind::Gauge, name, help)
    }

    pub fn histogram(name: impl Into<String>, help: impl Into<String>) -> MetricDefinitionBuilder {
        Self::builder(MetricKind::Histogram, name, help)
    }

    pub fn summary(name: impl Into<String>, help: impl Into<String>) -> MetricDefinitionBuilder {
        Self::builder(MetricKind::Summary, name, help)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Finite histogram bounds, ascending. Empty for other kinds.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// Every bucket suffix including the trailing `+Inf`.
    pub fn bucket_suffixes(&self) -> Vec<Suffix> {
        self.buckets
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .map(Suffix::Bucket)
            .collect()
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn is_push(&self) -> bool {
        self.delivery == Delivery::Push
    }
}

pub struct MetricDefinitionBuilder {
    kind: MetricKind,
    name: String,
    help: String,
    label_names: Vec<String>,
    buckets: Option<Vec<f64>>,
    delivery: Delivery,
}

impl MetricDefinitionBuilder {
    pub fn labels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Histogram upper bounds. A trailing `+Inf` is accepted and dropped.
    pub fn buckets<I: IntoIterator<Item = f64>>(mut self, bounds: I) -> Self {
        self.buckets = Some(bounds.into_iter().collect());
        self
    }

    pub fn delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn pull(self) -> Self {
        self.delivery(Delivery::Pull)
    }

    pub fn build(self) -> Result<MetricDefinition> {
        let mut name = self.name;
        if !is_valid_metric_name(&name) {
            return Err(PromDistError::InvalidDefinition(format!("invalid metric name: {name:?}")));
        }
        if self.kind == MetricKind::Counter {
            if let Some(stripped) = name.strip_suffix("_total") {
                name = stripped.to_string();
            }
        }

        for (i, l) in self.label_names.iter().enumerate() {
            if !is_valid_label_name(l) {
                return Err(PromDistError::InvalidDefinition(format!("invalid label name: {l:?}")));
            }
            if self.label_names[..i].contains(l) {
                return Err(PromDistError::InvalidDefinition(format!("duplicate label name: {l}")));
            }
            let reserved = match self.kind {
                MetricKind::Histogram => l == "le",
                MetricKind::Summary => l == "quantile",
                _ => false,
            };
            if reserved {
                return Err(PromDistError::InvalidDefinition(format!(
                    "label name {l:?} is reserved for {}",
                    self.kind.as_str()
                )));
            }
        }

        let buckets = match (self.kind, self.buckets) {
            (MetricKind::Histogram, None) => DEFAULT_BUCKETS.to_vec(),
            (MetricKind::Histogram, Some(b)) => validate_buckets(b)?,
            (_, None) => Vec::new(),
            (kind, Some(_)) => {
                return Err(PromDistError::InvalidDefinition(format!(
                    "buckets are only valid for histograms, not {}",
                    kind.as_str()
                )))
            }
        };

        Ok(MetricDefinition {
            name,
            help: self.help,
            kind: self.kind,
            label_names: self.label_names,
            buckets,
            delivery: self.delivery,
        })
    }
}

fn validate_buckets(mut b: Vec<f64>) -> Result<Vec<f64>> {
    if b.last().is_some_and(|v| *v == f64::INFINITY) {
        b.pop();
    }
    if b.is_empty() {
        return Err(PromDistError::InvalidDefinition(
            "histogram needs at least one finite bucket".into(),
        ));
    }
    if b.iter().any(|v| !v.is_finite()) {
        return Err(PromDistError::InvalidDefinition("bucket bounds must be finite".into()));
    }
    if b.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PromDistError::InvalidDefinition("buckets must be sorted ascending".into()));
    }
    Ok(b)
}

fn is_valid_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(s: &str) -> bool {
    if s.starts_with("__") {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
