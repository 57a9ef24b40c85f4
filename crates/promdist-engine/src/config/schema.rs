use serde::Deserialize;

use promdist_core::error::{PromDistError, Result};
use promdist_core::{Delivery, MetricDefinition, MetricKind};

use crate::context::DEFAULT_PREFIX;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub version: u32,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// 0 disables expiry.
    #[serde(default)]
    pub ttl_secs: u64,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub metrics: Vec<MetricDecl>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromDistError::Config(format!("unsupported config version {}", self.version)));
        }
        if self.prefix.is_empty() {
            return Err(PromDistError::Config("prefix must not be empty".into()));
        }

        self.store.validate()?;

        for m in &self.metrics {
            m.to_definition()
                .map_err(|e| PromDistError::Config(format!("metric {}: {e}", m.name)))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub kind: StoreKind,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.kind == StoreKind::Redis && self.url.as_deref().map_or(true, str::is_empty) {
            return Err(PromDistError::Config("store.url is required for redis".into()));
        }
        if !(10..=60000).contains(&self.connect_timeout_ms) {
            return Err(PromDistError::Config(
                "store.connect_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        if !(10..=60000).contains(&self.response_timeout_ms) {
            return Err(PromDistError::Config(
                "store.response_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// A metric family the exporter reads back from the store.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricDecl {
    pub name: String,
    #[serde(default)]
    pub help: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub buckets: Option<Vec<f64>>,
    #[serde(default)]
    pub delivery: Delivery,
}

impl MetricDecl {
    pub fn to_definition(&self) -> Result<MetricDefinition> {
        let mut b = MetricDefinition::builder(self.kind, &self.name, &self.help)
            .labels(self.labels.iter().cloned())
            .delivery(self.delivery);
        if let Some(buckets) = &self.buckets {
            b = b.buckets(buckets.iter().copied());
        }
        b.build()
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.into()
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_response_timeout_ms() -> u64 {
    1000
}
fn default_listen() -> String {
    "0.0.0.0:9464".into()
}
