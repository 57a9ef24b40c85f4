//! Shared application state for the exporter.
//!
//! Builds the store context from config and registers every declared metric
//! family, so a scrape of this process renders what all writers pushed.

use std::sync::Arc;

use promdist_core::error::Result;
use promdist_core::MetricKind;

use crate::collector::Registry;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::family::{Counter, Gauge, Histogram, Summary};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: EngineConfig,
    ctx: Context,
    registry: Registry,
}

impl AppState {
    /// Build state from config, connecting to the configured store lazily.
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        let ctx = Context::from_config(&cfg)?;
        Self::with_context(cfg, ctx)
    }

    /// Build state on an existing context (tests, embedding).
    pub fn with_context(cfg: EngineConfig, ctx: Context) -> Result<Self> {
        let registry = Registry::new();
        for decl in &cfg.metrics {
            let def = decl.to_definition()?;
            match def.kind() {
                MetricKind::Counter => registry.register(Counter::new(&ctx, def)?)?,
                MetricKind::Gauge => registry.register(Gauge::new(&ctx, def)?)?,
                MetricKind::Histogram => registry.register(Histogram::new(&ctx, def)?)?,
                MetricKind::Summary => registry.register(Summary::new(&ctx, def)?)?,
            }
        }
        tracing::info!(families = registry.len(), "exporter registry built");

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, ctx, registry }),
        })
    }

    pub fn cfg(&self) -> &EngineConfig {
        &self.inner.cfg
    }

    pub fn context(&self) -> &Context {
        &self.inner.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}
