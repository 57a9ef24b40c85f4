//! Store configuration handle.
//!
//! A `Context` is constructed explicitly and handed to every metric family.
//! `setup` installs a new immutable configuration generation (store, key
//! prefix, TTL, clock). A family binds to the generation current when it is
//! constructed, or, if none exists yet, at its first operation. Calling
//! `setup` again affects families created afterwards; bound families and
//! keys already written keep their prefix.
//!
//! Until `setup` has been called every operation fails with `NotConfigured`.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use promdist_core::error::{PromDistError, Result};

use crate::backend::{BackendRouter, PullBackend, PushBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, StoreKind};
use crate::store::{MemoryStore, RedisStore, SharedStore};

pub const DEFAULT_PREFIX: &str = "prometheus";

pub struct SetupOptions {
    store: Option<Arc<dyn SharedStore>>,
    prefix: String,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl SetupOptions {
    /// Push metrics go to `store`; pull metrics stay in process.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::local()
        }
    }

    /// No shared store: only pull metrics can be used.
    pub fn local() -> Self {
        Self {
            store: None,
            prefix: DEFAULT_PREFIX.to_string(),
            ttl: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl.filter(|t| !t.is_zero());
        self
    }

    /// TTL in seconds; 0 disables expiry.
    pub fn ttl_secs(self, secs: u64) -> Self {
        self.ttl(Some(Duration::from_secs(secs)))
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// One installed configuration.
pub struct Generation {
    version: u64,
    prefix: String,
    ttl: Option<Duration>,
    router: BackendRouter,
    clock: Arc<dyn Clock>,
}

impl Generation {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[derive(Clone, Default)]
pub struct Context {
    current: Arc<RwLock<Option<Arc<Generation>>>>,
    pull: Arc<PullBackend>,
}

impl Context {
    /// Unconfigured context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and configure a context from a loaded config file.
    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        let store: Arc<dyn SharedStore> = match cfg.store.kind {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Redis => {
                let url = cfg
                    .store
                    .url
                    .as_deref()
                    .ok_or_else(|| PromDistError::Config("store.url is required for redis".into()))?;
                Arc::new(RedisStore::open(
                    url,
                    Duration::from_millis(cfg.store.connect_timeout_ms),
                    Duration::from_millis(cfg.store.response_timeout_ms),
                )?)
            }
        };
        let ctx = Self::new();
        ctx.setup(
            SetupOptions::new(store)
                .prefix(cfg.prefix.clone())
                .ttl_secs(cfg.ttl_secs),
        )?;
        Ok(ctx)
    }

    /// Install a new configuration generation. Returns its version.
    pub fn setup(&self, opts: SetupOptions) -> Result<u64> {
        if opts.prefix.is_empty() {
            return Err(PromDistError::Config("prefix must not be empty".into()));
        }

        let mut router = BackendRouter::new();
        if let Some(store) = opts.store {
            router.register(Arc::new(PushBackend::new(store, opts.prefix.clone(), opts.ttl)));
        }
        router.register(self.pull.clone());

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let version = current.as_ref().map_or(1, |g| g.version + 1);
        tracing::debug!(
            version,
            prefix = %opts.prefix,
            ttl_secs = opts.ttl.map(|t| t.as_secs()),
            backends = ?router.registered(),
            "metrics store configured"
        );
        *current = Some(Arc::new(Generation {
            version,
            prefix: opts.prefix,
            ttl: opts.ttl,
            router,
            clock: opts.clock,
        }));
        Ok(version)
    }

    /// Current configuration, or `NotConfigured`.
    pub fn generation(&self) -> Result<Arc<Generation>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(PromDistError::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.generation().is_ok()
    }

    /// The in-process accumulator shared by every generation of this context.
    pub fn pull_backend(&self) -> Arc<PullBackend> {
        Arc::clone(&self.pull)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn unconfigured_until_setup() {
        let ctx = Context::new();
        assert_eq!(ctx.generation().err().unwrap().code().as_str(), "NOT_CONFIGURED");
        let v = ctx.setup(SetupOptions::new(Arc::new(MemoryStore::new()))).unwrap();
        assert_eq!(v, 1);
        let g = ctx.generation().unwrap();
        assert_eq!(g.prefix(), DEFAULT_PREFIX);
        assert_eq!(g.ttl(), None);
        assert_eq!(g.router().registered(), vec!["push", "pull"]);
    }

    #[test]
    fn resetup_bumps_version() {
        let ctx = Context::new();
        let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
        ctx.setup(SetupOptions::new(store.clone()).prefix("a")).unwrap();
        let v = ctx.setup(SetupOptions::new(store).prefix("b").ttl_secs(5)).unwrap();
        assert_eq!(v, 2);
        let g = ctx.generation().unwrap();
        assert_eq!(g.prefix(), "b");
        assert_eq!(g.ttl(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_ttl_means_no_expiry_and_empty_prefix_fails() {
        let ctx = Context::new();
        ctx.setup(SetupOptions::local().ttl_secs(0)).unwrap();
        assert_eq!(ctx.generation().unwrap().ttl(), None);
        assert!(ctx.setup(SetupOptions::local().prefix("")).is_err());
    }
}
