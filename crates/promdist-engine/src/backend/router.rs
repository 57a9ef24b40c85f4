use std::sync::Arc;

use promdist_core::error::{PromDistError, Result};
use promdist_core::MetricDefinition;

use super::MetricBackend;

/// Ordered list of registered backends. Each metric resolves to the first
/// backend whose predicate accepts it; there is no fallback chain.
#[derive(Default, Clone)]
pub struct BackendRouter {
    backends: Vec<Arc<dyn MetricBackend>>,
}

impl BackendRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn MetricBackend>) {
        self.backends.push(backend);
    }

    pub fn with(mut self, backend: Arc<dyn MetricBackend>) -> Self {
        self.register(backend);
        self
    }

    pub fn registered(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn select(&self, def: &MetricDefinition) -> Result<Arc<dyn MetricBackend>> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.accepts(def))
            .ok_or_else(|| {
                tracing::warn!(
                    metric = %def.name(),
                    delivery = ?def.delivery(),
                    backends = ?self.registered(),
                    "no backend accepts metric"
                );
                PromDistError::NotConfigured
            })?;
        tracing::debug!(metric = %def.name(), backend = backend.name(), "metric bound to backend");
        Ok(Arc::clone(backend))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::backend::{PullBackend, PushBackend};
    use crate::store::MemoryStore;

    #[test]
    fn predicate_picks_exactly_one() {
        let router = BackendRouter::new()
            .with(Arc::new(PushBackend::new(Arc::new(MemoryStore::new()), "p", None)))
            .with(Arc::new(PullBackend::new()));
        let push = MetricDefinition::counter("c", "h").build().unwrap();
        let pull = MetricDefinition::counter("c", "h").pull().build().unwrap();
        assert_eq!(router.select(&push).unwrap().name(), "push");
        assert_eq!(router.select(&pull).unwrap().name(), "pull");
    }

    #[test]
    fn no_match_is_not_configured() {
        let router = BackendRouter::new().with(Arc::new(PullBackend::new()));
        let push = MetricDefinition::counter("c", "h").build().unwrap();
        let err = router.select(&push).err().unwrap();
        assert_eq!(err.code().as_str(), "NOT_CONFIGURED");
    }
}
