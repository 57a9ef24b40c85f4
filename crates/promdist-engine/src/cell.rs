//! One atomically mutable sample.

use std::sync::Arc;

use promdist_core::Result;

use crate::backend::{CellAddr, MetricBackend};

/// A counter value, a gauge value, or one component (`_sum`, `_count`, a
/// bucket, `_created`) of a histogram or summary, for one label combination.
///
/// The cell is created lazily by the first write. Writes refresh its TTL,
/// reads never do. `get` returns `None` for a cell that was never written
/// or has expired.
#[derive(Clone)]
pub struct ValueCell {
    backend: Arc<dyn MetricBackend>,
    addr: CellAddr,
}

impl std::fmt::Debug for ValueCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCell")
            .field("backend", &self.backend.name())
            .field("addr", &self.addr)
            .finish()
    }
}

impl ValueCell {
    pub fn new(backend: Arc<dyn MetricBackend>, addr: CellAddr) -> Self {
        Self { backend, addr }
    }

    pub fn addr(&self) -> &CellAddr {
        &self.addr
    }

    pub fn increment(&self, delta: f64) -> Result<f64> {
        self.backend.increment(&self.addr, delta)
    }

    pub fn decrement(&self, delta: f64) -> Result<f64> {
        self.backend.decrement(&self.addr, delta)
    }

    pub fn set(&self, value: f64) -> Result<()> {
        self.backend.set(&self.addr, value)
    }

    pub fn set_if_absent(&self, value: f64) -> Result<bool> {
        self.backend.set_if_absent(&self.addr, value)
    }

    pub fn get(&self) -> Result<Option<f64>> {
        self.backend.get(&self.addr)
    }
}
