//! Shared-store boundary.
//!
//! Every mutation maps to one atomic primitive on a hash-oriented store:
//! a hash key per metric series (`{prefix}_{name}{suffix}`), one field per
//! canonical label key, the value stored as a number. Callers never read,
//! modify and write back; concurrent writers from any number of processes
//! therefore never lose increments.
//!
//! TTLs are per field. A mutation with `ttl = Some(..)` pushes the field's
//! deadline forward; reads never touch it.

pub mod memory;
pub mod redis;

use std::time::Duration;

use promdist_core::Result;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Live fields of one hash.
///
/// Fields the store could not decode (non-UTF-8 bytes, a value that is not a
/// number) are left out of `fields` and counted in `skipped`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HashEntries {
    pub fields: Vec<(String, f64)>,
    pub skipped: usize,
}

impl HashEntries {
    pub fn new(fields: Vec<(String, f64)>) -> Self {
        Self { fields, skipped: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub trait SharedStore: Send + Sync {
    /// Atomically add `delta` to the field (absent counts as zero) and return the new value.
    fn incr_by(&self, key: &str, field: &str, delta: f64, ttl: Option<Duration>) -> Result<f64>;

    /// Overwrite the field.
    fn set(&self, key: &str, field: &str, value: f64, ttl: Option<Duration>) -> Result<()>;

    /// Write the field only if it is absent or expired. The deadline is
    /// refreshed either way. Returns whether the value was written.
    fn set_if_absent(&self, key: &str, field: &str, value: f64, ttl: Option<Duration>) -> Result<bool>;

    fn get(&self, key: &str, field: &str) -> Result<Option<f64>>;

    /// All live fields under `key`. Undecodable entries are skipped and
    /// counted, never turned into an error.
    fn get_all(&self, key: &str) -> Result<HashEntries>;
}
