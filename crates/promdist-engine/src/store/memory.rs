//! In-process store with per-field deadlines.
//!
//! Each hash key lives in one `DashMap` entry; holding the entry's write
//! guard for the duration of an operation makes every primitive atomic with
//! respect to other threads. Expired fields are dropped lazily on access.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use promdist_core::Result;

use super::{HashEntries, SharedStore};
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy)]
struct Slot {
    value: f64,
    deadline: Option<Duration>,
}

impl Slot {
    fn live(&self, now: Duration) -> bool {
        self.deadline.map_or(true, |d| now < d)
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    hashes: DashMap<String, BTreeMap<String, Slot>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            hashes: DashMap::new(),
            clock,
        }
    }

    fn deadline(&self, now: Duration, ttl: Option<Duration>) -> Option<Duration> {
        ttl.map(|t| now + t)
    }

    /// Number of live fields under `key`.
    pub fn len(&self, key: &str) -> usize {
        let now = self.clock.now();
        self.hashes
            .get(key)
            .map_or(0, |h| h.values().filter(|s| s.live(now)).count())
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }
}

impl SharedStore for MemoryStore {
    fn incr_by(&self, key: &str, field: &str, delta: f64, ttl: Option<Duration>) -> Result<f64> {
        let now = self.clock.now();
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        let slot = hash.entry(field.to_string()).or_insert(Slot {
            value: 0.0,
            deadline: None,
        });
        if !slot.live(now) {
            slot.value = 0.0;
        }
        slot.value += delta;
        slot.deadline = self.deadline(now, ttl);
        Ok(slot.value)
    }

    fn set(&self, key: &str, field: &str, value: f64, ttl: Option<Duration>) -> Result<()> {
        let now = self.clock.now();
        let deadline = self.deadline(now, ttl);
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), Slot { value, deadline });
        Ok(())
    }

    fn set_if_absent(&self, key: &str, field: &str, value: f64, ttl: Option<Duration>) -> Result<bool> {
        let now = self.clock.now();
        let deadline = self.deadline(now, ttl);
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        match hash.get_mut(field) {
            Some(slot) if slot.live(now) => {
                slot.deadline = deadline;
                Ok(false)
            }
            _ => {
                hash.insert(field.to_string(), Slot { value, deadline });
                Ok(true)
            }
        }
    }

    fn get(&self, key: &str, field: &str) -> Result<Option<f64>> {
        let now = self.clock.now();
        let Some(mut hash) = self.hashes.get_mut(key) else {
            return Ok(None);
        };
        match hash.get(field).copied() {
            Some(slot) if slot.live(now) => Ok(Some(slot.value)),
            Some(_) => {
                hash.remove(field);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn get_all(&self, key: &str) -> Result<HashEntries> {
        let now = self.clock.now();
        let Some(mut hash) = self.hashes.get_mut(key) else {
            return Ok(HashEntries::default());
        };
        hash.retain(|_, s| s.live(now));
        Ok(HashEntries::new(
            hash.iter().map(|(f, s)| (f.clone(), s.value)).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::clock::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(Duration::from_secs(1_000)));
        let store = MemoryStore::with_clock(clock.clone());
        (clock, store)
    }

    #[test]
    fn incr_starts_from_zero() {
        let (_, s) = store();
        assert_eq!(s.incr_by("k", "f", 2.5, None).unwrap(), 2.5);
        assert_eq!(s.incr_by("k", "f", -1.0, None).unwrap(), 1.5);
        assert_eq!(s.get("k", "f").unwrap(), Some(1.5));
        assert_eq!(s.get("k", "other").unwrap(), None);
        assert_eq!(s.get("nope", "f").unwrap(), None);
    }

    #[test]
    fn ttl_expires_and_refreshes() {
        let (clock, s) = store();
        let ttl = Some(Duration::from_secs(2));
        s.incr_by("k", "f", 1.0, ttl).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(s.get("k", "f").unwrap(), Some(1.0));
        s.incr_by("k", "f", 1.0, ttl).unwrap();
        clock.advance(Duration::from_millis(1_500));
        assert_eq!(s.get("k", "f").unwrap(), Some(2.0));
        clock.advance(Duration::from_secs(1));
        assert_eq!(s.get("k", "f").unwrap(), None);
        // an expired field restarts from zero
        assert_eq!(s.incr_by("k", "f", 1.0, ttl).unwrap(), 1.0);
    }

    #[test]
    fn set_if_absent_keeps_live_value() {
        let (clock, s) = store();
        let ttl = Some(Duration::from_secs(2));
        assert!(s.set_if_absent("k", "f", 1.0, ttl).unwrap());
        clock.advance(Duration::from_secs(1));
        assert!(!s.set_if_absent("k", "f", 2.0, ttl).unwrap());
        clock.advance(Duration::from_millis(1_500));
        // deadline was pushed by the second call
        assert_eq!(s.get("k", "f").unwrap(), Some(1.0));
        clock.advance(Duration::from_secs(3));
        assert!(s.set_if_absent("k", "f", 3.0, ttl).unwrap());
        assert_eq!(s.get("k", "f").unwrap(), Some(3.0));
    }

    #[test]
    fn get_all_skips_expired() {
        let (clock, s) = store();
        s.set("k", "a", 1.0, Some(Duration::from_secs(1))).unwrap();
        s.set("k", "b", 2.0, None).unwrap();
        clock.advance(Duration::from_secs(2));
        assert_eq!(s.get_all("k").unwrap().fields, vec![("b".to_string(), 2.0)]);
        assert_eq!(s.len("k"), 1);
    }
}
