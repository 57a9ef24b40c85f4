//! Redis-backed shared store.
//!
//! Values live in hashes and are mutated with `HINCRBYFLOAT`, `HSET` and
//! `HSETNX`. When a TTL is configured each write is paired with `HEXPIRE`
//! (per-field expiry, Redis 7.4+) inside a `MULTI` pipeline so the value and
//! its deadline change together.
//!
//! Connections come from a small idle pool: a call takes one for its round
//! trip and hands it back afterwards, so callers on different threads do not
//! queue behind one socket. A connection that hit an I/O error or timeout is
//! dropped; a command the server rejected leaves it in the pool. Nothing is
//! retried inside a call: the error goes back to the instrumentation site.

use std::sync::Mutex;
use std::time::Duration;

use promdist_core::error::{PromDistError, Result};

use super::{HashEntries, SharedStore};

/// Idle connections kept per store. Busier processes open more on demand.
pub const DEFAULT_MAX_IDLE: usize = 8;

pub struct RedisStore {
    client: redis::Client,
    pool: IdlePool<redis::Connection>,
    connect_timeout: Duration,
    response_timeout: Duration,
}

/// LIFO stack of idle connections with a cap on how many are kept.
struct IdlePool<C> {
    idle: Mutex<Vec<C>>,
    max_idle: usize,
}

impl<C> IdlePool<C> {
    fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    fn take(&self) -> Option<C> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner()).pop()
    }

    /// Return a healthy connection; beyond the cap it is closed instead.
    fn put(&self, conn: C) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }

    fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("idle", &self.pool.idle())
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}

impl RedisStore {
    /// Create a store for `url`. No connection is made until the first call.
    pub fn open(url: &str, connect_timeout: Duration, response_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| PromDistError::Config(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            pool: IdlePool::new(DEFAULT_MAX_IDLE),
            connect_timeout,
            response_timeout,
        })
    }

    fn with_conn<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> Result<T> {
        let mut conn = match self.pool.take() {
            Some(c) => c,
            None => self.connect().map_err(|e| unavailable(op, e))?,
        };

        match f(&mut conn) {
            Ok(v) => {
                self.pool.put(conn);
                Ok(v)
            }
            Err(e) => {
                if !connection_broken(&e) {
                    self.pool.put(conn);
                }
                Err(unavailable(op, e))
            }
        }
    }

    fn connect(&self) -> redis::RedisResult<redis::Connection> {
        let conn = self.client.get_connection_with_timeout(self.connect_timeout)?;
        conn.set_read_timeout(Some(self.response_timeout))?;
        conn.set_write_timeout(Some(self.response_timeout))?;
        tracing::debug!(addr = ?self.client.get_connection_info().addr, "redis store connected");
        Ok(conn)
    }
}

fn unavailable(op: &'static str, e: redis::RedisError) -> PromDistError {
    tracing::warn!(op, error = %e, "redis store call failed");
    PromDistError::StoreUnavailable(format!("{op}: {e}"))
}

/// I/O failures and timeouts leave the socket in an unknown state.
fn connection_broken(e: &redis::RedisError) -> bool {
    e.is_io_error() || e.is_timeout() || e.is_connection_dropped() || e.is_connection_refusal()
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn push_expire(pipe: &mut redis::Pipeline, key: &str, field: &str, ttl: Option<Duration>) {
    if let Some(ttl) = ttl {
        pipe.cmd("HEXPIRE")
            .arg(key)
            .arg(ttl_secs(ttl))
            .arg("FIELDS")
            .arg(1)
            .arg(field)
            .ignore();
    }
}

fn parse_value(key: &str, field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>().map_err(|_| {
        PromDistError::Decode(format!("{key}/{field}: stored value {raw:?} is not a number"))
    })
}

fn decode_hash(key: &str, raw: Vec<(Vec<u8>, Vec<u8>)>) -> HashEntries {
    let mut entries = HashEntries::default();
    for (field, value) in raw {
        let decoded = String::from_utf8(field)
            .map_err(|_| PromDistError::Decode(format!("{key}: field is not valid UTF-8")))
            .and_then(|field| {
                let value = std::str::from_utf8(&value).map_err(|_| {
                    PromDistError::Decode(format!("{key}/{field}: value is not valid UTF-8"))
                })?;
                let v = parse_value(key, &field, value)?;
                Ok((field, v))
            });
        match decoded {
            Ok(entry) => entries.fields.push(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable stored entry");
                entries.skipped += 1;
            }
        }
    }
    entries
}

impl SharedStore for RedisStore {
    fn incr_by(&self, key: &str, field: &str, delta: f64, ttl: Option<Duration>) -> Result<f64> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("HINCRBYFLOAT").arg(key).arg(field).arg(delta);
        push_expire(&mut pipe, key, field, ttl);
        let (value,): (f64,) = self.with_conn("incr_by", |c| pipe.query(c))?;
        Ok(value)
    }

    fn set(&self, key: &str, field: &str, value: f64, ttl: Option<Duration>) -> Result<()> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("HSET").arg(key).arg(field).arg(value).ignore();
        push_expire(&mut pipe, key, field, ttl);
        self.with_conn("set", |c| pipe.query::<()>(c))
    }

    fn set_if_absent(&self, key: &str, field: &str, value: f64, ttl: Option<Duration>) -> Result<bool> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("HSETNX").arg(key).arg(field).arg(value);
        push_expire(&mut pipe, key, field, ttl);
        let (written,): (bool,) = self.with_conn("set_if_absent", |c| pipe.query(c))?;
        Ok(written)
    }

    fn get(&self, key: &str, field: &str) -> Result<Option<f64>> {
        let raw: Option<String> =
            self.with_conn("get", |c| redis::cmd("HGET").arg(key).arg(field).query(c))?;
        raw.map(|r| parse_value(key, field, &r)).transpose()
    }

    fn get_all(&self, key: &str) -> Result<HashEntries> {
        // Raw bytes: one foreign entry must not fail the whole reply.
        let raw: Vec<(Vec<u8>, Vec<u8>)> =
            self.with_conn("get_all", |c| redis::cmd("HGETALL").arg(key).query(c))?;
        Ok(decode_hash(key, raw))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn bad_url_is_a_config_error() {
        let err = RedisStore::open("not-a-url", Duration::from_millis(10), Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.code().as_str(), "CONFIG");
    }

    #[test]
    fn unreachable_server_surfaces_store_unavailable() {
        // port 1 on loopback refuses connections immediately
        let store = RedisStore::open(
            "redis://127.0.0.1:1/",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = store.incr_by("k", "{}", 1.0, None).unwrap_err();
        assert_eq!(err.code().as_str(), "STORE_UNAVAILABLE");
        // no internal retry loop: a second call fails the same way
        assert!(store.get("k", "{}").is_err());
    }

    #[test]
    fn unreadable_entries_are_counted_not_fatal() {
        let raw = vec![
            (br#"{"a":"1"}"#.to_vec(), b"2.5".to_vec()),
            (vec![b'{', 0xff, b'}'], b"1".to_vec()),
            (br#"{"a":"2"}"#.to_vec(), vec![0xfe, 0xff]),
            (br#"{"a":"3"}"#.to_vec(), b"lots".to_vec()),
            (br#"{"a":"4"}"#.to_vec(), b"inf".to_vec()),
        ];
        let entries = decode_hash("k", raw);
        assert_eq!(entries.skipped, 3);
        assert_eq!(
            entries.fields,
            vec![
                (r#"{"a":"1"}"#.to_string(), 2.5),
                (r#"{"a":"4"}"#.to_string(), f64::INFINITY),
            ]
        );
    }

    #[test]
    fn idle_pool_reuses_and_caps() {
        let pool = IdlePool::new(2);
        assert_eq!(pool.take(), None::<u32>);
        pool.put(1);
        pool.put(2);
        pool.put(3);
        assert_eq!(pool.idle(), 2);
        assert_eq!(pool.take(), Some(2));
        assert_eq!(pool.take(), Some(1));
        assert_eq!(pool.take(), None);
    }

    #[test]
    fn unreachable_server_leaves_no_idle_connection() {
        let store = RedisStore::open(
            "redis://127.0.0.1:1/",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(store.set("k", "{}", 1.0, None).is_err());
        assert_eq!(store.pool.idle(), 0);
    }

    #[test]
    fn ttl_rounds_up_to_a_second() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(3600)), 3600);
    }
}
