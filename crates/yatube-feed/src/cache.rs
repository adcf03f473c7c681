//! Time-bounded cache of rendered pages.
//!
//! Entries are keyed by request identity (path plus query) and served until
//! their TTL runs out, even if the posts they show have changed since. Writes
//! to posts never evict entries; only expiry and [`PageCache::clear`] do.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

/// Reference TTL for the global feed, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 20;

/// Longest TTL the server accepts from configuration: one day.
pub const MAX_TTL_SECS: i64 = 86_400;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Entry {
    body: Bytes,
    expires_at: DateTime<Utc>,
}

pub struct PageCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl PageCache {
    pub fn new(ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_system_clock(ttl: TimeDelta) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// The stored body for `key`, unless it has expired.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = self.clock.now();
        let entries = self.read("get");
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                debug!(key, "page cache hit");
                Some(entry.body.clone())
            }
            Some(_) => {
                debug!(key, "page cache entry expired");
                None
            }
            None => {
                debug!(key, "page cache miss");
                None
            }
        }
    }

    /// Store `body` under `key` for one TTL. Last writer wins.
    pub fn insert(&self, key: impl Into<String>, body: Bytes) {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.write("insert").insert(key.into(), Entry { body, expires_at });
    }

    /// Drop every entry regardless of age. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.write("clear");
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "page cache cleared");
        dropped
    }

    /// Drop expired entries. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.write("purge_expired");
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, op: &'static str) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!(op, "recovered from poisoned page cache lock");
            poisoned.into_inner()
        })
    }

    fn write(&self, op: &'static str) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(op, "recovered from poisoned page cache lock");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (PageCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = PageCache::new(TimeDelta::seconds(DEFAULT_TTL_SECS), clock.clone());
        (cache, clock)
    }

    #[test]
    fn serves_until_ttl() {
        let (cache, clock) = cache();
        cache.insert("/?page=1", Bytes::from_static(b"first"));

        clock.advance(TimeDelta::seconds(19));
        assert_eq!(cache.get("/?page=1").as_deref(), Some(&b"first"[..]));

        clock.advance(TimeDelta::seconds(1));
        assert_eq!(cache.get("/?page=1"), None);
    }

    #[test]
    fn oversized_ttl_saturates() {
        let cache = PageCache::with_system_clock(TimeDelta::seconds(10_000_000_000_000));
        cache.insert("/", Bytes::from_static(b"forever"));
        assert_eq!(cache.get("/").as_deref(), Some(&b"forever"[..]));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn keys_are_independent() {
        let (cache, _) = cache();
        cache.insert("/", Bytes::from_static(b"one"));
        cache.insert("/?page=2", Bytes::from_static(b"two"));

        assert_eq!(cache.get("/").as_deref(), Some(&b"one"[..]));
        assert_eq!(cache.get("/?page=2").as_deref(), Some(&b"two"[..]));
        assert_eq!(cache.get("/?page=3"), None);
    }

    #[test]
    fn overwrite_restarts_ttl() {
        let (cache, clock) = cache();
        cache.insert("/", Bytes::from_static(b"old"));
        clock.advance(TimeDelta::seconds(15));
        cache.insert("/", Bytes::from_static(b"new"));
        clock.advance(TimeDelta::seconds(15));

        assert_eq!(cache.get("/").as_deref(), Some(&b"new"[..]));
    }

    #[test]
    fn clear_ignores_ttl() {
        let (cache, _) = cache();
        cache.insert("/", Bytes::from_static(b"page"));
        cache.insert("/?page=2", Bytes::from_static(b"page"));

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.get("/"), None);
    }

    #[test]
    fn purge_drops_only_expired() {
        let (cache, clock) = cache();
        cache.insert("/old", Bytes::from_static(b"old"));
        clock.advance(TimeDelta::seconds(10));
        cache.insert("/fresh", Bytes::from_static(b"fresh"));
        clock.advance(TimeDelta::seconds(10));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("/fresh").is_some());
    }

    #[test]
    fn concurrent_access_is_safe() {
        let (cache, _) = cache();
        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        cache.insert("/", Bytes::from(format!("{i}-{j}")));
                        assert!(cache.get("/").is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
