//! # TTL Cache
//!
//! A concurrent key → value map with per-entry expiry, used for the
//! per-network root cache and the optional path cache.
//!
//! Expired entries are dropped lazily on read. There is no size bound and no
//! LRU; the key space (networks, recently-queried commitments) is small.
//! Readers never block on an in-flight fetch: two concurrent misses both go
//! to the backend and the later `insert` wins.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Concurrent map whose entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache. A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Clone the value for `key` if present and unexpired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let hit = self.entries.get(key).and_then(|entry| {
            if now < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        });
        if hit.is_none() {
            // Guard must be dropped before removal or the shard deadlocks.
            self.entries.remove_if(key, |_, e| now >= e.expires_at);
        }
        hit
    }

    /// Store `value`, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop the entry for `key`, returning whether one was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
