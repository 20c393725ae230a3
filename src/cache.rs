//! Owned TTL cache for read-heavy query results.
//!
//! Each cache is an explicit instance handed to its consumer, so tests can
//! build isolated caches instead of sharing process-wide state. Keys are
//! constructed through [`CacheKey`] rather than derived from arbitrary
//! values.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Typed cache-key construction. One constructor per cached query keeps the
/// key space enumerable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn removal_ranges(post_id: i64) -> Self {
        Self(format!("removal_ranges:{post_id}"))
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
