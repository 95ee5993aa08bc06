//! Time-bounded memoization keyed by arbitrary hashable keys.
//!
//! Timestamps come from the simulation clock, so expiry follows simulated
//! time rather than wall time.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Duration,
    last_used: Duration,
}

/// Bounded cache whose entries expire `ttl` after they were stored.
///
/// When full, inserting evicts expired entries first and then the least
/// recently used one.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Duration) -> bool {
        now.saturating_sub(entry.stored_at) < self.ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&mut self, key: &K, now: Duration) -> Option<V> {
        let fresh = match self.entries.get(key) {
            Some(entry) => self.is_fresh(entry, now),
            None => return None,
        };
        if !fresh {
            self.entries.remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.last_used = now;
        Some(entry.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V, now: Duration) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.purge_expired(now);
            if self.entries.len() >= self.capacity {
                self.evict_least_recent();
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                last_used: now,
            },
        );
    }

    /// Return the fresh cached value, or compute, store and return a new one
    pub fn get_or_insert_with<F>(&mut self, key: K, now: Duration, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key, now) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone(), now);
        value
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&mut self, now: Duration) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.stored_at) < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
