//! Fixed-capacity least-recently-used cache with hit/miss/eviction counters.

use serde::Serialize;
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
}

/// LRU cache over [`lru::LruCache`] that also accepts a capacity of zero.
///
/// With capacity zero nothing is ever retained: `set` is a no-op and every lookup misses.
/// Eviction always happens before insertion, so `len() <= capacity()` holds at every point.
#[derive(Debug)]
pub struct LruCache<K: Hash + Eq, V> {
    name: &'static str,
    inner: Option<lru::LruCache<K, V>>,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self::named("lru", capacity)
    }

    /// Like [`LruCache::new`], with a name used in trace output.
    pub fn named(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            inner: NonZeroUsize::new(capacity).map(lru::LruCache::new),
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.inner.as_mut().and_then(|c| c.get(key));
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Inserts or updates `key`. Updating refreshes recency without growing the cache.
    pub fn set(&mut self, key: K, value: V) {
        let Some(cache) = self.inner.as_mut() else {
            return;
        };
        if cache.contains(&key) {
            cache.put(key, value);
            return;
        }
        if cache.len() >= self.capacity && cache.pop_lru().is_some() {
            self.evictions += 1;
            tracing::trace!(cache = self.name, "evicted least recently used entry");
        }
        cache.put(key, value);
    }

    /// Membership check; does not touch recency or counters.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.as_ref().is_some_and(|c| c.contains(key))
    }

    /// Reads a value without touching recency or counters.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.as_ref().and_then(|c| c.peek(key))
    }

    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner
            .as_mut()
            .is_some_and(|c| c.pop(key).is_some())
    }

    pub fn clear(&mut self) {
        if let Some(c) = self.inner.as_mut() {
            c.clear();
        }
    }

    /// Changes the capacity, evicting the oldest entries first when shrinking.
    pub fn resize(&mut self, capacity: usize) {
        if let Some(cache) = self.inner.as_mut() {
            while cache.len() > capacity {
                if cache.pop_lru().is_none() {
                    break;
                }
                self.evictions += 1;
            }
        }
        match NonZeroUsize::new(capacity) {
            None => self.inner = None,
            Some(cap) => {
                if let Some(cache) = self.inner.as_mut() {
                    cache.resize(cap);
                } else {
                    self.inner = Some(lru::LruCache::new(cap));
                }
            }
        }
        tracing::debug!(cache = self.name, capacity, "resized cache");
        self.capacity = capacity;
    }

    pub fn stats(&self) -> CacheStats {
        let accesses = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.len(),
            max_size: self.capacity,
            hit_rate: if accesses == 0 {
                0.0
            } else {
                self.hits as f64 / accesses as f64
            },
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }
}
