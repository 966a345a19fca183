// ABOUTME: Bounded memoization cache shared by the analyzers, keyed by structured tuples
// ABOUTME: Mutex-guarded LRU; a race may recompute a key but can never corrupt the structure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU memoization cache
///
/// Keys are structured tuples such as `(metric, year, month)` rather than
/// formatted strings, which avoids collision and parsing bugs. Lifetime is
/// the owning analyzer's lifetime; `invalidate` empties it explicitly.
#[derive(Debug)]
pub struct MemoCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> MemoCache<K, V> {
    /// Cache bounded to `capacity` entries
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached value for `key`, refreshing its recency
    ///
    /// A poisoned lock is treated as a miss; duplicate computation on a race
    /// is acceptable, corrupting the cache is not.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner
            .lock()
            .ok()
            .and_then(|mut guard| guard.get(key).cloned())
    }

    /// Store a computed value
    pub fn put(&self, key: K, value: V) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.put(key, value);
        }
    }

    /// Drop every cached entry
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.clear();
        }
    }

    /// Number of currently cached entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map_or(0, |guard| guard.len())
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
