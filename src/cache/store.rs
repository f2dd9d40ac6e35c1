//! Cache Store Module
//!
//! Concurrent key-value table with lazy TTL expiration and an optional
//! capacity bound.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::cache::CacheEntry;

// == Cache Store ==
/// Concurrent cache storage with TTL support.
///
/// Backed by a sharded map: operations on keys that live in different shards
/// never wait on each other, and every method takes `&self`.
pub struct CacheStore<K, V> {
    /// Key-value storage
    entries: DashMap<K, CacheEntry<V>>,
    /// Maximum number of entries allowed, if bounded
    max_entries: Option<usize>,
    /// Entries removed to stay within `max_entries`
    evictions: AtomicU64,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: None,
            evictions: AtomicU64::new(0),
        }
    }

    /// Creates a store holding at most `max_entries` entries.
    ///
    /// When a new key would exceed the bound, expired entries are purged
    /// first, then the oldest entries by insertion time are evicted.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(max_entries),
            max_entries: Some(max_entries),
            evictions: AtomicU64::new(0),
        }
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Returns `None` if the key is absent or its entry has expired. An
    /// expired entry found here is removed on the spot, unless a concurrent
    /// `put` has already replaced it with a fresh one.
    pub fn get(&self, key: &K, now: Instant) -> Option<V> {
        {
            let item = self.entries.get(key)?;
            let entry = item.value();
            if !entry.is_expired(now) {
                return Some(entry.value().clone());
            }
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - How long the entry stays valid
    /// * `now` - Insertion instant
    pub fn put(&self, key: K, value: V, ttl: Duration, now: Instant) {
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                self.make_room(max, now);
            }
        }

        self.entries.insert(key, CacheEntry::new(value, ttl, now));
    }

    // == Invalidate ==
    /// Removes an entry by key, returning whether it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Invalidate All ==
    /// Removes every entry.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    // == Sweep Expired ==
    /// Removes all entries expired at `now`.
    ///
    /// Shards are locked one at a time, so readers and writers on other
    /// shards proceed while a sweep is running.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        removed
    }

    // == Contains Live ==
    /// Checks for a non-expired entry without cloning its value.
    pub fn contains_live(&self, key: &K, now: Instant) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries evicted to respect the capacity bound.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    // == Make Room ==
    // Bound is exact for a single inserter; racing inserters of distinct new
    // keys can overshoot by at most their number.
    fn make_room(&self, max: usize, now: Instant) {
        let expired = self.sweep_expired(now);
        if expired > 0 {
            debug!("Capacity reached: purged {} expired entries", expired);
        }

        while self.entries.len() >= max {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|item| item.value().inserted_at())
                .map(|item| (item.key().clone(), item.value().inserted_at()));

            let Some((key, inserted_at)) = oldest else {
                break;
            };

            // Skip if the key was refreshed since we looked at it.
            if self
                .entries
                .remove_if(&key, |_, entry| entry.inserted_at() == inserted_at)
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Capacity reached: evicted oldest entry");
            }
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("len", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .field("evictions", &self.evictions.load(Ordering::Relaxed))
            .finish()
    }
}

impl<K, V> Default for CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
