//! Access Recorder Module
//!
//! Thread-safe hit/miss counters, both aggregate and per key.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

// == Key Access ==
/// Counters for a single key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyAccess {
    pub hits: u64,
    pub misses: u64,
    /// Wall-clock time of the most recent read of this key
    pub last_access: DateTime<Utc>,
}

impl KeyAccess {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            hits: 0,
            misses: 0,
            last_access: at,
        }
    }
}

// == Access Snapshot ==
/// Point-in-time copy of an [`AccessRecorder`].
///
/// Counters are read one after another, so a snapshot taken under load may
/// mix values from slightly different instants.
#[derive(Debug, Clone, Serialize)]
pub struct AccessSnapshot<K> {
    pub hits: u64,
    pub misses: u64,
    pub per_key: HashMap<K, KeyAccess>,
}

impl<K> AccessSnapshot<K> {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was recorded.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Access Recorder ==
/// Records cache hits and misses.
pub struct AccessRecorder<K> {
    hits: AtomicU64,
    misses: AtomicU64,
    per_key: DashMap<K, KeyAccess>,
}

impl<K> AccessRecorder<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            per_key: DashMap::new(),
        }
    }

    // == Record Hit ==
    pub fn record_hit(&self, key: &K) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.touch(key, |access| access.hits += 1);
    }

    // == Record Miss ==
    pub fn record_miss(&self, key: &K) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.touch(key, |access| access.misses += 1);
    }

    // == Snapshot ==
    /// Copies the current counters.
    pub fn snapshot(&self) -> AccessSnapshot<K> {
        AccessSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            per_key: self
                .per_key
                .iter()
                .map(|item| (item.key().clone(), *item.value()))
                .collect(),
        }
    }

    // == Reset ==
    /// Zeroes every counter and forgets per-key history.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.per_key.clear();
    }

    fn touch(&self, key: &K, bump: impl FnOnce(&mut KeyAccess)) {
        let now = Utc::now();
        // Avoid cloning the key for keys we've already seen
        if let Some(mut access) = self.per_key.get_mut(key) {
            bump(access.value_mut());
            access.last_access = now;
            return;
        }

        let mut access = self
            .per_key
            .entry(key.clone())
            .or_insert_with(|| KeyAccess::new(now));
        bump(access.value_mut());
        access.last_access = now;
    }
}

impl<K: Eq + Hash> fmt::Debug for AccessRecorder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessRecorder")
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .field("keys", &self.per_key.len())
            .finish()
    }
}

impl<K> Default for AccessRecorder<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
