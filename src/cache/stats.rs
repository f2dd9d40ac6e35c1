//! Cache Statistics Module
//!
//! Combined view of access counters and store occupancy.

use std::collections::HashMap;

use serde::Serialize;

use crate::cache::{AccessSnapshot, KeyAccess};

// == Cache Stats ==
/// Cache performance metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats<K> {
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that went to the resource accessor
    pub misses: u64,
    /// Entries evicted to respect the capacity bound
    pub evictions: u64,
    /// Current number of entries in the store, including expired ones not yet swept
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub per_key: HashMap<K, KeyAccess>,
}

impl<K> CacheStats<K> {
    // == Constructor ==
    /// Builds stats from an access snapshot and store counters.
    pub fn new(access: AccessSnapshot<K>, evictions: u64, total_entries: usize) -> Self {
        Self {
            hit_rate: access.hit_rate(),
            hits: access.hits,
            misses: access.misses,
            evictions,
            total_entries,
            per_key: access.per_key,
        }
    }

    /// Total number of reads observed.
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }
}
