//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value together with the instant it stops being valid.
///
/// Entries are never mutated after construction. Refreshing a key means
/// inserting a new entry in its place.
///
/// The entry does not carry its key: the key is the map key it is stored
/// under in [`CacheStore`](crate::cache::CacheStore).
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry inserted at `now` that expires after `ttl`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - How long the entry stays valid
    /// * `now` - Insertion instant
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| far_future(now));

        Self {
            value,
            inserted_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once `now` reaches `expires_at`, so an entry is
    /// already gone at exactly `inserted_at + ttl`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the time left before expiry, or zero if already expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

// Instant has no MAX; roughly a century is far enough for "never" in a cache.
fn far_future(now: Instant) -> Instant {
    const CENTURY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
    now.checked_add(CENTURY).unwrap_or(now)
}
