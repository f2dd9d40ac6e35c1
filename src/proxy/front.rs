//! Caching Proxy
//!
//! Read-through, write-invalidate coordinator sitting in front of a
//! [`ResourceAccessor`].

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::cache::{AccessRecorder, CacheStats, CacheStore, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{ReadError, Result};
use crate::proxy::flight::FlightGates;
use crate::proxy::ResourceAccessor;
use crate::tasks::Sweeper;

// == Caching Proxy ==
/// Public entry point of the cache.
///
/// Reads are served from the store while fresh and fetched through the
/// accessor otherwise. Writes invalidate the affected key around the
/// mutation so a stale value is never served after the write completes.
pub struct CachingProxy<A: ResourceAccessor> {
    store: Arc<CacheStore<A::Key, A::Value>>,
    recorder: AccessRecorder<A::Key>,
    accessor: A,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    sweep_interval: Duration,
    /// Present only when single-flight is enabled
    flights: Option<FlightGates<A::Key>>,
}

impl<A> CachingProxy<A>
where
    A: ResourceAccessor,
    A::Key: Eq + Hash + Clone + Send + Sync + 'static,
    A::Value: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a proxy with its own store, using the system clock.
    ///
    /// # Errors
    /// `CacheError::Configuration` if `config` is invalid.
    pub fn new(config: &CacheConfig, accessor: A) -> Result<Self> {
        Self::with_clock(config, accessor, Arc::new(SystemClock))
    }

    /// Creates a proxy with its own store and a custom clock.
    pub fn with_clock(config: &CacheConfig, accessor: A, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = match config.max_entries {
            Some(max) => CacheStore::with_capacity(max),
            None => CacheStore::new(),
        };
        Self::with_store(config, accessor, Arc::new(store), clock)
    }

    /// Creates a proxy over an existing store.
    ///
    /// The store's own capacity bound applies; `config.max_entries` is only
    /// used by the other constructors.
    pub fn with_store(
        config: &CacheConfig,
        accessor: A,
        store: Arc<CacheStore<A::Key, A::Value>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            store,
            recorder: AccessRecorder::new(),
            accessor,
            clock,
            ttl: config.ttl,
            sweep_interval: config.sweep_interval,
            flights: config.single_flight.then(FlightGates::new),
        })
    }

    // == Read ==
    /// Returns the value for `key`, fetching it on a miss.
    ///
    /// A fetch error is returned as-is and nothing is cached. Dropping the
    /// returned future cancels the fetch; the store is only written once a
    /// fetch has completed, so a cancelled read leaves no entry behind.
    pub async fn read(&self, key: &A::Key) -> std::result::Result<A::Value, A::Error> {
        let now = self.clock.now();
        if let Some(value) = self.lookup(key, now) {
            return Ok(value);
        }

        match &self.flights {
            Some(flights) => {
                let _slot = flights.acquire(key).await;
                // Whoever held the gate before us may have filled it
                let now = self.clock.now();
                if let Some(value) = self.lookup(key, now) {
                    return Ok(value);
                }
                self.fill(key, now).await
            }
            None => self.fill(key, now).await,
        }
    }

    // == Read With Timeout ==
    /// Like [`read`](Self::read), but gives up after `timeout`.
    ///
    /// A timed-out read counts as a miss and caches nothing.
    pub async fn read_with_timeout(
        &self,
        key: &A::Key,
        timeout: Duration,
    ) -> std::result::Result<A::Value, ReadError<A::Error>> {
        match tokio::time::timeout(timeout, self.read(key)).await {
            Ok(result) => result.map_err(ReadError::Fetch),
            Err(_) => {
                self.recorder.record_miss(key);
                warn!("Read-through timed out after {:?}", timeout);
                Err(ReadError::TimedOut(timeout))
            }
        }
    }

    // == Write ==
    /// Runs `mutation` with `key` invalidated on both sides of it.
    ///
    /// The key is dropped before the mutation starts and again after it
    /// finishes, whatever the outcome; a reader that refilled the key from
    /// pre-mutation state in between is discarded too.
    pub async fn write<R, E, Fut>(&self, key: &A::Key, mutation: Fut) -> std::result::Result<R, E>
    where
        Fut: Future<Output = std::result::Result<R, E>>,
    {
        self.store.invalidate(key);
        let outcome = mutation.await;
        self.store.invalidate(key);

        if outcome.is_err() {
            debug!("Mutation failed, key left invalidated");
        }
        outcome
    }

    // == Write All ==
    /// Like [`write`](Self::write) for mutations that can touch any key.
    pub async fn write_all<R, E, Fut>(&self, mutation: Fut) -> std::result::Result<R, E>
    where
        Fut: Future<Output = std::result::Result<R, E>>,
    {
        self.store.invalidate_all();
        let outcome = mutation.await;
        self.store.invalidate_all();
        outcome
    }

    /// Drops the cached value for `key`, returning whether one existed.
    pub fn invalidate(&self, key: &A::Key) -> bool {
        self.store.invalidate(key)
    }

    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
    }

    // == Stats ==
    /// Returns current cache statistics. Read-only.
    pub fn stats(&self) -> CacheStats<A::Key> {
        CacheStats::new(
            self.recorder.snapshot(),
            self.store.evictions(),
            self.store.len(),
        )
    }

    pub fn reset_stats(&self) {
        self.recorder.reset();
    }

    // == Sweeper ==
    /// Builds and starts a sweeper over this proxy's store at the
    /// configured interval.
    ///
    /// The caller owns the returned sweeper and is responsible for stopping it.
    pub fn spawn_sweeper(&self) -> Result<Sweeper<A::Key, A::Value>> {
        let mut sweeper = Sweeper::new(self.store(), self.clock(), self.sweep_interval)?;
        sweeper.start()?;
        Ok(sweeper)
    }

    // == Accessors ==
    pub fn store(&self) -> Arc<CacheStore<A::Key, A::Value>> {
        Arc::clone(&self.store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn single_flight(&self) -> bool {
        self.flights.is_some()
    }

    fn lookup(&self, key: &A::Key, now: Instant) -> Option<A::Value> {
        let value = self.store.get(key, now)?;
        self.recorder.record_hit(key);
        trace!("Cache hit");
        Some(value)
    }

    async fn fill(
        &self,
        key: &A::Key,
        now: Instant,
    ) -> std::result::Result<A::Value, A::Error> {
        debug!("Cache miss, fetching from resource");
        let fetched = self.accessor.fetch(key).await;
        self.recorder.record_miss(key);

        let value = fetched?;
        self.store
            .put(key.clone(), value.clone(), self.ttl, now);
        Ok(value)
    }
}
