//! TTL Sweeper Task
//!
//! Background task that periodically removes expired cache entries so the
//! store does not fill up with values nobody reads again.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, Clock};
use crate::error::{CacheError, Result};

// == Sweep Control ==
// Shared between the owner and the loop. `stopped` doubles as the gate a
// cycle must pass to begin, which is what makes `stop` final.
#[derive(Debug, Default)]
struct SweepControl {
    stopped: Mutex<bool>,
    wake: Notify,
}

impl SweepControl {
    fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_one();
    }

    /// Runs `launch` unless stopped, holding the gate while it runs.
    fn begin_cycle<R>(&self, launch: impl FnOnce() -> R) -> Option<R> {
        let stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            return None;
        }
        Some(launch())
    }
}

#[derive(Debug, Default)]
struct SweepCounters {
    cycles: AtomicU64,
    failed: AtomicU64,
    removed: AtomicU64,
}

struct RunningSweep {
    control: Arc<SweepControl>,
    handle: JoinHandle<()>,
}

// == Sweeper ==
/// Periodically purges expired entries from a [`CacheStore`].
///
/// Starts `Stopped`. `start` schedules a sweep every `interval`; ticks missed
/// while a cycle overruns are skipped, and a cycle is awaited before the
/// next tick is taken, so cycles never overlap.
pub struct Sweeper<K, V> {
    store: Arc<CacheStore<K, V>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    counters: Arc<SweepCounters>,
    running: Option<RunningSweep>,
}

impl<K, V> Sweeper<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a stopped sweeper for `store`.
    ///
    /// # Errors
    /// `CacheError::Configuration` if `interval` is zero.
    pub fn new(
        store: Arc<CacheStore<K, V>>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(CacheError::Configuration(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            store,
            clock,
            interval,
            counters: Arc::new(SweepCounters::default()),
            running: None,
        })
    }

    // == Start ==
    /// Spawns the sweep loop on the current Tokio runtime.
    ///
    /// # Errors
    /// - `CacheError::SweeperAlreadyRunning` if already started
    /// - `CacheError::NoRuntime` if called outside a Tokio runtime
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(CacheError::SweeperAlreadyRunning);
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let control = Arc::new(SweepControl::default());
        let handle = runtime.spawn(sweep_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.interval,
            Arc::clone(&control),
            Arc::clone(&self.counters),
        ));

        info!("Starting TTL sweeper with interval of {:?}", self.interval);
        self.running = Some(RunningSweep { control, handle });
        Ok(())
    }

    // == Stop ==
    /// Stops the sweeper.
    ///
    /// Once this returns no new cycle will begin. A cycle already in progress
    /// is left to finish; await the returned handle to wait for it.
    /// Returns `None` if the sweeper was not running.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let running = self.running.take()?;
        running.control.stop();
        info!("TTL sweeper stopped");
        Some(running.handle)
    }

    // == Sweep Now ==
    /// Runs one sweep inline on the calling thread.
    pub fn sweep_now(&self) -> usize {
        let removed = self.store.sweep_expired(self.clock.now());
        self.counters.cycles.fetch_add(1, Ordering::Relaxed);
        self.counters
            .removed
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|running| !running.handle.is_finished())
            .unwrap_or(false)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Completed sweep cycles, failed ones excluded.
    pub fn cycles(&self) -> u64 {
        self.counters.cycles.load(Ordering::Relaxed)
    }

    pub fn failed_cycles(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Total entries removed across all cycles.
    pub fn removed_total(&self) -> u64 {
        self.counters.removed.load(Ordering::Relaxed)
    }
}

impl<K, V> Drop for Sweeper<K, V> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.control.stop();
        }
    }
}

impl<K, V> fmt::Debug for Sweeper<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("interval", &self.interval)
            .field("running", &self.running.is_some())
            .field("counters", &self.counters)
            .finish()
    }
}

// == Sweep Loop ==
async fn sweep_loop<K, V>(
    store: Arc<CacheStore<K, V>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    control: Arc<SweepControl>,
    counters: Arc<SweepCounters>,
) where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = control.wake.notified() => break,
            _ = ticker.tick() => {}
        }

        let launched = control.begin_cycle(|| {
            let store = Arc::clone(&store);
            let now = clock.now();
            tokio::task::spawn_blocking(move || store.sweep_expired(now))
        });
        let Some(cycle) = launched else {
            break;
        };

        match cycle.await {
            Ok(removed) => {
                counters.cycles.fetch_add(1, Ordering::Relaxed);
                counters
                    .removed
                    .fetch_add(removed as u64, Ordering::Relaxed);

                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
            }
            Err(join_error) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                let err = CacheError::SweepCycle(join_error.to_string());
                warn!("{}; next cycle will still run", err);
            }
        }
    }

    debug!("TTL sweep loop exited");
}
