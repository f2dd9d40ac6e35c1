//! Per-key gates that let concurrent misses share one fetch.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One key's gate and the number of callers holding or waiting on it.
struct Gate {
    lock: Arc<Mutex<()>>,
    holders: AtomicUsize,
}

impl Gate {
    fn new() -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            holders: AtomicUsize::new(0),
        }
    }
}

/// Table of in-flight fetches, one gate per key.
///
/// Gates are created on demand and removed by the last caller to leave,
/// whether it fetched or gave up while waiting, so the table only contains
/// keys that currently have a fetch running or queued.
pub(crate) struct FlightGates<K> {
    gates: DashMap<K, Gate>,
}

impl<K> FlightGates<K>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            gates: DashMap::new(),
        }
    }

    /// Waits until no other caller holds the gate for `key`, then holds it.
    pub(crate) async fn acquire(&self, key: &K) -> FlightSlot<'_, K> {
        // Registered under the shard lock, so a concurrent release can't drop it
        let lock = {
            let gate = self.gates.entry(key.clone()).or_insert_with(Gate::new);
            gate.holders.fetch_add(1, Ordering::Relaxed);
            Arc::clone(&gate.lock)
        };

        // Built before waiting so a cancelled waiter still deregisters
        let mut slot = FlightSlot {
            guard: None,
            gates: &self.gates,
            key: key.clone(),
        };
        slot.guard = Some(lock.lock_owned().await);
        slot
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.gates.len()
    }
}

/// Held while fetching or waiting on a key; releases and tidies up the gate
/// on drop.
pub(crate) struct FlightSlot<'a, K: Eq + Hash> {
    guard: Option<OwnedMutexGuard<()>>,
    gates: &'a DashMap<K, Gate>,
    key: K,
}

impl<K: Eq + Hash> Drop for FlightSlot<'_, K> {
    fn drop(&mut self) {
        self.guard.take();
        // Decrement and removal happen under the same shard lock as `acquire`
        self.gates.remove_if(&self.key, |_, gate| {
            gate.holders.fetch_sub(1, Ordering::Relaxed) == 1
        });
    }
}
