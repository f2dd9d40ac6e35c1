//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, access statistics and an
//! optional capacity bound.

mod clock;
mod entry;
mod recorder;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use recorder::{AccessRecorder, AccessSnapshot, KeyAccess};
pub use stats::CacheStats;
pub use store::CacheStore;
