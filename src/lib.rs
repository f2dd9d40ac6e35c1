//! TTL Proxy Cache - a time-bounded read-through cache
//!
//! Fronts an expensive resource with an in-memory cache: lazy and background
//! expiry, invalidation on write, and per-key access statistics. Ships with
//! an HTTP caching download proxy built on top of it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::{CacheStats, CacheStore, Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, Config, ServerConfig};
pub use error::{CacheError, ReadError};
pub use proxy::{CachingProxy, FnAccessor, ResourceAccessor};
pub use tasks::Sweeper;
pub use upstream::HttpAccessor;
