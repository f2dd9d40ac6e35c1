//! Proxy Module
//!
//! The read-through / write-invalidate front of the cache and the contract
//! for the resource it fronts.

mod accessor;
mod flight;
mod front;

pub use accessor::{FnAccessor, ResourceAccessor};
pub use front::CachingProxy;
