//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod bounded;
mod clock;
mod entry;
mod listener;
mod lru;
mod stats;
mod timed;


use std::sync::Arc;

use tokio::sync::Mutex;

// Re-export public types
pub use bounded::{BoundedLruCache, CacheBuilder};
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use entry::CacheEntry;
pub use listener::{EvictedEntry, EvictionListener, EvictionReason};
pub use lru::RecencyList;
pub use stats::CacheStats;
pub use timed::TimedStore;

/// A cache behind one exclusive lock, shared between tasks.
///
/// Every operation, including background sweeps, runs inside the same
/// critical section.
pub type SharedCache<K, V, C = MonotonicClock> = Arc<Mutex<BoundedLruCache<K, V, C>>>;
