//! Expiring Cache - A time-expiring, capacity-bounded in-memory cache
//!
//! Entries expire once their TTL elapses and the least recently used entry
//! is evicted when a new key would exceed the configured capacity.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    BoundedLruCache, CacheBuilder, CacheStats, Clock, EvictedEntry, EvictionReason, ManualClock,
    MonotonicClock, SharedCache, TimedStore,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_sweep_task, spawn_sweep_task_from_config};
