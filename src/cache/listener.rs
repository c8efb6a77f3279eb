//! Eviction Listener Module
//!
//! Types describing why an entry left the cache, and the callback that is
//! told about it.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::warn;

// == Eviction Reason ==
/// Why an entry was removed without the caller asking for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Its TTL elapsed
    Expired,
    /// It was the least recently used entry when room was needed
    Capacity,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionReason::Expired => f.write_str("expired"),
            EvictionReason::Capacity => f.write_str("capacity"),
        }
    }
}

// == Evicted Entry ==
/// An entry handed back to the caller after a capacity eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictedEntry<K, V> {
    pub key: K,
    pub value: V,
    pub reason: EvictionReason,
}

/// Callback run for every expiration and capacity eviction.
///
/// Explicit `remove` and `clear` calls do not trigger it. It runs after the
/// removal has been applied, so an error or panic here cannot undo it.
pub type EvictionListener<K, V> =
    Box<dyn FnMut(&K, &V, EvictionReason) -> anyhow::Result<()> + Send>;

/// Runs the listener, isolating the cache from its failures.
///
/// Returns false if the listener returned an error or panicked.
pub(crate) fn notify<K, V>(
    listener: &mut EvictionListener<K, V>,
    key: &K,
    value: &V,
    reason: EvictionReason,
) -> bool {
    match catch_unwind(AssertUnwindSafe(|| listener(key, value, reason))) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!("Eviction listener failed for {} entry: {:#}", reason, err);
            false
        }
        Err(_) => {
            warn!("Eviction listener panicked for {} entry", reason);
            false
        }
    }
}
