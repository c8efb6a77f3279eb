//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Clock, SharedCache};
use crate::config::CacheConfig;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs.
/// Each run takes the cache lock for the duration of one sweep, so it is
/// serialized with every other cache operation. Sweeping is never needed
/// for correctness; it only returns memory sooner.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval` - Time between sweep runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort it during
/// shutdown.
///
/// # Example
/// ```ignore
/// let cache = BoundedLruCache::new(1000, Duration::from_secs(300))?.into_shared();
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V, C>(cache: SharedCache<K, V, C>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.lock().await;
                cache_guard.sweep()
            };

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}

/// Spawns the sweep task at the interval named in `config`.
///
/// # Returns
/// `None` when background sweeping is disabled (`SWEEP_INTERVAL_MS=0`),
/// otherwise the handle of the spawned task.
pub fn spawn_sweep_task_from_config<K, V, C>(
    cache: SharedCache<K, V, C>,
    config: &CacheConfig,
) -> Option<JoinHandle<()>>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
    C: Clock + 'static,
{
    match config.sweep_interval {
        Some(interval) => Some(spawn_sweep_task(cache, interval)),
        None => {
            info!("TTL sweep task disabled by configuration");
            None
        }
    }
}
