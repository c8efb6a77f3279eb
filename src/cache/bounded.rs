//! Bounded LRU Cache Module
//!
//! Main cache engine combining the timed store with LRU tracking and a
//! capacity bound.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::clock::{Clock, MonotonicClock, Timestamp};
use crate::cache::entry::CacheEntry;
use crate::cache::listener::{self, EvictedEntry, EvictionListener, EvictionReason};
use crate::cache::lru::RecencyList;
use crate::cache::stats::CacheStats;
use crate::cache::timed::{Lookup, TimedStore};
use crate::cache::SharedCache;
use crate::config::CacheConfig;
use crate::error::Result;

// == Bounded LRU Cache ==
/// A cache that drops entries when their TTL elapses and evicts the least
/// recently used entry when a new key would exceed its capacity.
///
/// Expiration is always resolved before recency is consulted, so an expired
/// entry never takes up capacity and is never picked as an eviction victim.
///
/// `len` is a logical count: entries that have expired but were not removed
/// yet are excluded. The physical number of stored entries never exceeds
/// `capacity` either.
pub struct BoundedLruCache<K, V, C = MonotonicClock> {
    /// Entries with their timestamps
    store: TimedStore<K, V, C>,
    /// Recency order over every stored key
    recency: RecencyList<K>,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Performance statistics
    stats: CacheStats,
    /// Told about expirations and capacity evictions
    listener: Option<EvictionListener<K, V>>,
}

// == Builder ==
/// Configures and builds a [`BoundedLruCache`].
///
/// ```
/// use std::time::Duration;
/// use expiring_cache::{BoundedLruCache, ManualClock};
///
/// let clock = ManualClock::new(0);
/// let mut cache = BoundedLruCache::builder(2)
///     .default_ttl(Duration::from_millis(100))
///     .clock(clock.clone())
///     .build()
///     .unwrap();
///
/// cache.put("a", 1, None);
/// assert_eq!(cache.get(&"a"), Some(1));
/// ```
pub struct CacheBuilder<K, V, C = MonotonicClock> {
    capacity: usize,
    default_ttl: Duration,
    clock: C,
    listener: Option<EvictionListener<K, V>>,
}

impl<K, V> CacheBuilder<K, V, MonotonicClock> {
    /// Starts a builder with no default TTL on the monotonic system clock.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_ttl: Duration::ZERO,
            clock: MonotonicClock::new(),
            listener: None,
        }
    }
}

impl<K, V, C> CacheBuilder<K, V, C> {
    /// TTL used when `put` is not given one. Zero means never expires.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Replaces the time source.
    pub fn clock<C2: Clock>(self, clock: C2) -> CacheBuilder<K, V, C2> {
        CacheBuilder {
            capacity: self.capacity,
            default_ttl: self.default_ttl,
            clock,
            listener: self.listener,
        }
    }

    /// Registers a callback for expirations and capacity evictions.
    pub fn eviction_listener<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&K, &V, EvictionReason) -> anyhow::Result<()> + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }
}

impl<K, V, C> CacheBuilder<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Builds the cache, failing if the default TTL is unrepresentable.
    pub fn build(self) -> Result<BoundedLruCache<K, V, C>> {
        Ok(BoundedLruCache {
            store: TimedStore::with_clock(self.default_ttl, self.clock)?,
            recency: RecencyList::new(),
            capacity: self.capacity,
            stats: CacheStats::new(),
            listener: self.listener,
        })
    }
}

impl<K, V> BoundedLruCache<K, V, MonotonicClock>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates a new cache with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL for entries put without one, zero = never
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        CacheBuilder::new(capacity).default_ttl(default_ttl).build()
    }

    /// Creates a new cache from loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.max_entries, config.default_ttl)
    }

    pub fn builder(capacity: usize) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }
}

impl<K, V, C> BoundedLruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    // == Put ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already holds a live entry, its value and TTL are replaced
    /// in place and it becomes the most recently used; nothing is evicted.
    /// Otherwise, when the cache is full, expired entries are dropped first
    /// and, if that frees no room, the least recently used entry is evicted
    /// and returned.
    ///
    /// With a capacity of zero nothing is retained: the offered entry itself
    /// comes back as evicted.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default if None, zero = never)
    pub fn put(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<EvictedEntry<K, V>> {
        if self.capacity == 0 {
            self.stats.record_eviction();
            debug!("Capacity is zero, entry evicted on insert");
            let rejected = EvictedEntry {
                key,
                value,
                reason: EvictionReason::Capacity,
            };
            self.notify(&rejected.key, &rejected.value, rejected.reason);
            return Some(rejected);
        }

        let now = self.now();
        let mut expired = Vec::new();

        if let Some(stale) = self.store.take_if_expired(&key, now) {
            self.detach_expired(&stale.0);
            expired.push(stale);
        }

        // Overwrite of a live key
        if self.store.peek_at(&key, now).is_some() {
            self.store.put_at(key.clone(), value, ttl, now);
            self.recency.touch(&key);
            self.notify_expired(expired);
            return None;
        }

        let mut evicted = None;
        if self.store.stored_len() >= self.capacity {
            for stale in self.store.drain_expired_at(now) {
                self.detach_expired(&stale.0);
                expired.push(stale);
            }
            if self.store.stored_len() >= self.capacity {
                evicted = self.evict_lru();
            }
        }

        self.store.put_at(key.clone(), value, ttl, now);
        self.recency.touch(&key);

        self.notify_expired(expired);
        if let Some(victim) = &evicted {
            self.notify(&victim.key, &victim.value, victim.reason);
        }
        evicted
    }

    // == Get ==
    /// Retrieves a value by key, making it the most recently used.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let now = self.now();
        let lookup = self.store.lookup_at(key, now);
        match lookup {
            Lookup::Hit(entry) => {
                let value = entry.value.clone();
                self.recency.touch(key);
                self.stats.record_hit();
                Some(value)
            }
            Lookup::Expired(key, entry) => {
                self.detach_expired(&key);
                self.stats.record_miss();
                self.notify(&key, &entry.value, EvictionReason::Expired);
                None
            }
            Lookup::Missing => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the live value for `key`, or inserts the one built by `make`.
    pub fn get_or_insert_with<F>(&mut self, key: K, ttl: Option<Duration>, make: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = make();
        self.put(key, value.clone(), ttl);
        value
    }

    // == Peek ==
    /// Returns a live value without touching recency or statistics.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.store.peek_at(key, self.now())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    // == Time To Live ==
    /// Returns how long a live entry has left before it expires.
    ///
    /// Does not touch recency or statistics.
    ///
    /// # Returns
    /// - `Some(remaining)` if the entry is live and has a TTL
    /// - `None` if the key is missing, already expired, or never expires
    pub fn ttl_remaining(&self, key: &K) -> Option<Duration> {
        let now = self.now();
        self.store
            .live_entry_at(key, now)
            .and_then(|entry| entry.ttl_remaining_ms(now))
            .map(Duration::from_millis)
    }

    // == Remove ==
    /// Removes an entry by key. Does not notify the eviction listener.
    ///
    /// Returns true if an entry existed, expired or not.
    pub fn remove(&mut self, key: &K) -> bool {
        self.recency.remove(key);
        self.store.remove(key)
    }

    // == Sweep ==
    /// Removes all expired entries, notifying the listener for each.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self) -> usize {
        let now = self.now();
        let expired = self.store.drain_expired_at(now);
        for (key, _) in &expired {
            self.detach_expired(key);
        }
        let count = expired.len();
        self.notify_expired(expired);
        count
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.store.live_len_at(self.now())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.store.default_ttl()
    }

    pub fn clock(&self) -> &C {
        self.store.clock()
    }

    /// Empties the cache. Does not notify the eviction listener.
    pub fn clear(&mut self) {
        self.store.clear();
        self.recency.clear();
    }

    /// Live keys ordered from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<&K> {
        let now = self.now();
        self.recency
            .iter()
            .filter(|key| self.store.peek_at(key, now).is_some())
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    pub fn set_eviction_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&K, &V, EvictionReason) -> anyhow::Result<()> + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Wraps the cache for use from several tasks.
    pub fn into_shared(self) -> SharedCache<K, V, C> {
        Arc::new(Mutex::new(self))
    }

    fn now(&self) -> Timestamp {
        self.store.clock().now()
    }

    fn evict_lru(&mut self) -> Option<EvictedEntry<K, V>> {
        let oldest = self.recency.pop_lru()?;
        let (key, entry) = self.store.remove_entry(&oldest)?;
        self.stats.record_eviction();
        debug!(
            "Evicted least recently used entry to stay within capacity {}",
            self.capacity
        );
        Some(EvictedEntry {
            key,
            value: entry.value,
            reason: EvictionReason::Capacity,
        })
    }

    /// Bookkeeping for an entry already taken out of the store.
    fn detach_expired(&mut self, key: &K) {
        self.recency.remove(key);
        self.stats.record_expiration();
    }

    fn notify_expired(&mut self, expired: Vec<(K, CacheEntry<V>)>) {
        for (key, entry) in expired {
            self.notify(&key, &entry.value, EvictionReason::Expired);
        }
    }

    fn notify(&mut self, key: &K, value: &V, reason: EvictionReason) {
        if let Some(callback) = self.listener.as_mut() {
            if !listener::notify(callback, key, value, reason) {
                self.stats.record_listener_failure();
            }
        }
    }

    /// Store and recency list track exactly the same keys.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.store.stored_len() == self.recency.len()
            && self.store.iter().all(|(key, _)| self.recency.contains(key))
    }
}

impl<K, V, C> fmt::Debug for BoundedLruCache<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedLruCache")
            .field("store", &self.store)
            .field("recency", &self.recency)
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
