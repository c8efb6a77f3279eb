//! Timed Store Module
//!
//! Key-value storage where every entry carries a TTL. Has no capacity bound
//! of its own; it only knows whether an entry has expired.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Duration;

use crate::cache::clock::{Clock, MonotonicClock, Timestamp};
use crate::cache::entry::{ttl_to_millis, CacheEntry};
use crate::error::{CacheError, Result};

/// Outcome of a lookup that resolves expiration first.
pub(crate) enum Lookup<'a, K, V> {
    Hit(&'a mut CacheEntry<V>),
    Expired(K, CacheEntry<V>),
    Missing,
}

// == Timed Store ==
/// Entries with timestamps, expired lazily on lookup or eagerly by `sweep`.
///
/// Besides the key map, the store keeps a deadline index ordered by
/// expiration time, so sweeping costs time proportional to the number of
/// expired entries rather than to the size of the store.
#[derive(Debug)]
pub struct TimedStore<K, V, C = MonotonicClock> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// (expires_at, seq) -> key, for entries with a non-zero TTL
    deadlines: BTreeMap<(Timestamp, u64), K>,
    /// TTL applied when `put` is given none, 0 = never expires
    default_ttl_ms: u64,
    next_seq: u64,
    clock: C,
}

impl<K, V> TimedStore<K, V, MonotonicClock>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates a store on the monotonic system clock.
    ///
    /// Fails if `default_ttl` does not fit in a millisecond timestamp.
    pub fn new(default_ttl: Duration) -> Result<Self> {
        Self::with_clock(default_ttl, MonotonicClock::new())
    }
}

impl<K, V, C> TimedStore<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Creates a store that reads time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: C) -> Result<Self> {
        let default_ttl_ms =
            ttl_to_millis(default_ttl).ok_or(CacheError::TtlOutOfRange(default_ttl))?;

        Ok(Self {
            entries: HashMap::new(),
            deadlines: BTreeMap::new(),
            default_ttl_ms,
            next_seq: 0,
            clock,
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    // == Put ==
    /// Stores a value, replacing any previous entry and restarting its age.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the store default if None, zero = never)
    pub fn put(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let now = self.clock.now();
        self.put_at(key, value, ttl, now);
    }

    /// Stores a value stamped at `now`, returning the entry it replaced.
    pub(crate) fn put_at(
        &mut self,
        key: K,
        value: V,
        ttl: Option<Duration>,
        now: Timestamp,
    ) -> Option<CacheEntry<V>> {
        let ttl_ms = match ttl {
            Some(ttl) => ttl_to_millis(ttl).unwrap_or(u64::MAX),
            None => self.default_ttl_ms,
        };

        let mut entry = CacheEntry::new(value, ttl_ms, now);
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if let Some(expires) = entry.expires_at() {
            self.deadlines.insert((expires, entry.seq), key.clone());
        }

        let previous = self.entries.insert(key, entry);
        if let Some(old) = &previous {
            self.forget_deadline(old);
        }
        previous
    }

    // == Get ==
    /// Retrieves a clone of a live value.
    ///
    /// An expired entry is removed on discovery and reported as absent.
    pub fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let now = self.clock.now();
        match self.lookup_at(key, now) {
            Lookup::Hit(entry) => Some(entry.value.clone()),
            Lookup::Expired(..) | Lookup::Missing => None,
        }
    }

    /// Looks a key up at `now`, removing it if it has expired.
    ///
    /// A hit records the access on the entry.
    pub(crate) fn lookup_at(&mut self, key: &K, now: Timestamp) -> Lookup<'_, K, V> {
        let expired = match self.entries.get(key) {
            Some(entry) => Self::is_expired(entry, now),
            None => return Lookup::Missing,
        };

        if expired {
            return match self.remove_entry(key) {
                Some((key, entry)) => Lookup::Expired(key, entry),
                None => Lookup::Missing,
            };
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(now);
                Lookup::Hit(entry)
            }
            None => Lookup::Missing,
        }
    }

    // == Peek ==
    /// Returns a live value without recording an access.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.peek_at(key, self.clock.now())
    }

    pub(crate) fn peek_at(&self, key: &K, now: Timestamp) -> Option<&V> {
        self.live_entry_at(key, now).map(|entry| &entry.value)
    }

    pub(crate) fn live_entry_at(&self, key: &K, now: Timestamp) -> Option<&CacheEntry<V>> {
        self.entries
            .get(key)
            .filter(|entry| !Self::is_expired(entry, now))
    }

    /// Returns true if the key holds a live entry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    // == Remove ==
    /// Removes an entry, expired or not. Returns true if one existed.
    pub fn remove(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    pub(crate) fn remove_entry(&mut self, key: &K) -> Option<(K, CacheEntry<V>)> {
        let (key, entry) = self.entries.remove_entry(key)?;
        self.forget_deadline(&entry);
        Some((key, entry))
    }

    /// Removes the entry for `key` only if it has expired at `now`.
    pub(crate) fn take_if_expired(&mut self, key: &K, now: Timestamp) -> Option<(K, CacheEntry<V>)> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| Self::is_expired(entry, now));
        if expired {
            self.remove_entry(key)
        } else {
            None
        }
    }

    // == Is Expired ==
    /// Pure expiration predicate: `ttl != 0 && now - inserted_at >= ttl`.
    pub fn is_expired(entry: &CacheEntry<V>, now: Timestamp) -> bool {
        entry.is_expired(now)
    }

    // == Sweep ==
    /// Removes all expired entries. Returns the number removed.
    pub fn sweep(&mut self) -> usize {
        let now = self.clock.now();
        self.sweep_at(now)
    }

    pub fn sweep_at(&mut self, now: Timestamp) -> usize {
        self.drain_expired_at(now).len()
    }

    /// Removes and returns every entry expired at `now`, earliest deadline first.
    pub(crate) fn drain_expired_at(&mut self, now: Timestamp) -> Vec<(K, CacheEntry<V>)> {
        let mut drained = Vec::new();
        while let Some(first) = self.deadlines.first_entry() {
            if first.key().0 > now {
                break;
            }
            let key = first.remove();
            if let Some(pair) = self.entries.remove_entry(&key) {
                drained.push(pair);
            }
        }
        drained
    }

    // == Length ==
    /// Returns the number of live entries.
    ///
    /// Expired entries that have not been removed yet are not counted.
    pub fn len(&self) -> usize {
        self.live_len_at(self.clock.now())
    }

    pub(crate) fn live_len_at(&self, now: Timestamp) -> usize {
        let expired = self.deadlines.range(..=(now, u64::MAX)).count();
        self.entries.len() - expired
    }

    /// Returns the number of entries physically held, expired ones included.
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }

    /// Iterates over stored entries in arbitrary order, expired ones included.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &CacheEntry<V>)> + '_ {
        self.entries.iter()
    }

    fn forget_deadline(&mut self, entry: &CacheEntry<V>) {
        if let Some(expires) = entry.expires_at() {
            self.deadlines.remove(&(expires, entry.seq));
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn store(default_ttl_ms: u64) -> (TimedStore<&'static str, u32, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let store =
            TimedStore::with_clock(Duration::from_millis(default_ttl_ms), clock.clone()).unwrap();
        (store, clock)
    }

    #[test]
    fn test_store_put_and_get() {
        let (mut store, _clock) = store(100);

        store.put("a", 1, None);
        assert_eq!(store.get(&"a"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _clock) = store(100);
        assert_eq!(store.get(&"missing"), None);
    }

    #[test]
    fn test_store_get_expired_removes_entry() {
        let (mut store, clock) = store(50);

        store.put("a", 1, None);
        clock.set(49);
        assert_eq!(store.get(&"a"), Some(1));

        clock.set(50);
        assert_eq!(store.get(&"a"), None);
        assert_eq!(store.stored_len(), 0, "Lazy expiry removes the entry");
    }

    #[test]
    fn test_store_get_updates_last_access() {
        let (mut store, clock) = store(100);

        store.put("a", 1, None);
        clock.set(30);
        store.get(&"a");

        let entry = store.iter().find(|(k, _)| **k == "a").unwrap().1;
        assert_eq!(entry.inserted_at, 0);
        assert_eq!(entry.last_accessed_at, 30);
    }

    #[test]
    fn test_store_overwrite_resets_age() {
        let (mut store, clock) = store(50);

        store.put("a", 1, None);
        clock.set(40);
        store.put("a", 2, None);
        clock.set(80);

        assert_eq!(store.get(&"a"), Some(2));
        assert_eq!(store.stored_len(), 1);
    }

    #[test]
    fn test_store_per_entry_ttl_overrides_default() {
        let (mut store, clock) = store(50);

        store.put("short", 1, Some(Duration::from_millis(10)));
        store.put("forever", 2, Some(Duration::ZERO));
        store.put("default", 3, None);

        clock.set(20);
        assert_eq!(store.get(&"short"), None);
        assert_eq!(store.get(&"default"), Some(3));

        clock.set(1_000_000);
        assert_eq!(store.get(&"default"), None);
        assert_eq!(store.get(&"forever"), Some(2));
    }

    #[test]
    fn test_store_zero_default_ttl_never_expires() {
        let (mut store, clock) = store(0);

        store.put("a", 1, None);
        clock.set(u64::MAX);
        assert_eq!(store.get(&"a"), Some(1));
    }

    #[test]
    fn test_store_remove_reports_expired_entries_too() {
        let (mut store, clock) = store(10);

        store.put("a", 1, None);
        clock.set(20);

        assert!(store.remove(&"a"));
        assert!(!store.remove(&"a"));
    }

    #[test]
    fn test_store_len_excludes_expired() {
        let (mut store, clock) = store(50);

        store.put("a", 1, None);
        clock.set(20);
        store.put("b", 2, None);

        clock.set(60);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stored_len(), 2);
        assert!(!store.contains_key(&"a"));
        assert_eq!(store.peek(&"b"), Some(&2));
    }

    #[test]
    fn test_store_sweep() {
        let (mut store, clock) = store(50);

        store.put("a", 1, None);
        store.put("b", 2, Some(Duration::from_millis(200)));
        store.put("c", 3, Some(Duration::ZERO));

        clock.set(100);
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.stored_len(), 2);

        clock.set(500);
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.sweep(), 0);
        assert_eq!(store.get(&"c"), Some(3));
    }

    #[test]
    fn test_store_overwrite_drops_stale_deadline() {
        let (mut store, clock) = store(50);

        store.put("a", 1, None);
        store.put("a", 2, Some(Duration::ZERO));

        clock.set(100);
        assert_eq!(store.sweep(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_is_expired_predicate() {
        let entry = CacheEntry::new(1u32, 10, 5);
        assert!(!TimedStore::<&str, u32, ManualClock>::is_expired(&entry, 14));
        assert!(TimedStore::<&str, u32, ManualClock>::is_expired(&entry, 15));
    }

    #[test]
    fn test_store_rejects_unrepresentable_default_ttl() {
        let result: Result<TimedStore<&str, u32>> = TimedStore::new(Duration::MAX);
        assert!(matches!(result, Err(CacheError::TtlOutOfRange(_))));
    }

    #[test]
    fn test_store_clear() {
        let (mut store, _clock) = store(50);

        store.put("a", 1, None);
        store.put("b", 2, None);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.stored_len(), 0);
        assert_eq!(store.sweep(), 0);
    }
}
