//! Bounded Store Module
//!
//! A capacity-bounded map combining HashMap storage with LRU tracking.
//! Evicted and removed entries are handed back to the caller so a single
//! removal-notification channel can be fed regardless of why an entry left
//! the store.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::entry::CacheEntry;
use crate::cache::lru::LruTracker;

// == Bounded Store ==
/// Capacity-bounded entry storage with LRU eviction.
///
/// A `max_size` of 0 means the store is unbounded.
#[derive(Debug)]
pub struct BoundedStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<K, V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Maximum number of entries allowed, 0 = unbounded
    max_size: usize,
}

impl<K, V> BoundedStore<K, V>
where
    K: Clone + Eq + Hash,
{
    // == Constructor ==
    /// Creates a new store with the given capacity (0 = unbounded).
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_size,
        }
    }

    // == Insert ==
    /// Stores an entry, overwriting any previous entry for the same key.
    ///
    /// If the store is at capacity, the least recently used entry is evicted
    /// first and returned so the caller can notify its removal listener.
    /// Overwritten entries are dropped silently.
    pub fn insert(&mut self, key: K, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>> {
        let is_overwrite = self.entries.contains_key(&key);

        let mut evicted = None;
        if !is_overwrite && self.max_size > 0 && self.entries.len() >= self.max_size {
            if let Some(coldest) = self.lru.evict_oldest() {
                evicted = self.entries.remove(&coldest);
            }
        }

        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        evicted
    }

    // == Get ==
    /// Returns a mutable reference to the entry for the given key.
    ///
    /// Does not update the LRU position; callers decide whether an access
    /// counts as a use via [`touch`](Self::touch).
    pub fn get_mut(&mut self, key: &K) -> Option<&mut CacheEntry<K, V>> {
        self.entries.get_mut(key)
    }

    // == Touch ==
    /// Marks the given key as most recently used.
    ///
    /// A key without a stored entry is ignored; tracking it would plant a
    /// phantom LRU slot that swallows a later capacity eviction.
    pub fn touch(&mut self, key: &K) {
        if self.entries.contains_key(key) {
            self.lru.touch(key);
        }
    }

    // == Remove ==
    /// Removes and returns the entry for the given key, if present.
    pub fn remove(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
        }
        removed
    }

    // == Remove Matching ==
    /// Removes all entries matched by the predicate and returns them.
    ///
    /// Used both by the expiry sweep and by named removers.
    pub fn remove_matching<F>(&mut self, mut predicate: F) -> Vec<CacheEntry<K, V>>
    where
        F: FnMut(&CacheEntry<K, V>) -> bool,
    {
        let matched: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();

        matched
            .iter()
            .filter_map(|key| self.remove(key))
            .collect()
    }

    // == Drain ==
    /// Removes and returns all entries.
    pub fn drain(&mut self) -> Vec<CacheEntry<K, V>> {
        self.lru.clear();
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    // == Values ==
    /// Iterates over all stored entries.
    pub fn values(&self) -> impl Iterator<Item = &CacheEntry<K, V>> {
        self.entries.values()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Max Size ==
    /// Returns the configured capacity (0 = unbounded).
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> CacheEntry<String, String> {
        CacheEntry::new(key.to_string(), value.to_string(), 0, 0)
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = BoundedStore::new(10);

        store.insert("key1".to_string(), entry("key1", "value1"));

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get_mut(&"key1".to_string()).map(|e| e.value().clone()),
            Some("value1".to_string())
        );
    }

    #[test]
    fn test_store_overwrite_keeps_size() {
        let mut store = BoundedStore::new(10);

        store.insert("key1".to_string(), entry("key1", "value1"));
        let evicted = store.insert("key1".to_string(), entry("key1", "value2"));

        assert!(evicted.is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get_mut(&"key1".to_string()).map(|e| e.value().clone()),
            Some("value2".to_string())
        );
    }

    #[test]
    fn test_store_capacity_eviction() {
        let mut store = BoundedStore::new(3);

        store.insert("key1".to_string(), entry("key1", "value1"));
        store.insert("key2".to_string(), entry("key2", "value2"));
        store.insert("key3".to_string(), entry("key3", "value3"));

        // Store is full, adding key4 must evict key1 (coldest)
        let evicted = store.insert("key4".to_string(), entry("key4", "value4"));

        assert_eq!(store.len(), 3);
        assert_eq!(evicted.map(|e| e.key().clone()), Some("key1".to_string()));
        assert!(store.get_mut(&"key1".to_string()).is_none());
    }

    #[test]
    fn test_store_touch_protects_from_eviction() {
        let mut store = BoundedStore::new(3);

        store.insert("key1".to_string(), entry("key1", "value1"));
        store.insert("key2".to_string(), entry("key2", "value2"));
        store.insert("key3".to_string(), entry("key3", "value3"));

        // Touch key1 so key2 becomes the coldest entry
        store.touch(&"key1".to_string());
        let evicted = store.insert("key4".to_string(), entry("key4", "value4"));

        assert_eq!(evicted.map(|e| e.key().clone()), Some("key2".to_string()));
        assert!(store.get_mut(&"key1".to_string()).is_some());
    }

    #[test]
    fn test_store_touch_ignores_absent_keys() {
        let mut store = BoundedStore::new(2);

        // Touching keys the store does not hold must not register LRU slots
        store.touch(&"ghost".to_string());
        store.insert("key1".to_string(), entry("key1", "value1"));
        store.remove(&"key1".to_string());
        store.touch(&"key1".to_string());

        store.insert("key2".to_string(), entry("key2", "value2"));
        store.insert("key3".to_string(), entry("key3", "value3"));
        let evicted = store.insert("key4".to_string(), entry("key4", "value4"));

        // A phantom slot would absorb this eviction and let len exceed capacity
        assert_eq!(store.len(), 2);
        assert_eq!(evicted.map(|e| e.key().clone()), Some("key2".to_string()));
    }

    #[test]
    fn test_store_unbounded() {
        let mut store = BoundedStore::new(0);

        for i in 0..100 {
            let evicted = store.insert(format!("key{i}"), entry(&format!("key{i}"), "value"));
            assert!(evicted.is_none());
        }

        assert_eq!(store.len(), 100);
    }

    #[test]
    fn test_store_remove() {
        let mut store = BoundedStore::new(10);

        store.insert("key1".to_string(), entry("key1", "value1"));
        let removed = store.remove(&"key1".to_string());

        assert_eq!(removed.map(|e| e.value().clone()), Some("value1".to_string()));
        assert!(store.is_empty());
        assert!(store.remove(&"key1".to_string()).is_none());
    }

    #[test]
    fn test_store_remove_matching() {
        let mut store = BoundedStore::new(10);

        store.insert("keep".to_string(), entry("keep", "a"));
        store.insert("drop1".to_string(), entry("drop1", "b"));
        store.insert("drop2".to_string(), entry("drop2", "b"));

        let removed = store.remove_matching(|e| e.value() == "b");

        assert_eq!(removed.len(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get_mut(&"keep".to_string()).is_some());
    }

    #[test]
    fn test_store_drain() {
        let mut store = BoundedStore::new(10);

        store.insert("key1".to_string(), entry("key1", "value1"));
        store.insert("key2".to_string(), entry("key2", "value2"));

        let drained = store.drain();

        assert_eq!(drained.len(), 2);
        assert!(store.is_empty());
    }
}
