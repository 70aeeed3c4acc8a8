//! Cache Coherence Module
//!
//! The coherence boundary keeps the caches of a cluster convergent: clear
//! and remove calls on a [`CoherentCache`] are redirected through the
//! manager to a [`CacheCoherence`] transport, which applies them locally on
//! every node via the manager's `..._locally` entry points. Only control
//! messages roam the cluster, never cache values.

use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};

use crate::cache::{
    CacheEntry, CacheMonitor, EntrySnapshot, ManagedCache, RemoverBuilder, ValueComputer,
    ValueVerifier,
};
use crate::config::Settings;
use crate::error::Result;
use crate::manager::CacheManager;

// == Cache Coherence ==
/// Broadcast channel for clear/remove signals across a cluster.
///
/// Implementations must eventually invoke
/// [`CacheManager::clear_coherent_cache_locally`],
/// [`CacheManager::remove_coherent_cache_key_locally`] or
/// [`CacheManager::remove_all_coherent_locally`] on every node of the
/// cluster, including the one that issued the broadcast. Transport, retry
/// and timeout semantics are entirely up to the implementation.
pub trait CacheCoherence: Send + Sync {
    /// Signals that the named cache must be cleared on all nodes.
    fn broadcast_clear(&self, cache_name: &str);

    /// Signals that the given key must be removed from the named cache on
    /// all nodes.
    fn broadcast_remove_key(&self, cache_name: &str, key: &str);

    /// Signals that the remover registered under the discriminator must be
    /// applied on all nodes with the given test input.
    fn broadcast_remove_all(&self, cache_name: &str, discriminator: &str, test_input: &str);
}

// == Coherent Apply ==
/// Local-apply surface the coherence channel reaches a cache through.
///
/// These methods mutate only this node and never re-trigger a broadcast.
pub(crate) trait CoherentApply: Send + Sync {
    fn coherent_name(&self) -> &str;
    fn clear_local(&self);
    fn remove_local(&self, key: &str);
    fn remove_all_local(&self, discriminator: &str, test_input: &str);
}

// == Coherent Cache ==
/// A string-keyed [`ManagedCache`] whose `clear`, `remove` and `remove_all`
/// roam the cluster.
///
/// Externally triggered mutations never touch local state directly; they
/// are handed to the manager's coherence entry points, and the broadcast
/// calls back into [`clear_local`](Self::clear_local) /
/// [`remove_local`](Self::remove_local) on every node. This keeps a node
/// from unilaterally diverging from its peers. Without an installed
/// coherence transport the cache behaves like a local one.
pub struct CoherentCache<V> {
    inner: ManagedCache<String, V>,
    manager: Weak<CacheManager>,
}

impl<V> CoherentCache<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new coherent cache. Not intended to be called outside of
    /// the `CacheManager`.
    pub(crate) fn new(
        name: impl Into<String>,
        manager: Weak<CacheManager>,
        settings: Arc<Settings>,
        computer: Option<Arc<dyn ValueComputer<String, V>>>,
        verifier: Option<Arc<dyn ValueVerifier<V>>>,
    ) -> Self {
        Self {
            inner: ManagedCache::new(name, settings, computer, verifier),
            manager,
        }
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the current number of entries on this node.
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    // == Get / Put ==
    /// Returns the cached value for the given key, computing it with the
    /// cache's default computer on a miss. Reads are always local.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        self.inner.get(&key.to_string())
    }

    /// Same as [`get`](Self::get), but the supplied computer takes
    /// precedence over the cache's default.
    pub fn get_with(
        &self,
        key: &str,
        computer: &dyn ValueComputer<String, V>,
    ) -> Result<Option<V>> {
        self.inner.get_with(&key.to_string(), computer)
    }

    /// Stores the value under the given key on this node.
    ///
    /// Writes are local; peers pick up fresh values through their own
    /// computers once stale ones have been roamed away.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.inner.put(key.into(), value);
    }

    // == Clear / Remove (roaming) ==
    /// Clears this cache on all nodes of the cluster.
    pub fn clear(&self) {
        match self.manager.upgrade() {
            Some(manager) => manager.clear_coherent_cache(self),
            None => self.inner.clear(),
        }
    }

    /// Removes the given key from this cache on all nodes of the cluster.
    pub fn remove(&self, key: &str) {
        match self.manager.upgrade() {
            Some(manager) => manager.remove_coherent_cache_key(self, key),
            None => self.inner.remove(&key.to_string()),
        }
    }

    /// Applies the remover registered under the discriminator on all nodes
    /// of the cluster.
    ///
    /// Each node scans its own entries, so nodes holding different key sets
    /// still converge.
    pub fn remove_all(&self, discriminator: &str, test_input: &str) {
        match self.manager.upgrade() {
            Some(manager) => manager.remove_all_coherent(self, discriminator, test_input),
            None => self.inner.remove_all(discriminator, test_input),
        }
    }

    // == Removers / Callbacks ==
    /// Registers (or replaces) a removal predicate under the given
    /// discriminator.
    pub fn add_remover<F>(&self, discriminator: impl Into<String>, predicate: F) -> &Self
    where
        F: Fn(&str, &CacheEntry<String, V>) -> bool + Send + Sync + 'static,
    {
        self.inner.add_remover(discriminator, predicate);
        self
    }

    /// Starts a fluent remover pipeline for the given discriminator.
    pub fn remover(
        &self,
        discriminator: impl Into<String>,
    ) -> RemoverBuilder<'_, String, V, CacheEntry<String, V>> {
        self.inner.remover(discriminator)
    }

    /// Installs the removal callback, replacing any previous registration.
    pub fn on_remove<F>(&self, callback: F) -> &Self
    where
        F: Fn(&String, &V) + Send + Sync + 'static,
    {
        self.inner.on_remove(callback);
        self
    }
}

// == Coherent Apply Implementation ==
impl<V> CoherentApply for CoherentCache<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn coherent_name(&self) -> &str {
        self.inner.name()
    }

    fn clear_local(&self) {
        self.inner.clear();
    }

    fn remove_local(&self, key: &str) {
        self.inner.remove(&key.to_string());
    }

    fn remove_all_local(&self, discriminator: &str, test_input: &str) {
        self.inner.remove_all(discriminator, test_input);
    }
}

// == Cache Monitor Implementation ==
impl<V> CacheMonitor for CoherentCache<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn max_size(&self) -> usize {
        self.inner.max_size()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn uses(&self) -> u64 {
        self.inner.uses()
    }

    fn hit_rate(&self) -> u64 {
        self.inner.hit_rate()
    }

    fn use_history(&self) -> Vec<u64> {
        self.inner.use_history()
    }

    fn hit_rate_history(&self) -> Vec<u64> {
        self.inner.hit_rate_history()
    }

    fn last_eviction_run(&self) -> Option<DateTime<Utc>> {
        self.inner.last_eviction_run()
    }

    fn update_statistics(&self) {
        self.inner.update_statistics()
    }

    fn run_eviction(&self) -> usize {
        self.inner.run_eviction()
    }

    // Clearing through the monitor surface roams like any external clear
    fn clear(&self) {
        CoherentCache::clear(self)
    }

    fn contents(&self) -> Vec<EntrySnapshot> {
        self.inner.contents()
    }
}

impl<V> fmt::Debug for CoherentCache<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoherentCache")
            .field("name", &self.name())
            .field("size", &self.size())
            .finish()
    }
}
