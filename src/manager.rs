//! Cache Manager Module
//!
//! Registry and factory for all managed caches of a process. Creates local
//! and coherent caches, hands out monitor handles to the eviction timer and
//! the dashboards, and bridges coherent caches to the installed
//! [`CacheCoherence`] transport.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::info;

use crate::cache::{CacheMonitor, InlineCache, ManagedCache, ValueComputer, ValueVerifier};
use crate::coherence::{CacheCoherence, CoherentApply, CoherentCache};
use crate::config::Settings;
use crate::error::{CacheError, Result};

/// Default TTL for the ten-seconds inline cache shortcut.
const INLINE_CACHE_DEFAULT_TTL: Duration = Duration::from_secs(10);

// == Registration ==
/// A cache tracked by the manager.
struct Registration {
    /// Monitor handle used by the eviction timer and dashboards
    monitor: Arc<dyn CacheMonitor>,
    /// Local-apply handle, present for coherent caches only
    coherent: Option<Arc<dyn CoherentApply>>,
}

// == Cache Manager ==
/// Process-wide registry of all managed caches.
///
/// Explicit state container rather than a global: it is created once at
/// startup, shared as an `Arc`, and torn down via [`reset`](Self::reset) on
/// shutdown. Coherent caches keep a weak handle back to their manager for
/// the clear/remove redirection.
pub struct CacheManager {
    /// All created caches, ordered by name
    caches: RwLock<BTreeMap<String, Registration>>,
    /// Settings source resolved lazily by each cache
    settings: Arc<Settings>,
    /// Cluster broadcast channel, absent in single-node mode
    coherence: RwLock<Option<Arc<dyn CacheCoherence>>>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a new manager using the given settings source.
    pub fn new(settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            caches: RwLock::new(BTreeMap::new()),
            settings: Arc::new(settings),
            coherence: RwLock::new(None),
        })
    }

    // == Install Coherence ==
    /// Installs the cluster broadcast channel.
    ///
    /// Without one, coherent caches fall back to purely local clears and
    /// removes (single-node mode).
    pub fn install_coherence(&self, coherence: Arc<dyn CacheCoherence>) {
        *self
            .coherence
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(coherence);
    }

    // == Create Local Cache ==
    /// Creates a cache with the given name which is only managed locally.
    ///
    /// The name doubles as the settings lookup key; settings are resolved
    /// lazily on the first cache access. The optional computer fills misses,
    /// the optional verifier re-checks values in the configured interval.
    pub fn create_local_cache<K, V>(
        &self,
        name: &str,
        computer: Option<Arc<dyn ValueComputer<K, V>>>,
        verifier: Option<Arc<dyn ValueVerifier<V>>>,
    ) -> Result<Arc<ManagedCache<K, V>>>
    where
        K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
        V: Clone + fmt::Debug + Send + Sync + 'static,
    {
        let cache = Arc::new(ManagedCache::new(
            name,
            self.settings.clone(),
            computer,
            verifier,
        ));
        self.register(
            name,
            Registration {
                monitor: cache.clone(),
                coherent: None,
            },
        )?;
        Ok(cache)
    }

    // == Create Coherent Cache ==
    /// Creates a cache whose clears and removes roam the cluster.
    ///
    /// All other behavior matches [`create_local_cache`](Self::create_local_cache).
    pub fn create_coherent_cache<V>(
        self: &Arc<Self>,
        name: &str,
        computer: Option<Arc<dyn ValueComputer<String, V>>>,
        verifier: Option<Arc<dyn ValueVerifier<V>>>,
    ) -> Result<Arc<CoherentCache<V>>>
    where
        V: Clone + fmt::Debug + Send + Sync + 'static,
    {
        let cache = Arc::new(CoherentCache::new(
            name,
            Arc::downgrade(self),
            self.settings.clone(),
            computer,
            verifier,
        ));
        self.register(
            name,
            Registration {
                monitor: cache.clone(),
                coherent: Some(cache.clone()),
            },
        )?;
        Ok(cache)
    }

    fn register(&self, name: &str, registration: Registration) -> Result<()> {
        let mut caches = self.caches_write();
        if caches.contains_key(name) {
            return Err(CacheError::DuplicateCache(name.to_string()));
        }
        caches.insert(name.to_string(), registration);
        Ok(())
    }

    // == Lookup ==
    /// Returns monitor handles for all created caches, ordered by name.
    pub fn caches(&self) -> Vec<Arc<dyn CacheMonitor>> {
        self.caches_read()
            .values()
            .map(|registration| registration.monitor.clone())
            .collect()
    }

    /// Returns the monitor handle for the named cache.
    pub fn cache(&self, name: &str) -> Option<Arc<dyn CacheMonitor>> {
        self.caches_read()
            .get(name)
            .map(|registration| registration.monitor.clone())
    }

    fn coherent(&self, name: &str) -> Option<Arc<dyn CoherentApply>> {
        self.caches_read()
            .get(name)
            .and_then(|registration| registration.coherent.clone())
    }

    // == Coherence Hand-Off ==
    /// Roams a clear of the given cache across the cluster.
    pub(crate) fn clear_coherent_cache(&self, cache: &dyn CoherentApply) {
        match self.coherence() {
            Some(coherence) => coherence.broadcast_clear(cache.coherent_name()),
            None => cache.clear_local(),
        }
    }

    /// Roams the removal of a key from the given cache across the cluster.
    pub(crate) fn remove_coherent_cache_key(&self, cache: &dyn CoherentApply, key: &str) {
        match self.coherence() {
            Some(coherence) => coherence.broadcast_remove_key(cache.coherent_name(), key),
            None => cache.remove_local(key),
        }
    }

    /// Roams a remover application across the cluster.
    pub(crate) fn remove_all_coherent(
        &self,
        cache: &dyn CoherentApply,
        discriminator: &str,
        test_input: &str,
    ) {
        match self.coherence() {
            Some(coherence) => {
                coherence.broadcast_remove_all(cache.coherent_name(), discriminator, test_input)
            }
            None => cache.remove_all_local(discriminator, test_input),
        }
    }

    // == Local Apply ==
    /// Clears the named coherent cache on this node.
    ///
    /// Entry point for the coherence transport; never re-broadcasts.
    /// Unknown or non-coherent cache names are ignored.
    pub fn clear_coherent_cache_locally(&self, cache_name: &str) {
        if let Some(cache) = self.coherent(cache_name) {
            cache.clear_local();
        }
    }

    /// Removes the given key from the named coherent cache on this node.
    ///
    /// Entry point for the coherence transport; never re-broadcasts.
    pub fn remove_coherent_cache_key_locally(&self, cache_name: &str, key: &str) {
        if let Some(cache) = self.coherent(cache_name) {
            cache.remove_local(key);
        }
    }

    /// Applies the remover registered under the discriminator on this node.
    ///
    /// Entry point for the coherence transport; never re-broadcasts.
    pub fn remove_all_coherent_locally(
        &self,
        cache_name: &str,
        discriminator: &str,
        test_input: &str,
    ) {
        if let Some(cache) = self.coherent(cache_name) {
            cache.remove_all_local(discriminator, test_input);
        }
    }

    // == Inline Caches ==
    /// Creates an inline cache keeping one computed value for the given TTL.
    pub fn create_inline_cache<V, F>(ttl: Duration, computer: F) -> InlineCache<V>
    where
        V: Clone,
        F: Fn() -> V + Send + Sync + 'static,
    {
        InlineCache::new(ttl, computer)
    }

    /// Shortcut for [`create_inline_cache`](Self::create_inline_cache) with
    /// a ten-second TTL.
    pub fn create_ten_seconds_inline_cache<V, F>(computer: F) -> InlineCache<V>
    where
        V: Clone,
        F: Fn() -> V + Send + Sync + 'static,
    {
        Self::create_inline_cache(INLINE_CACHE_DEFAULT_TTL, computer)
    }

    // == Reset ==
    /// Clears every registered cache locally and empties the registry.
    ///
    /// Invoked at process shutdown; a stopping node must not roam its
    /// clears, so coherent caches are cleared via their local path.
    pub fn reset(&self) {
        let mut caches = self.caches_write();
        for registration in caches.values() {
            match &registration.coherent {
                Some(coherent) => coherent.clear_local(),
                None => registration.monitor.clear(),
            }
        }
        caches.clear();
        info!("cleared and dropped all registered caches");
    }

    fn coherence(&self) -> Option<Arc<dyn CacheCoherence>> {
        self.coherence
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn caches_read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Registration>> {
        self.caches.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn caches_write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Registration>> {
        self.caches.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("caches", &self.caches_read().len())
            .finish()
    }
}
