//! Managed Cache Module
//!
//! The core cache implementation: lookup with expiry and verification,
//! value computation on miss, capacity eviction, named removers and the
//! monitoring surface consumed by the eviction timer and dashboards.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::compute::{ValueComputer, ValueVerifier};
use crate::cache::entry::{current_timestamp_ms, CacheEntry, EntrySnapshot};
use crate::cache::remover::RemoverBuilder;
use crate::cache::stats::{CacheStats, UsageHistory};
use crate::cache::store::BoundedStore;
use crate::config::Settings;
use crate::error::{CacheError, Result};

// == Type Aliases ==
/// Predicate registered under a discriminator: `(test_input, entry) -> remove?`
pub type RemoverFn<K, V> = Box<dyn Fn(&str, &CacheEntry<K, V>) -> bool + Send + Sync>;

/// Callback invoked whenever an entry leaves the cache.
pub type RemovalCallback<K, V> = Box<dyn Fn(&K, &V) + Send + Sync>;

// == Cache Monitor ==
/// Monitoring and maintenance surface shared by all cache flavors.
///
/// The manager registry stores caches behind this trait so the eviction
/// timer and the dashboard endpoints can walk heterogeneous caches.
pub trait CacheMonitor: Send + Sync {
    /// Returns the cache name (also the configuration lookup key).
    fn name(&self) -> &str;
    /// Returns the configured capacity (0 = unbounded).
    fn max_size(&self) -> usize;
    /// Returns the current number of entries.
    fn size(&self) -> usize;
    /// Returns the number of accesses since the last maintenance cycle.
    fn uses(&self) -> u64;
    /// Returns the hit rate of the current cycle as a rounded percentage.
    fn hit_rate(&self) -> u64;
    /// Returns the per-cycle access counts, oldest first.
    fn use_history(&self) -> Vec<u64>;
    /// Returns the per-cycle hit rates, oldest first.
    fn hit_rate_history(&self) -> Vec<u64>;
    /// Returns when the eviction sweep last ran.
    fn last_eviction_run(&self) -> Option<DateTime<Utc>>;
    /// Samples the current counters into the histories and resets them.
    fn update_statistics(&self);
    /// Drops all expired entries; returns how many were evicted.
    fn run_eviction(&self) -> usize;
    /// Drops all entries and resets the counters.
    fn clear(&self);
    /// Returns a read-only snapshot of all entries.
    fn contents(&self) -> Vec<EntrySnapshot>;
}

// == Managed Cache ==
/// Size- and time-bounded cache with optional value computation and
/// verification.
///
/// Storage is initialized lazily on first access since caches are commonly
/// created before the configuration is loaded. All methods take `&self`;
/// the cache is safe to share behind an `Arc`.
pub struct ManagedCache<K, V> {
    /// Cache name, also the configuration lookup key
    name: String,
    /// Settings source, resolved lazily on first access
    settings: Arc<Settings>,
    /// Default computer for absent values
    computer: Option<Arc<dyn ValueComputer<K, V>>>,
    /// Verifier re-checking values once their interval elapsed
    verifier: Option<Arc<dyn ValueVerifier<V>>>,
    /// Storage plus resolved limits, None until first access
    state: RwLock<Option<CacheState<K, V>>>,
    /// Hit/miss counters for the current maintenance cycle
    stats: CacheStats,
    /// Bounded per-cycle histories, written by the maintenance cycle only
    history: Mutex<UsageHistory>,
    /// Named removal predicates, keyed by discriminator
    removers: RwLock<HashMap<String, RemoverFn<K, V>>>,
    /// At most one removal callback
    removal_callback: RwLock<Option<RemovalCallback<K, V>>>,
}

/// Storage and limits resolved from the settings on first access.
struct CacheState<K, V> {
    store: BoundedStore<K, V>,
    ttl_millis: u64,
    verification_millis: u64,
}

/// Outcome of the locked portion of a lookup.
enum Lookup<V> {
    /// No live entry for the key
    Miss,
    /// Live entry found and counted
    Hit(V),
    /// Entry found but its verification interval has elapsed
    Verify(V),
}

impl<K, V> ManagedCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new cache. Not intended to be called outside of the
    /// `CacheManager`.
    pub(crate) fn new(
        name: impl Into<String>,
        settings: Arc<Settings>,
        computer: Option<Arc<dyn ValueComputer<K, V>>>,
        verifier: Option<Arc<dyn ValueVerifier<V>>>,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            computer,
            verifier,
            state: RwLock::new(None),
            stats: CacheStats::new(),
            history: Mutex::new(UsageHistory::default()),
            removers: RwLock::new(HashMap::new()),
            removal_callback: RwLock::new(None),
        }
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configured capacity (0 = unbounded).
    ///
    /// Falls back to the settings before the first access so monitoring
    /// reports the right limit for caches that were never touched.
    pub fn max_size(&self) -> usize {
        if let Some(state) = self.state_read().as_ref() {
            return state.store.max_size();
        }
        self.settings
            .cache(&self.name)
            .unwrap_or_else(|| self.settings.defaults())
            .max_size
    }

    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.state_read().as_ref().map_or(0, |s| s.store.len())
    }

    // == Get ==
    /// Returns the cached value for the given key, computing it with the
    /// cache's default computer on a miss.
    ///
    /// Expired entries and entries rejected by the verifier are dropped and
    /// treated as misses. Computer and verifier failures are propagated to
    /// the caller; the cache is left unchanged.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.lookup(key, self.computer.as_deref())
    }

    /// Same as [`get`](Self::get), but the supplied computer takes
    /// precedence over the cache's default.
    pub fn get_with(&self, key: &K, computer: &dyn ValueComputer<K, V>) -> Result<Option<V>> {
        self.lookup(key, Some(computer))
    }

    fn lookup(&self, key: &K, computer: Option<&dyn ValueComputer<K, V>>) -> Result<Option<V>> {
        self.ensure_init();

        if let Some(value) = self.find_live(key)? {
            return Ok(Some(value));
        }

        self.stats.record_miss();

        let Some(computer) = computer else {
            return Ok(None);
        };
        // The computer runs without any cache lock held; concurrent misses
        // on the same key may therefore compute more than once.
        let Some(value) = computer.compute(key).map_err(CacheError::Computation)? else {
            return Ok(None);
        };
        self.insert_entry(key.clone(), value.clone());
        Ok(Some(value))
    }

    /// Finds a live entry for the key, dropping it when it turned out to be
    /// expired or failed verification.
    fn find_live(&self, key: &K) -> Result<Option<V>> {
        let now = current_timestamp_ms();

        enum Found<V> {
            Miss,
            Expired,
            Verify(V),
            Hit(V),
        }

        let outcome = {
            let mut guard = self.state_write();
            let Some(state) = guard.as_mut() else {
                return Ok(None);
            };
            let verification_millis = state.verification_millis;

            let found = match state.store.get_mut(key) {
                None => Found::Miss,
                Some(entry) => {
                    if entry.is_expired(now) {
                        Found::Expired
                    } else if self.verifier.is_some()
                        && verification_millis > 0
                        && entry.next_verification() < now
                    {
                        Found::Verify(entry.value().clone())
                    } else {
                        entry.record_hit(now);
                        Found::Hit(entry.value().clone())
                    }
                }
            };

            match found {
                Found::Miss => Lookup::Miss,
                Found::Expired => {
                    let removed = state.store.remove(key);
                    drop(guard);
                    debug!(cache = %self.name, "dropped expired entry");
                    if let Some(entry) = removed {
                        self.notify_removal(&entry);
                    }
                    return Ok(None);
                }
                Found::Verify(value) => Lookup::Verify(value),
                Found::Hit(value) => {
                    state.store.touch(key);
                    Lookup::Hit(value)
                }
            }
        };

        match outcome {
            Lookup::Miss => Ok(None),
            Lookup::Hit(value) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            Lookup::Verify(value) => {
                // The verifier runs without the storage lock held
                let valid = match &self.verifier {
                    Some(verifier) => verifier.valid(&value).map_err(CacheError::Computation)?,
                    None => true,
                };
                if valid {
                    let mut guard = self.state_write();
                    if let Some(state) = guard.as_mut() {
                        // The entry may have been removed while the verifier
                        // ran unlocked; only a still-present entry counts as
                        // recently used.
                        if let Some(entry) = state.store.get_mut(key) {
                            entry.record_hit(now);
                            state.store.touch(key);
                        }
                    }
                    self.stats.record_hit();
                    Ok(Some(value))
                } else {
                    let removed = self
                        .state_write()
                        .as_mut()
                        .and_then(|state| state.store.remove(key));
                    debug!(cache = %self.name, "dropped entry rejected by verifier");
                    if let Some(entry) = removed {
                        self.notify_removal(&entry);
                    }
                    Ok(None)
                }
            }
        }
    }

    // == Put ==
    /// Unconditionally stores the value under the given key with the same
    /// expiry and verification timestamps as the compute path.
    pub fn put(&self, key: K, value: V) {
        self.ensure_init();
        self.insert_entry(key, value);
    }

    // == Remove ==
    /// Removes the entry for the given key, if present.
    pub fn remove(&self, key: &K) {
        let removed = self
            .state_write()
            .as_mut()
            .and_then(|state| state.store.remove(key));
        if let Some(entry) = removed {
            self.notify_removal(&entry);
        }
    }

    // == Clear ==
    /// Drops all entries, resets the counters and stamps the eviction run.
    pub fn clear(&self) {
        let drained = self
            .state_write()
            .as_mut()
            .map(|state| state.store.drain())
            .unwrap_or_default();
        for entry in &drained {
            self.notify_removal(entry);
        }
        self.stats.reset();
        self.history_lock().mark_eviction_run();
    }

    // == Add Remover ==
    /// Registers (or replaces) a removal predicate under the given
    /// discriminator. Returns the cache for chaining.
    ///
    /// Together with [`remove_all`](Self::remove_all) this lets a two-string
    /// message drive bulk eviction across a cluster without serializing
    /// predicates.
    pub fn add_remover<F>(&self, discriminator: impl Into<String>, predicate: F) -> &Self
    where
        F: Fn(&str, &CacheEntry<K, V>) -> bool + Send + Sync + 'static,
    {
        self.removers_write()
            .insert(discriminator.into(), Box::new(predicate));
        self
    }

    // == Remover Builder ==
    /// Starts a fluent remover pipeline for the given discriminator.
    ///
    /// See [`RemoverBuilder`] for the available stages.
    pub fn remover(&self, discriminator: impl Into<String>) -> RemoverBuilder<'_, K, V, CacheEntry<K, V>> {
        RemoverBuilder::new(self, discriminator.into())
    }

    // == Remove All ==
    /// Removes all entries matched by the predicate registered under the
    /// given discriminator.
    ///
    /// An unknown discriminator is a no-op, so removal messages for removers
    /// only registered on some nodes are safe to broadcast.
    pub fn remove_all(&self, discriminator: &str, test_input: &str) {
        let removers = self.removers_read();
        let Some(predicate) = removers.get(discriminator) else {
            debug!(cache = %self.name, discriminator, "no remover registered, skipping");
            return;
        };

        let removed = self
            .state_write()
            .as_mut()
            .map(|state| {
                state
                    .store
                    .remove_matching(|entry| predicate(test_input, entry))
            })
            .unwrap_or_default();
        drop(removers);

        for entry in &removed {
            self.notify_removal(entry);
        }
    }

    // == On Remove ==
    /// Installs the removal callback, replacing any previous registration.
    ///
    /// The callback fires whenever an entry leaves the cache: capacity
    /// eviction, explicit removal, expiry or verification failure.
    pub fn on_remove<F>(&self, callback: F) -> &Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        *self.callback_write() = Some(Box::new(callback));
        self
    }

    // == Update Statistics ==
    /// Samples the current hit/miss counters into the bounded histories and
    /// resets them. Called once per maintenance cycle.
    pub fn update_statistics(&self) {
        let uses = self.stats.uses();
        let hit_rate = self.stats.hit_rate_percent();
        self.history_lock().push(uses, hit_rate);
        self.stats.reset();
    }

    // == Run Eviction ==
    /// Drops all entries whose expiry has passed; returns how many were
    /// evicted. A cache without a TTL skips the sweep. The eviction-run
    /// timestamp is stamped regardless.
    pub fn run_eviction(&self) -> usize {
        let now = current_timestamp_ms();
        let removed = {
            let mut guard = self.state_write();
            match guard.as_mut() {
                Some(state) if state.ttl_millis > 0 => state
                    .store
                    .remove_matching(|entry| entry.is_expired(now)),
                _ => Vec::new(),
            }
        };

        for entry in &removed {
            self.notify_removal(entry);
        }
        if !removed.is_empty() {
            debug!(cache = %self.name, evicted = removed.len(), "evicted expired entries");
        }
        self.history_lock().mark_eviction_run();
        removed.len()
    }

    // == Monitoring ==
    /// Returns the number of accesses since the last maintenance cycle.
    pub fn uses(&self) -> u64 {
        self.stats.uses()
    }

    /// Returns the hit rate of the current cycle as a rounded percentage.
    pub fn hit_rate(&self) -> u64 {
        self.stats.hit_rate_percent()
    }

    /// Returns the per-cycle access counts, oldest first.
    pub fn use_history(&self) -> Vec<u64> {
        self.history_lock().uses()
    }

    /// Returns the per-cycle hit rates, oldest first.
    pub fn hit_rate_history(&self) -> Vec<u64> {
        self.history_lock().hit_rates()
    }

    /// Returns when the eviction sweep last ran.
    pub fn last_eviction_run(&self) -> Option<DateTime<Utc>> {
        self.history_lock().last_eviction_run()
    }

    /// Returns a read-only snapshot of all entries.
    pub fn contents(&self) -> Vec<EntrySnapshot> {
        self.state_read()
            .as_ref()
            .map(|state| state.store.values().map(EntrySnapshot::from).collect())
            .unwrap_or_default()
    }

    // == Internals ==
    /// Initializes storage from the settings on first access.
    fn ensure_init(&self) {
        if self.state_read().is_some() {
            return;
        }

        let mut guard = self.state_write();
        if guard.is_some() {
            return;
        }

        let resolved = match self.settings.cache(&self.name) {
            Some(settings) => settings.clone(),
            None => {
                warn!(cache = %self.name, "no settings configured for cache, using defaults");
                self.settings.defaults().clone()
            }
        };
        *guard = Some(CacheState {
            store: BoundedStore::new(resolved.max_size),
            ttl_millis: resolved.ttl.as_millis() as u64,
            verification_millis: resolved.verification.as_millis() as u64,
        });
    }

    /// Builds and stores an entry, notifying a capacity eviction.
    fn insert_entry(&self, key: K, value: V) {
        let evicted = {
            let mut guard = self.state_write();
            let Some(state) = guard.as_mut() else {
                return;
            };
            let entry = CacheEntry::new(
                key.clone(),
                value,
                state.ttl_millis,
                state.verification_millis,
            );
            state.store.insert(key, entry)
        };
        if let Some(entry) = evicted {
            self.notify_removal(&entry);
        }
    }

    /// Invokes the removal callback, if one is installed.
    fn notify_removal(&self, entry: &CacheEntry<K, V>) {
        let guard = self.callback_read();
        if let Some(callback) = guard.as_ref() {
            callback(entry.key(), entry.value());
        }
    }

    // Lock poisoning carries no recoverable information for a cache, so all
    // guards shrug it off and use the inner value.
    fn state_read(&self) -> RwLockReadGuard<'_, Option<CacheState<K, V>>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, Option<CacheState<K, V>>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn history_lock(&self) -> MutexGuard<'_, UsageHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn removers_read(&self) -> RwLockReadGuard<'_, HashMap<String, RemoverFn<K, V>>> {
        self.removers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn removers_write(&self) -> RwLockWriteGuard<'_, HashMap<String, RemoverFn<K, V>>> {
        self.removers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn callback_read(&self) -> RwLockReadGuard<'_, Option<RemovalCallback<K, V>>> {
        self.removal_callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn callback_write(&self) -> RwLockWriteGuard<'_, Option<RemovalCallback<K, V>>> {
        self.removal_callback
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> fmt::Debug for ManagedCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedCache")
            .field("name", &self.name)
            .field("size", &self.size())
            .field("max_size", &self.max_size())
            .finish()
    }
}

// == Cache Monitor Implementation ==
impl<K, V> CacheMonitor for ManagedCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        ManagedCache::name(self)
    }

    fn max_size(&self) -> usize {
        ManagedCache::max_size(self)
    }

    fn size(&self) -> usize {
        ManagedCache::size(self)
    }

    fn uses(&self) -> u64 {
        ManagedCache::uses(self)
    }

    fn hit_rate(&self) -> u64 {
        ManagedCache::hit_rate(self)
    }

    fn use_history(&self) -> Vec<u64> {
        ManagedCache::use_history(self)
    }

    fn hit_rate_history(&self) -> Vec<u64> {
        ManagedCache::hit_rate_history(self)
    }

    fn last_eviction_run(&self) -> Option<DateTime<Utc>> {
        ManagedCache::last_eviction_run(self)
    }

    fn update_statistics(&self) {
        ManagedCache::update_statistics(self)
    }

    fn run_eviction(&self) -> usize {
        ManagedCache::run_eviction(self)
    }

    fn clear(&self) {
        ManagedCache::clear(self)
    }

    fn contents(&self) -> Vec<EntrySnapshot> {
        ManagedCache::contents(self)
    }
}
