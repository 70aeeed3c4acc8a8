//! Remover Builder Module
//!
//! Fluent pipeline for composing named removal predicates out of `map`,
//! `filter` and `remove_always` stages. Each stage threads a tri-state
//! decision per entry, so entries already excluded or already condemned
//! skip the remaining (possibly expensive) stages.

use std::fmt;
use std::hash::Hash;

use crate::cache::entry::CacheEntry;
use crate::cache::managed::ManagedCache;

// == Remover Decision ==
/// Per-entry state threaded through the pipeline stages.
///
/// Once an entry is `Filtered` (keep) or `Removed` (drop), later stages
/// pass it through unevaluated.
pub enum RemoverDecision<T> {
    /// Still under consideration, carrying the stage's derived value
    Undecided(T),
    /// Excluded from removal, short-circuits to "keep"
    Filtered,
    /// Condemned, short-circuits to "remove"
    Removed,
}

type Stage<K, V, T> =
    Box<dyn Fn(&str, &CacheEntry<K, V>) -> RemoverDecision<T> + Send + Sync>;

// == Remover Builder ==
/// Builds a removal predicate step by step and installs it under a
/// discriminator via [`remove_if`](Self::remove_if).
///
/// Created by [`ManagedCache::remover`]. The pipeline initially operates on
/// the cache entry itself; `map` changes the carried type. Every stage comes
/// in two flavors: a plain one ignoring the broadcast test input and a
/// `_with` one receiving it as first argument.
///
/// # Example
/// ```ignore
/// cache
///     .remover("region")
///     .map(|entry| entry.value().region.clone())
///     .filter(|region| !region.is_empty())
///     .remove_if_with(|test_input, region| region == test_input);
/// cache.remove_all("region", "west");
/// ```
pub struct RemoverBuilder<'c, K, V, T> {
    cache: &'c ManagedCache<K, V>,
    discriminator: String,
    stage: Stage<K, V, T>,
}

impl<'c, K, V> RemoverBuilder<'c, K, V, CacheEntry<K, V>>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Starts a pipeline operating on the cache entries themselves.
    pub(crate) fn new(cache: &'c ManagedCache<K, V>, discriminator: String) -> Self {
        Self {
            cache,
            discriminator,
            stage: Box::new(|_, entry| RemoverDecision::Undecided(entry.clone())),
        }
    }
}

impl<'c, K, V, T> RemoverBuilder<'c, K, V, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
    T: 'static,
{
    // == Map ==
    /// Transforms the carried value for undecided entries.
    pub fn map<R, F>(self, mapper: F) -> RemoverBuilder<'c, K, V, R>
    where
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.map_with(move |_, value| mapper(value))
    }

    /// Like [`map`](Self::map), additionally receiving the test input.
    pub fn map_with<R, F>(self, mapper: F) -> RemoverBuilder<'c, K, V, R>
    where
        F: Fn(&str, T) -> R + Send + Sync + 'static,
    {
        let stage = self.stage;
        RemoverBuilder {
            cache: self.cache,
            discriminator: self.discriminator,
            stage: Box::new(move |test_input, entry| match stage(test_input, entry) {
                RemoverDecision::Undecided(value) => {
                    RemoverDecision::Undecided(mapper(test_input, value))
                }
                RemoverDecision::Filtered => RemoverDecision::Filtered,
                RemoverDecision::Removed => RemoverDecision::Removed,
            }),
        }
    }

    // == Filter ==
    /// Excludes non-matching entries from removal; later stages are skipped
    /// for them.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter_with(move |_, value| predicate(value))
    }

    /// Like [`filter`](Self::filter), additionally receiving the test input.
    pub fn filter_with<F>(self, predicate: F) -> Self
    where
        F: Fn(&str, &T) -> bool + Send + Sync + 'static,
    {
        let stage = self.stage;
        Self {
            cache: self.cache,
            discriminator: self.discriminator,
            stage: Box::new(move |test_input, entry| match stage(test_input, entry) {
                RemoverDecision::Undecided(value) => {
                    if predicate(test_input, &value) {
                        RemoverDecision::Undecided(value)
                    } else {
                        RemoverDecision::Filtered
                    }
                }
                decided => decided,
            }),
        }
    }

    // == Remove Always ==
    /// Condemns matching entries immediately; later stages are skipped for
    /// them.
    pub fn remove_always<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.remove_always_with(move |_, value| predicate(value))
    }

    /// Like [`remove_always`](Self::remove_always), additionally receiving
    /// the test input.
    pub fn remove_always_with<F>(self, predicate: F) -> Self
    where
        F: Fn(&str, &T) -> bool + Send + Sync + 'static,
    {
        let stage = self.stage;
        Self {
            cache: self.cache,
            discriminator: self.discriminator,
            stage: Box::new(move |test_input, entry| match stage(test_input, entry) {
                RemoverDecision::Undecided(value) => {
                    if predicate(test_input, &value) {
                        RemoverDecision::Removed
                    } else {
                        RemoverDecision::Undecided(value)
                    }
                }
                decided => decided,
            }),
        }
    }

    // == Remove If ==
    /// Terminates the pipeline: undecided entries are evaluated with the
    /// given predicate, and the composed remover is installed under the
    /// discriminator. Returns the cache for chaining.
    pub fn remove_if<F>(self, predicate: F) -> &'c ManagedCache<K, V>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.remove_if_with(move |_, value| predicate(value))
    }

    /// Like [`remove_if`](Self::remove_if), additionally receiving the test
    /// input.
    pub fn remove_if_with<F>(self, predicate: F) -> &'c ManagedCache<K, V>
    where
        F: Fn(&str, &T) -> bool + Send + Sync + 'static,
    {
        let stage = self.stage;
        self.cache
            .add_remover(self.discriminator, move |test_input, entry| {
                match stage(test_input, entry) {
                    RemoverDecision::Undecided(value) => predicate(test_input, &value),
                    RemoverDecision::Filtered => false,
                    RemoverDecision::Removed => true,
                }
            })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use crate::cache::managed::ManagedCache;
    use crate::config::{CacheSettings, Settings};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn region_cache() -> ManagedCache<String, (String, String)> {
        let settings = Arc::new(
            Settings::new().with_cache("regions", CacheSettings::default()),
        );
        ManagedCache::new("regions", settings, None, None)
    }

    #[test]
    fn test_map_filter_remove_if_pipeline() {
        let cache = region_cache();

        // Value is (region, payload); remove entries of the broadcast region,
        // skipping entries without one.
        cache
            .remover("region")
            .map(|entry| entry.value().0.clone())
            .filter(|region| !region.is_empty())
            .remove_if_with(|test_input, region| region == test_input);

        cache.put("a".to_string(), ("west".to_string(), "1".to_string()));
        cache.put("b".to_string(), ("east".to_string(), "2".to_string()));
        cache.put("c".to_string(), (String::new(), "3".to_string()));
        cache.put("d".to_string(), ("west".to_string(), "4".to_string()));

        cache.remove_all("region", "west");

        assert!(cache.get(&"a".to_string()).unwrap().is_none());
        assert!(cache.get(&"b".to_string()).unwrap().is_some());
        assert!(cache.get(&"c".to_string()).unwrap().is_some());
        assert!(cache.get(&"d".to_string()).unwrap().is_none());
    }

    #[test]
    fn test_remove_always_short_circuits() {
        let cache = region_cache();

        // Entries whose payload matches the test input are condemned even
        // though the terminal predicate never removes anything.
        cache
            .remover("payload")
            .map(|entry| entry.value().clone())
            .remove_always_with(|test_input, value| value.1 == test_input)
            .remove_if(|_value| false);

        cache.put("a".to_string(), ("west".to_string(), "1".to_string()));
        cache.put("b".to_string(), ("east".to_string(), "2".to_string()));

        cache.remove_all("payload", "2");

        assert!(cache.get(&"a".to_string()).unwrap().is_some());
        assert!(cache.get(&"b".to_string()).unwrap().is_none());
    }

    #[test]
    fn test_filter_skips_later_stages() {
        let cache = region_cache();
        let mapped = Arc::new(AtomicU64::new(0));
        let counter = mapped.clone();

        cache
            .remover("counted")
            .filter(|entry| !entry.value().0.is_empty())
            .map(move |entry| {
                counter.fetch_add(1, Ordering::SeqCst);
                entry.value().0.clone()
            })
            .remove_if(|_region| true);

        cache.put("a".to_string(), (String::new(), "1".to_string()));
        cache.put("b".to_string(), ("west".to_string(), "2".to_string()));

        cache.remove_all("counted", "ignored");

        // The expensive mapping only ran for the non-filtered entry
        assert_eq!(mapped.load(Ordering::SeqCst), 1);
        assert!(cache.get(&"a".to_string()).unwrap().is_some());
        assert!(cache.get(&"b".to_string()).unwrap().is_none());
    }

    #[test]
    fn test_filter_on_selector() {
        let cache = region_cache();

        // Entries whose key equals the test input are protected
        cache
            .remover("guarded")
            .filter_with(|test_input, entry| entry.key() != test_input)
            .remove_if(|_entry| true);

        cache.put("a".to_string(), ("west".to_string(), "1".to_string()));
        cache.put("b".to_string(), ("east".to_string(), "2".to_string()));

        cache.remove_all("guarded", "a");

        assert!(cache.get(&"a".to_string()).unwrap().is_some());
        assert!(cache.get(&"b".to_string()).unwrap().is_none());
    }
}
