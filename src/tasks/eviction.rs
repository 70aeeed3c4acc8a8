//! Eviction Task
//!
//! Background task that periodically samples cache statistics and removes
//! expired entries from every registered cache.

use std::sync::Arc;
use std::time::Duration;

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::manager::CacheManager;

/// Spawns a background task that periodically runs eviction on all caches.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs. Each run first folds the current hit rate of every cache
/// into its usage history, then sweeps expired entries.
///
/// # Arguments
/// * `manager` - Shared cache manager whose caches are maintained
/// * `eviction_interval_secs` - Interval in seconds between eviction runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_eviction_task(
    manager: Arc<CacheManager>,
    eviction_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(eviction_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting eviction task with interval of {} seconds",
            eviction_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            for cache in manager.caches() {
                debug!("Running eviction for cache '{}'", cache.name());
                // A panicking removal callback must not take the timer (and
                // with it every other cache's maintenance) down
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    cache.update_statistics();
                    cache.run_eviction()
                }));
                match outcome {
                    Ok(removed) if removed > 0 => {
                        info!(
                            "Eviction on cache '{}': removed {} expired entries",
                            cache.name(),
                            removed
                        );
                    }
                    Ok(_) => {}
                    Err(_) => {
                        warn!(
                            "Eviction on cache '{}' panicked, skipping this cycle",
                            cache.name()
                        );
                    }
                }
            }
        }
    })
}
