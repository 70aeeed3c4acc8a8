//! Configuration Module
//!
//! Per-cache settings (capacity, TTL, verification interval) and server
//! configuration, loaded from environment variables with sensible defaults.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

// == Cache Settings ==
/// Settings for a single named cache.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Maximum number of entries, 0 = unbounded
    pub max_size: usize,
    /// Entry lifetime, zero = entries never expire
    pub ttl: Duration,
    /// Interval after which values are re-verified, zero = never
    pub verification: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: 1000,
            ttl: Duration::ZERO,
            verification: Duration::ZERO,
        }
    }
}

// == Settings ==
/// Settings for all named caches plus the fallback defaults.
///
/// Caches resolve their settings lazily on first access, so the settings
/// source can be assembled after the caches were created.
#[derive(Debug, Default)]
pub struct Settings {
    /// Fallback for caches without explicit settings
    defaults: CacheSettings,
    /// Per-cache settings, keyed by cache name
    caches: HashMap<String, CacheSettings>,
}

impl Settings {
    // == Constructor ==
    /// Creates empty settings with built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the fallback defaults.
    pub fn with_defaults(mut self, defaults: CacheSettings) -> Self {
        self.defaults = defaults;
        self
    }

    /// Adds settings for the named cache.
    pub fn with_cache(mut self, name: impl Into<String>, settings: CacheSettings) -> Self {
        self.caches.insert(name.into(), settings);
        self
    }

    /// Returns the settings for the named cache, if configured.
    pub fn cache(&self, name: &str) -> Option<&CacheSettings> {
        self.caches.get(name)
    }

    /// Returns the fallback defaults.
    pub fn defaults(&self) -> &CacheSettings {
        &self.defaults
    }

    // == From Env ==
    /// Loads per-cache settings from environment variables.
    ///
    /// Each cache is configured through variables of the form
    /// `CACHE_<NAME>_MAX_SIZE`, `CACHE_<NAME>_TTL` and
    /// `CACHE_<NAME>_VERIFICATION` (durations in seconds), where `<NAME>` is
    /// the upper-cased cache name with dashes replaced by underscores.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut settings = Settings::new();

        for (key, value) in env::vars() {
            let Some(rest) = key.strip_prefix("CACHE_") else {
                continue;
            };
            let Some((name, field)) = split_cache_var(rest) else {
                continue;
            };

            let entry = settings
                .caches
                .entry(name)
                .or_insert_with(CacheSettings::default);
            match field {
                "MAX_SIZE" => {
                    if let Ok(max_size) = value.parse() {
                        entry.max_size = max_size;
                    }
                }
                "TTL" => {
                    if let Ok(secs) = value.parse() {
                        entry.ttl = Duration::from_secs(secs);
                    }
                }
                "VERIFICATION" => {
                    if let Ok(secs) = value.parse() {
                        entry.verification = Duration::from_secs(secs);
                    }
                }
                _ => {}
            }
        }

        settings
    }
}

/// Splits `<NAME>_<FIELD>` into the lower-cased cache name and the field
/// suffix, e.g. `USER_SESSIONS_MAX_SIZE` -> (`user-sessions`, `MAX_SIZE`).
fn split_cache_var(rest: &str) -> Option<(String, &str)> {
    for field in ["MAX_SIZE", "TTL", "VERIFICATION"] {
        if let Some(name) = rest
            .strip_suffix(field)
            .and_then(|prefix| prefix.strip_suffix('_'))
        {
            if name.is_empty() {
                return None;
            }
            return Some((name.to_lowercase().replace('_', "-"), field));
        }
    }
    None
}

// == Server Config ==
/// Configuration for a cache node process.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Interval between maintenance cycles in seconds
    pub eviction_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `EVICTION_INTERVAL` - Maintenance cycle frequency in seconds (default: 600)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            eviction_interval: env::var("EVICTION_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            eviction_interval: 600,
        }
    }
}
