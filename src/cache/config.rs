//! Cache configuration and the clock used to stamp results.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Where and how a [`Cache`](crate::Cache) stores results.
///
/// Plain data, loadable from any serde format. The reachback text is parsed
/// when the cache is built, so a malformed value fails there and not on the
/// first call.
///
/// # Defaults
///
/// Directory `cache`, reachback `0001-01-01` (any stored result is fresh
/// enough), single-version retention.
///
/// # Examples
///
/// ```rust
/// use steadfast::CacheConfig;
///
/// let config = CacheConfig::new()
///     .with_dir("/var/cache/samples")
///     .with_reachback("2 days, 12 hours")
///     .with_hoard(true);
///
/// assert!(config.hoard());
/// assert_eq!(config.reachback(), "2 days, 12 hours");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    dir: PathBuf,
    reachback: String,
    hoard: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            reachback: "0001-01-01".to_string(),
            hoard: false,
        }
    }
}

impl CacheConfig {
    /// Create a config with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage directory. It is created on first write.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Set the freshness window, e.g. `"2024-01"` or `"3 hours, 30 minutes"`.
    pub fn with_reachback(mut self, reachback: impl Into<String>) -> Self {
        self.reachback = reachback.into();
        self
    }

    /// Keep every stored result (`true`) or only the newest per call
    /// (`false`).
    pub fn with_hoard(mut self, hoard: bool) -> Self {
        self.hoard = hoard;
        self
    }

    /// Get the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the reachback text.
    pub fn reachback(&self) -> &str {
        &self.reachback
    }

    /// Get the retention mode.
    pub fn hoard(&self) -> bool {
        self.hoard
    }
}

/// Source of the timestamps written into cache file names and used to
/// resolve relative reachbacks.
pub trait Clock {
    /// The current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local wall clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

impl<F> Clock for F
where
    F: Fn() -> NaiveDateTime,
{
    fn now(&self) -> NaiveDateTime {
        self()
    }
}
