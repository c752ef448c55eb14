//! # Steadfast
//!
//! Resilience primitives for expensive, flaky computations.
//!
//! - [`jitter`] perturbs a number by a bounded, normally distributed offset.
//! - [`Retry`] repeats an operation until a validator accepts its result,
//!   waiting with optional jitter and exponential backoff between attempts.
//! - [`Cache`] stores results on disk, keyed by the operation's name and
//!   arguments, and serves them back while they are fresh enough.
//!
//! All wrappers implement [`Operation`], so they nest freely.
//!
//! ## Quick Example
//!
//! ```rust
//! use steadfast::{from_fn, Cache, CacheConfig, Operation, Retry, RetryPolicy};
//! use std::time::Duration;
//!
//! let dir = tempfile::tempdir().unwrap();
//!
//! // A measurement that is sometimes out of range
//! let mut readings = vec![250.0, -1.0, 19.5].into_iter();
//! let sensor = from_fn("read_sensor", move |(_id,): &(u32,)| {
//!     readings.next().ok_or_else(|| "sensor offline".to_string())
//! });
//!
//! let policy = RetryPolicy::new()
//!     .with_max_attempts(5)
//!     .with_delay(Duration::from_millis(1))
//!     .with_backoff(2.0);
//! let plausible = |t: &f64| (-40.0..=60.0).contains(t);
//! let retried = Retry::new(sensor, plausible, policy).unwrap();
//!
//! let mut cached = Cache::new(retried, CacheConfig::new().with_dir(dir.path())).unwrap();
//!
//! assert_eq!(cached.call(&(7,)).unwrap(), -1.0);
//! // served from disk; the sensor is not read again
//! assert_eq!(cached.call(&(7,)).unwrap(), -1.0);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cache;
pub mod jitter;
mod operation;
pub mod retry;

// Re-exports
pub use cache::{Cache, CacheConfig, CacheError, CachedCallError, Cacheable, Table};
pub use jitter::{jitter, jitter_with, JitterArgs, JitterError, Jittered, SIGMA_COUNT};
pub use operation::{from_fn, FnOperation, Operation};
pub use retry::{BackoffSchedule, PolicyError, Retry, RetryError, RetryPolicy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{ArgRepr, Cache, CacheConfig, Cacheable, CallArgs, Table, ToCallArgs};
    pub use crate::jitter::{jitter, JitterArgs, Jittered};
    pub use crate::operation::{from_fn, Operation};
    pub use crate::retry::{Retry, RetryPolicy};
}
