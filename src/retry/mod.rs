//! Validated retries with jittered exponential backoff.
//!
//! The retry engine repeats an operation until a validator accepts its
//! result. It follows a simple split:
//!
//! - **Pure data**: [`RetryPolicy`] is plain, serializable configuration.
//! - **Checked once**: [`RetryPolicy::build`] validates and normalizes it into a
//!   [`BackoffSchedule`], which owns the wait-time arithmetic.
//! - **Imperative shell**: [`Retry`] wraps an [`Operation`](crate::Operation)
//!   and blocks the calling thread between attempts.
//!
//! # Quick Start
//!
//! ```rust
//! use steadfast::{from_fn, Retry, RetryPolicy};
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! let mut n = 0;
//! let flaky = from_fn("next_even", move |_: &()| {
//!     n += 1;
//!     Ok::<_, Infallible>(n)
//! });
//!
//! let policy = RetryPolicy::new()
//!     .with_max_attempts(5)
//!     .with_delay(Duration::from_millis(1))
//!     .with_backoff(2.0);
//!
//! let mut retry = Retry::new(flaky, |n: &i32| n % 2 == 0, policy).unwrap();
//! assert_eq!(retry.execute(&()).unwrap(), 2);
//! ```
//!
//! # Waiting
//!
//! After the k-th rejected result the engine sleeps for
//! `jitter(base^e * delay, jitter_factor)` seconds, where `e = k - 1`, or a
//! uniformly random integer in `[0, k - 1]` when the exponent is randomized.
//! A zero delay disables jitter and backoff entirely.
//!
//! # What Is Retried
//!
//! Only *validation* failures are retried. If the operation itself returns an
//! error, that error is surfaced at once as [`RetryError::Operation`]. To also
//! retry on errors, map them into a value the validator rejects.
//!
//! # Error Types
//!
//! - [`PolicyError`]: an out-of-range policy field, reported by `build`
//! - [`RetryError`]: exhaustion, or the operation's own error

mod engine;
mod error;
mod policy;

pub use engine::Retry;
pub use error::{PolicyError, RetryError};
pub use policy::{BackoffSchedule, RetryPolicy};
