//! Retry policy types and configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::jitter;
use crate::retry::PolicyError;

/// A retry policy describing how often and how patiently to retry.
///
/// Policies are pure data - they describe retry behavior but don't execute it.
/// This makes them easy to test, clone, inspect and load from configuration
/// files. Turn one into a [`BackoffSchedule`] with [`build`](Self::build).
///
/// # Defaults
///
/// One attempt, no delay, no jitter, no backoff.
///
/// # Examples
///
/// ```rust
/// use steadfast::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_delay(Duration::from_millis(100))
///     .with_jitter(0.5)
///     .with_backoff(2.0);
///
/// assert_eq!(policy.max_attempts(), 5);
/// assert!(policy.build().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: f64,
    jitter: f64,
    backoff: bool,
    backoff_base: f64,
    random_exponent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: 0.0,
            jitter: 0.0,
            backoff: false,
            backoff_base: 1.0,
            random_exponent: false,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hard cap on invocations, including the first one.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base wait between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay.as_secs_f64();
        self
    }

    /// Set the base wait between attempts in seconds.
    ///
    /// Negative or non-finite values are rejected by [`build`](Self::build).
    pub fn with_delay_secs(mut self, secs: f64) -> Self {
        self.delay = secs;
        self
    }

    /// Jitter each wait by up to `± factor` of itself. Must be in `[0, 1]`.
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter = factor;
        self
    }

    /// Enable exponential backoff with the given base (`>= 1`).
    ///
    /// ```rust
    /// use steadfast::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let schedule = RetryPolicy::new()
    ///     .with_max_attempts(4)
    ///     .with_delay(Duration::from_millis(100))
    ///     .with_backoff(2.0)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut rng = rand::rng();
    /// assert_eq!(schedule.wait_time(1, &mut rng), Duration::from_millis(100));
    /// assert_eq!(schedule.wait_time(2, &mut rng), Duration::from_millis(200));
    /// assert_eq!(schedule.wait_time(3, &mut rng), Duration::from_millis(400));
    /// ```
    pub fn with_backoff(mut self, base: f64) -> Self {
        self.backoff = true;
        self.backoff_base = base;
        self
    }

    /// Disable exponential backoff.
    pub fn without_backoff(mut self) -> Self {
        self.backoff = false;
        self
    }

    /// Draw each backoff exponent uniformly from the failures seen so far
    /// instead of growing it monotonically.
    pub fn with_random_exponent(mut self, enabled: bool) -> Self {
        self.random_exponent = enabled;
        self
    }

    /// Get the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the base delay in seconds.
    pub fn delay_secs(&self) -> f64 {
        self.delay
    }

    /// Get the jitter factor.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Whether exponential backoff is requested.
    pub fn backoff(&self) -> bool {
        self.backoff
    }

    /// Get the backoff base.
    pub fn backoff_base(&self) -> f64 {
        self.backoff_base
    }

    /// Whether the backoff exponent is randomized.
    pub fn random_exponent(&self) -> bool {
        self.random_exponent
    }

    /// Validate the policy and resolve it into a schedule.
    ///
    /// Settings that cannot take effect are switched off: a zero delay drops
    /// jitter and backoff, disabled backoff forces the base to 1, and a base
    /// of 1 drops exponent randomization.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] naming the first out-of-range field.
    pub fn build(&self) -> Result<BackoffSchedule, PolicyError> {
        if self.max_attempts < 1 {
            return Err(PolicyError::MaxAttempts(self.max_attempts));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(PolicyError::Delay(self.delay));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(PolicyError::Jitter(self.jitter));
        }
        if !self.backoff_base.is_finite() || self.backoff_base < 1.0 {
            return Err(PolicyError::BackoffBase(self.backoff_base));
        }

        let (jitter, backoff) = if self.delay == 0.0 {
            (0.0, false)
        } else {
            (self.jitter, self.backoff)
        };
        let base = if backoff { self.backoff_base } else { 1.0 };
        let random_exponent = self.random_exponent && base != 1.0;

        Ok(BackoffSchedule {
            max_attempts: self.max_attempts,
            delay: self.delay,
            jitter,
            base,
            random_exponent,
        })
    }
}

/// A validated, normalized retry schedule.
///
/// Immutable once built. Obtain one from [`RetryPolicy::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffSchedule {
    max_attempts: u32,
    delay: f64,
    jitter: f64,
    base: f64,
    random_exponent: bool,
}

impl BackoffSchedule {
    /// Maximum number of invocations.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay)
    }

    /// Effective jitter factor (0 when there is no delay).
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Effective backoff base (1 when backoff is off).
    pub fn base(&self) -> f64 {
        self.base
    }

    /// Whether exponents are drawn at random.
    pub fn random_exponent(&self) -> bool {
        self.random_exponent
    }

    /// How long to wait after the `fail_count`-th rejected result.
    ///
    /// Returns zero when there is no delay or nothing has failed yet.
    pub fn wait_time<R>(&self, fail_count: u32, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        if self.delay == 0.0 || fail_count == 0 {
            return Duration::ZERO;
        }

        let exponent = if self.random_exponent {
            rng.random_range(0..fail_count)
        } else {
            fail_count - 1
        };

        let raw = self.base.powf(f64::from(exponent)) * self.delay;
        if !raw.is_finite() {
            return Duration::MAX;
        }
        let secs = raw + jitter::offset(rng, raw, self.jitter).unwrap_or(0.0);
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}
