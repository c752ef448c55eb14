//! Error types for retry operations.

/// An out-of-range retry policy field, reported by
/// [`RetryPolicy::build`](crate::RetryPolicy::build).
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// `max_attempts` was zero.
    #[error("max_attempts must be at least 1, got {0}")]
    MaxAttempts(u32),

    /// `delay` was negative, NaN or infinite.
    #[error("delay must be a finite number of seconds >= 0, got {0}")]
    Delay(f64),

    /// `jitter` was outside `[0, 1]`.
    #[error("jitter factor must be within [0, 1], got {0}")]
    Jitter(f64),

    /// `backoff_base` was below 1 or not finite.
    #[error("backoff base must be a finite number >= 1, got {0}")]
    BackoffBase(f64),
}

/// Error returned by a retried operation.
///
/// # Examples
///
/// ```rust
/// use steadfast::{from_fn, Retry, RetryError, RetryPolicy};
///
/// let op = from_fn("always_zero", |_: &u8| Ok::<_, String>(0u8));
/// let policy = RetryPolicy::new().with_max_attempts(3);
/// let mut retry = Retry::new(op, |v: &u8| *v > 0, policy).unwrap();
///
/// match retry.execute(&7) {
///     Err(RetryError::Exhausted { operation, args, fail_count }) => {
///         assert_eq!(operation, "always_zero");
///         assert_eq!(args, "7");
///         assert_eq!(fail_count, 3);
///     }
///     other => panic!("expected exhaustion, got {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt produced a result the validator rejected.
    Exhausted {
        /// Name of the operation.
        operation: String,
        /// `Debug` rendering of the arguments of the final call.
        args: String,
        /// Number of rejected results.
        fail_count: u32,
    },
    /// The operation itself failed. Never retried.
    Operation(E),
}

impl<E> RetryError<E> {
    /// Returns true if all attempts were used up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns true if the wrapped operation failed.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Number of rejected results, if exhausted.
    pub fn fail_count(&self) -> Option<u32> {
        match self {
            Self::Exhausted { fail_count, .. } => Some(*fail_count),
            Self::Operation(_) => None,
        }
    }

    /// Get the operation's own error if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Exhausted { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                operation,
                args,
                fail_count,
            } => write!(
                f,
                "{} with args {} failed validation {} times",
                operation, args, fail_count
            ),
            Self::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Exhausted { .. } => None,
            Self::Operation(e) => Some(e),
        }
    }
}
