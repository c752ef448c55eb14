//! The retry loop.

use std::fmt::Debug;

use rand::Rng;

use crate::retry::{BackoffSchedule, PolicyError, RetryError, RetryPolicy};
use crate::Operation;

/// Retries an operation until its result passes a validator.
///
/// Each call runs the wrapped operation up to
/// [`max_attempts`](BackoffSchedule::max_attempts) times. A result the
/// validator accepts is returned immediately. A rejected result counts as a
/// failure: the engine sleeps according to the [`BackoffSchedule`] and tries
/// again, or returns [`RetryError::Exhausted`] once no attempts remain.
///
/// Errors returned by the operation itself are not retried.
///
/// # Examples
///
/// ```rust
/// use steadfast::{from_fn, Operation, Retry, RetryPolicy};
/// use std::cell::Cell;
///
/// let calls = Cell::new(0);
/// let op = from_fn("fifth_time_lucky", |_: &()| {
///     calls.set(calls.get() + 1);
///     Ok::<_, String>(calls.get())
/// });
///
/// let policy = RetryPolicy::new().with_max_attempts(5);
/// let mut retry = Retry::new(op, |n: &u32| *n == 5, policy).unwrap();
///
/// assert_eq!(retry.call(&()), Ok(5));
/// ```
pub struct Retry<Op, V> {
    inner: Op,
    validator: V,
    schedule: BackoffSchedule,
}

impl<Op, V> Retry<Op, V> {
    /// Wrap `inner`, validating each result with `validator`.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] if `policy` is out of range.
    pub fn new(inner: Op, validator: V, policy: RetryPolicy) -> Result<Self, PolicyError> {
        Ok(Self::with_schedule(inner, validator, policy.build()?))
    }

    /// Wrap `inner` with an already-built schedule.
    pub fn with_schedule(inner: Op, validator: V, schedule: BackoffSchedule) -> Self {
        Self {
            inner,
            validator,
            schedule,
        }
    }

    /// The resolved schedule.
    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    /// Get a reference to the wrapped operation.
    pub fn inner(&self) -> &Op {
        &self.inner
    }

    /// Unwrap the inner operation.
    pub fn into_inner(self) -> Op {
        self.inner
    }

    /// Run the operation until a result validates, using the thread-local RNG
    /// for jitter and exponent draws.
    pub fn execute<Args>(&mut self, args: &Args) -> Result<Op::Output, RetryError<Op::Error>>
    where
        Op: Operation<Args>,
        V: FnMut(&Op::Output) -> bool,
        Args: Debug,
    {
        self.execute_with(&mut rand::rng(), args)
    }

    /// Like [`execute`](Self::execute), drawing randomness from `rng`.
    pub fn execute_with<Args, R>(
        &mut self,
        rng: &mut R,
        args: &Args,
    ) -> Result<Op::Output, RetryError<Op::Error>>
    where
        Op: Operation<Args>,
        V: FnMut(&Op::Output) -> bool,
        Args: Debug,
        R: Rng + ?Sized,
    {
        let mut remaining = self.schedule.max_attempts();
        let mut fail_count = 0u32;

        loop {
            let result = self.inner.call(args).map_err(RetryError::Operation)?;
            if (self.validator)(&result) {
                return Ok(result);
            }

            fail_count += 1;
            remaining -= 1;
            if remaining == 0 {
                tracing::warn!(
                    operation = %self.inner.name(),
                    args = ?args,
                    fail_count,
                    "retry attempts exhausted"
                );
                return Err(RetryError::Exhausted {
                    operation: self.inner.name().to_string(),
                    args: format!("{:?}", args),
                    fail_count,
                });
            }

            let wait = self.schedule.wait_time(fail_count, rng);
            tracing::debug!(
                operation = %self.inner.name(),
                fail_count,
                remaining,
                wait_ms = wait.as_millis() as u64,
                "result rejected by validator, retrying"
            );
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
    }
}

impl<Op, V> std::fmt::Debug for Retry<Op, V>
where
    Op: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("inner", &self.inner)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl<Args, Op, V> Operation<Args> for Retry<Op, V>
where
    Op: Operation<Args>,
    V: FnMut(&Op::Output) -> bool,
    Args: Debug,
{
    type Output = Op::Output;
    type Error = RetryError<Op::Error>;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&mut self, args: &Args) -> Result<Self::Output, Self::Error> {
        self.execute(args)
    }
}

#[cfg(feature = "async")]
impl BackoffSchedule {
    /// Run an async operation until its result validates.
    ///
    /// Same semantics as [`Retry::execute`], sleeping with
    /// `tokio::time::sleep` instead of blocking the thread.
    ///
    /// ```rust
    /// use steadfast::RetryPolicy;
    ///
    /// # tokio_test::block_on(async {
    /// let schedule = RetryPolicy::new().with_max_attempts(3).build().unwrap();
    /// let result = schedule
    ///     .execute_async("answer", &(), |v: &i32| *v == 42, |_: &()| async {
    ///         Ok::<_, String>(42)
    ///     })
    ///     .await;
    /// assert_eq!(result, Ok(42));
    /// # });
    /// ```
    pub async fn execute_async<Args, T, E, V, F, Fut>(
        &self,
        name: &str,
        args: &Args,
        mut validator: V,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        Args: Debug,
        V: FnMut(&T) -> bool,
        F: FnMut(&Args) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut remaining = self.max_attempts();
        let mut fail_count = 0u32;

        loop {
            let result = op(args).await.map_err(RetryError::Operation)?;
            if validator(&result) {
                return Ok(result);
            }

            fail_count += 1;
            remaining -= 1;
            if remaining == 0 {
                tracing::warn!(operation = %name, args = ?args, fail_count, "retry attempts exhausted");
                return Err(RetryError::Exhausted {
                    operation: name.to_string(),
                    args: format!("{:?}", args),
                    fail_count,
                });
            }

            let wait = self.wait_time(fail_count, &mut rand::rng());
            tracing::debug!(
                operation = %name,
                fail_count,
                remaining,
                wait_ms = wait.as_millis() as u64,
                "result rejected by validator, retrying"
            );
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
    }
}
