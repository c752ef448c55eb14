//! The `Operation` trait shared by every wrapper in the crate.
//!
//! An operation is a named, fallible computation over borrowed arguments.
//! Wrappers such as [`Retry`](crate::Retry) and [`Cache`](crate::Cache) are
//! operations themselves, so they compose by nesting:
//!
//! ```rust
//! use steadfast::{from_fn, Operation, Retry, RetryPolicy};
//! use std::convert::Infallible;
//!
//! let mut calls = 0;
//! let op = from_fn("count_up", move |_: &()| {
//!     calls += 1;
//!     Ok::<_, Infallible>(calls)
//! });
//!
//! let policy = RetryPolicy::new().with_max_attempts(5);
//! let mut retried = Retry::new(op, |n: &i32| *n >= 3, policy).unwrap();
//!
//! assert_eq!(retried.call(&()).unwrap(), 3);
//! ```

use std::fmt;

/// A named, fallible computation.
///
/// `name` identifies the operation in error messages and, for cached
/// operations, in storage file names. It should be stable across runs.
pub trait Operation<Args> {
    /// The value produced on success.
    type Output;
    /// The error produced when the computation itself fails.
    type Error;

    /// The operation's identity.
    fn name(&self) -> &str;

    /// Run the computation once.
    fn call(&mut self, args: &Args) -> Result<Self::Output, Self::Error>;
}

/// An operation built from a closure. Created by [`from_fn`].
pub struct FnOperation<F> {
    name: String,
    f: F,
}

impl<F> FnOperation<F> {
    /// The name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Create a named operation from a closure.
///
/// # Examples
///
/// ```rust
/// use steadfast::{from_fn, Operation};
///
/// let mut add = from_fn("add", |(a, b): &(i32, i32)| Ok::<_, String>(a + b));
/// assert_eq!(add.call(&(2, 3)), Ok(5));
/// ```
pub fn from_fn<Args, T, E, F>(name: impl Into<String>, f: F) -> FnOperation<F>
where
    F: FnMut(&Args) -> Result<T, E>,
{
    FnOperation {
        name: name.into(),
        f,
    }
}

impl<Args, T, E, F> Operation<Args> for FnOperation<F>
where
    F: FnMut(&Args) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn call(&mut self, args: &Args) -> Result<T, E> {
        (self.f)(args)
    }
}

impl<Args, Op> Operation<Args> for &mut Op
where
    Op: Operation<Args> + ?Sized,
{
    type Output = Op::Output;
    type Error = Op::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn call(&mut self, args: &Args) -> Result<Self::Output, Self::Error> {
        (**self).call(args)
    }
}
