//! Operation wrappers that jitter results or arguments.

use crate::jitter::{check_factor, offset, JitterError};
use crate::Operation;

/// Jitters the `f64` result of an operation.
///
/// # Examples
///
/// ```rust
/// use steadfast::{from_fn, JitterError, Jittered, Operation};
///
/// let slope = from_fn("slope", |x: &f64| Ok::<_, JitterError>(-0.25 * x));
/// let mut noisy = Jittered::new(slope, 0.5).unwrap();
///
/// let y = noisy.call(&8.0).unwrap();
/// assert!(y > -3.0 && y < -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Jittered<Op> {
    inner: Op,
    factor: f64,
}

impl<Op> Jittered<Op> {
    /// Wrap `inner`, jittering each result by `factor`.
    ///
    /// # Errors
    ///
    /// Fails if `factor` is negative or not finite.
    pub fn new(inner: Op, factor: f64) -> Result<Self, JitterError> {
        check_factor(factor)?;
        Ok(Self { inner, factor })
    }

    /// The jitter factor applied to results.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Unwrap the inner operation.
    pub fn into_inner(self) -> Op {
        self.inner
    }
}

impl<Args, Op> Operation<Args> for Jittered<Op>
where
    Op: Operation<Args, Output = f64>,
    Op::Error: From<JitterError>,
{
    type Output = f64;
    type Error = Op::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&mut self, args: &Args) -> Result<f64, Op::Error> {
        let value = self.inner.call(args)?;
        if !value.is_finite() {
            return Err(JitterError::NonFiniteValue(value).into());
        }
        Ok(value + offset(&mut rand::rng(), value, self.factor)?)
    }
}

/// Jitters the numeric arguments of an operation before calling it.
///
/// The i-th factor applies to the i-th argument. A negative factor leaves its
/// argument untouched, surplus factors are ignored, and arguments past the
/// last factor pass through unchanged.
///
/// # Examples
///
/// ```rust
/// use steadfast::{from_fn, JitterArgs, JitterError, Operation};
///
/// let echo = from_fn("echo", |xs: &Vec<f64>| Ok::<_, JitterError>(xs.clone()));
/// let mut wrapped = JitterArgs::new(echo, vec![0.0, -1.0, 0.5]);
///
/// let seen = wrapped.call(&vec![1.0, 2.0, 10.0, 4.0]).unwrap();
/// assert_eq!(seen[0], 1.0); // factor 0
/// assert_eq!(seen[1], 2.0); // negative factor skips
/// assert!(seen[2] > 5.0 && seen[2] < 15.0);
/// assert_eq!(seen[3], 4.0); // no factor
/// ```
#[derive(Debug, Clone)]
pub struct JitterArgs<Op> {
    inner: Op,
    factors: Vec<f64>,
}

impl<Op> JitterArgs<Op> {
    /// Wrap `inner` with per-argument jitter factors.
    pub fn new(inner: Op, factors: Vec<f64>) -> Self {
        Self { inner, factors }
    }

    /// The per-argument factors.
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Unwrap the inner operation.
    pub fn into_inner(self) -> Op {
        self.inner
    }

    fn jitter_all(&self, args: &mut [f64]) -> Result<(), JitterError> {
        let mut rng = rand::rng();
        for (arg, &factor) in args.iter_mut().zip(&self.factors) {
            if factor < 0.0 {
                continue;
            }
            check_factor(factor)?;
            if !arg.is_finite() {
                return Err(JitterError::NonFiniteValue(*arg));
            }
            *arg += offset(&mut rng, *arg, factor)?;
        }
        Ok(())
    }
}

impl<Op> Operation<Vec<f64>> for JitterArgs<Op>
where
    Op: Operation<Vec<f64>>,
    Op::Error: From<JitterError>,
{
    type Output = Op::Output;
    type Error = Op::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&mut self, args: &Vec<f64>) -> Result<Op::Output, Op::Error> {
        let mut jittered = args.clone();
        self.jitter_all(&mut jittered)?;
        self.inner.call(&jittered)
    }
}

impl<const N: usize, Op> Operation<[f64; N]> for JitterArgs<Op>
where
    Op: Operation<[f64; N]>,
    Op::Error: From<JitterError>,
{
    type Output = Op::Output;
    type Error = Op::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&mut self, args: &[f64; N]) -> Result<Op::Output, Op::Error> {
        let mut jittered = *args;
        self.jitter_all(&mut jittered)?;
        self.inner.call(&jittered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_fn;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Jitter(JitterError),
    }

    impl From<JitterError> for TestError {
        fn from(e: JitterError) -> Self {
            TestError::Jitter(e)
        }
    }

    #[test]
    fn test_jittered_rejects_negative_factor() {
        let op = from_fn("f", |_: &()| Ok::<_, TestError>(1.0));
        assert!(matches!(
            Jittered::new(op, -1.0),
            Err(JitterError::NegativeFactor(_))
        ));
    }

    #[test]
    fn test_jittered_result_within_bound() {
        let op = from_fn("cube", |x: &f64| Ok::<_, TestError>(0.0027 * x.powi(3)));
        let mut wrapped = Jittered::new(op, 1.0).unwrap();
        for _ in 0..500 {
            let y = wrapped.call(&10.0).unwrap();
            assert!(y > 0.0 && y < 5.4, "{y} escaped");
        }
    }

    #[test]
    fn test_jittered_zero_factor_is_passthrough() {
        let op = from_fn("id", |x: &f64| Ok::<_, TestError>(*x));
        let mut wrapped = Jittered::new(op, 0.0).unwrap();
        assert_eq!(wrapped.call(&3.5), Ok(3.5));
    }

    #[test]
    fn test_jittered_non_finite_result_is_error() {
        let op = from_fn("inf", |_: &()| Ok::<_, TestError>(f64::INFINITY));
        let mut wrapped = Jittered::new(op, 0.5).unwrap();
        assert_eq!(
            wrapped.call(&()),
            Err(TestError::Jitter(JitterError::NonFiniteValue(f64::INFINITY)))
        );
    }

    #[test]
    fn test_jittered_propagates_inner_error() {
        let op = from_fn("bad", |_: &()| {
            Err::<f64, _>(TestError::Jitter(JitterError::NegativeFactor(-2.0)))
        });
        let mut wrapped = Jittered::new(op, 0.5).unwrap();
        assert!(wrapped.call(&()).is_err());
    }

    #[test]
    fn test_jitter_args_array() {
        let op = from_fn("echo", |xs: &[f64; 3]| Ok::<_, TestError>(*xs));
        let mut wrapped = JitterArgs::new(op, vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        for _ in 0..200 {
            let seen = wrapped.call(&[10.0, 10.0, 0.0]).unwrap();
            assert!(seen[0] > 0.0 && seen[0] < 20.0);
            assert!(seen[1] > 0.0 && seen[1] < 20.0);
            assert_eq!(seen[2], 0.0);
        }
    }

    #[test]
    fn test_jitter_args_leaves_caller_args_untouched() {
        let op = from_fn("echo", |xs: &Vec<f64>| Ok::<_, TestError>(xs.clone()));
        let mut wrapped = JitterArgs::new(op, vec![1.0]);
        let args = vec![10.0];
        let _ = wrapped.call(&args).unwrap();
        assert_eq!(args, vec![10.0]);
    }

    #[test]
    fn test_jitter_args_non_finite_arg_is_error() {
        let op = from_fn("echo", |xs: &Vec<f64>| Ok::<_, TestError>(xs.clone()));
        let mut wrapped = JitterArgs::new(op, vec![1.0]);
        assert!(matches!(
            wrapped.call(&vec![f64::NAN]),
            Err(TestError::Jitter(JitterError::NonFiniteValue(_)))
        ));
    }

    #[test]
    fn test_jitter_args_exposes_factors() {
        let op = from_fn("echo", |xs: &Vec<f64>| Ok::<_, TestError>(xs.clone()));
        let wrapped = JitterArgs::new(op, vec![0.5, -1.0]);
        assert_eq!(wrapped.factors(), &[0.5, -1.0]);
    }
}
