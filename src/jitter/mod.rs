//! Cropped-normal jitter.
//!
//! [`jitter`] perturbs a value by an offset drawn from a normal distribution
//! centred on zero. The standard deviation is `|value| * factor / SIGMA_COUNT`
//! and draws whose magnitude reaches `SIGMA_COUNT` deviations are discarded
//! and redrawn, so the result always lies strictly inside
//! `value ± |value| * factor`. Out-of-range draws are resampled, never
//! clamped, so no probability mass piles up at the bounds.
//!
//! # Examples
//!
//! ```rust
//! use steadfast::jitter;
//!
//! let v = jitter(10.0, 0.5).unwrap();
//! assert!(v > 5.0 && v < 15.0);
//!
//! // Zero factor and zero base are no-ops
//! assert_eq!(jitter(10.0, 0.0).unwrap(), 10.0);
//! assert_eq!(jitter(0.0, 1.0).unwrap(), 0.0);
//! ```
//!
//! The [`Jittered`] and [`JitterArgs`] wrappers apply the same primitive to an
//! operation's result or to its numeric arguments.

mod error;
mod ops;

pub use error::JitterError;
pub use ops::{JitterArgs, Jittered};

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Number of standard deviations between the mean and the crop bound.
///
/// Fixed: tune the jitter factor instead. With a factor of 1, about 99.99% of
/// raw draws already land inside the bound, so resampling is rare.
pub const SIGMA_COUNT: f64 = 4.0;

/// Jitter `value` by up to `± |value| * factor` using the thread-local RNG.
///
/// Returns `value` unchanged when `factor` is zero or `value` is zero.
///
/// # Errors
///
/// Fails when `factor` is negative or either argument is NaN or infinite.
pub fn jitter(value: f64, factor: f64) -> Result<f64, JitterError> {
    jitter_with(&mut rand::rng(), value, factor)
}

/// Like [`jitter`], drawing from the given RNG.
///
/// ```rust
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use steadfast::jitter::jitter_with;
///
/// let mut a = StdRng::seed_from_u64(7);
/// let mut b = StdRng::seed_from_u64(7);
/// assert_eq!(
///     jitter_with(&mut a, 3.0, 1.0).unwrap(),
///     jitter_with(&mut b, 3.0, 1.0).unwrap(),
/// );
/// ```
pub fn jitter_with<R>(rng: &mut R, value: f64, factor: f64) -> Result<f64, JitterError>
where
    R: Rng + ?Sized,
{
    check_factor(factor)?;
    if !value.is_finite() {
        return Err(JitterError::NonFiniteValue(value));
    }
    Ok(value + offset(rng, value, factor)?)
}

pub(crate) fn check_factor(factor: f64) -> Result<(), JitterError> {
    if !factor.is_finite() {
        return Err(JitterError::NonFiniteFactor(factor));
    }
    if factor < 0.0 {
        return Err(JitterError::NegativeFactor(factor));
    }
    Ok(())
}

/// Draw the jitter offset for `value`. Arguments must already be validated.
pub(crate) fn offset<R>(rng: &mut R, value: f64, factor: f64) -> Result<f64, JitterError>
where
    R: Rng + ?Sized,
{
    if factor == 0.0 || value == 0.0 {
        return Ok(0.0);
    }

    let std_dev = value.abs() * factor / SIGMA_COUNT;
    if std_dev == 0.0 {
        // Underflow: every draw would be 0 and rejected forever.
        return Ok(0.0);
    }
    let bound = std_dev * SIGMA_COUNT;
    if !bound.is_finite() {
        return Err(JitterError::Spread { value, factor });
    }
    let normal = Normal::new(0.0, std_dev).map_err(|_| JitterError::Spread { value, factor })?;

    loop {
        let draw = normal.sample(rng);
        if draw.abs() < bound {
            return Ok(draw);
        }
    }
}
