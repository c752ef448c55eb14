//! Error types for jitter.

/// Invalid arguments to the jitter primitive.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum JitterError {
    /// The jitter factor was below zero.
    #[error("jitter factor must not be negative, got {0}")]
    NegativeFactor(f64),

    /// The jitter factor was NaN or infinite.
    #[error("jitter factor must be a finite number, got {0}")]
    NonFiniteFactor(f64),

    /// The value to jitter was NaN or infinite.
    #[error("cannot jitter non-finite value {0}")]
    NonFiniteValue(f64),

    /// `|value| * factor` does not fit in an `f64`.
    #[error("jitter spread of {value} with factor {factor} overflows")]
    Spread {
        /// The value being jittered.
        value: f64,
        /// The requested factor.
        factor: f64,
    },
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_negative_factor_display() {
        let msg = JitterError::NegativeFactor(-0.5).to_string();
        assert!(msg.contains("must not be negative"));
        assert!(msg.contains("-0.5"));
    }

    #[test]
    fn test_non_finite_value_display() {
        let msg = JitterError::NonFiniteValue(f64::INFINITY).to_string();
        assert!(msg.contains("non-finite"));
        assert!(msg.contains("inf"));
    }

    #[test]
    fn test_spread_display() {
        let msg = JitterError::Spread {
            value: 1e308,
            factor: 10.0,
        }
        .to_string();
        assert!(msg.contains("overflows"));
    }
}
