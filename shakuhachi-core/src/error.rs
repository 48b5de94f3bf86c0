//! Error types for the hole-position solver.

use thiserror::Error;

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors raised for invalid call patterns.
///
/// Infeasible instruments (a hole that lands above the blowing end or past the
/// foot) are not errors: they are flagged on the individual `HolePosition`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// A parameter lies outside its documented range.
    #[error("{field} = {value} is outside the range {min}..={max}")]
    OutOfRange {
        /// Parameter name.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// A length or diameter is zero, negative, or not a number.
    #[error("{field} must be a positive finite number, got {value}")]
    Degenerate {
        /// Parameter name.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// No registered style carries this key.
    #[error("unknown style: {0}")]
    UnknownStyle(String),

    /// The algebraic chain needs intervals that rise above unison, hole by hole.
    #[error("interval {index} does not rise above the previous hole")]
    NonIncreasingIntervals {
        /// Index of the offending interval, counted from the bottom hole.
        index: usize,
    },

    /// The forward solver ended up with an acoustic length it cannot divide by.
    #[error("acoustic length {length_m} m is too short to resonate")]
    AcousticLength {
        /// Corrected acoustic length in metres.
        length_m: f64,
    },
}

impl SolverError {
    /// Checks that `value` is finite and strictly positive.
    pub fn ensure_positive(field: &'static str, value: f64) -> SolverResult<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::Degenerate { field, value })
        }
    }

    /// Checks that `value` is finite and inside `min..=max`.
    pub fn ensure_range(field: &'static str, value: f64, min: f64, max: f64) -> SolverResult<f64> {
        if !value.is_finite() {
            return Err(Self::Degenerate { field, value });
        }
        if value < min || value > max {
            return Err(Self::OutOfRange { field, value, min, max });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_positive_rejects_zero_and_nan() {
        assert!(SolverError::ensure_positive("length", 0.0).is_err());
        assert!(SolverError::ensure_positive("length", -3.0).is_err());
        assert!(SolverError::ensure_positive("length", f64::NAN).is_err());
        assert_eq!(SolverError::ensure_positive("length", 1.5), Ok(1.5));
    }

    #[test]
    fn ensure_range_reports_bounds() {
        let err = SolverError::ensure_range("temperature", 60.0, -10.0, 50.0).unwrap_err();
        assert_eq!(
            err,
            SolverError::OutOfRange { field: "temperature", value: 60.0, min: -10.0, max: 50.0 }
        );
        assert_eq!(err.to_string(), "temperature = 60 is outside the range -10..=50");
    }
}
