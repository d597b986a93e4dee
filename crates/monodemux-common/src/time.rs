//! Rational timebases and timestamp conversion.
//!
//! Timestamps are integer tick counts in some timebase. Conversions between
//! timebases go through 128-bit integer arithmetic so that long files do not
//! accumulate floating point drift.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for "no timestamp / unknown duration".
///
/// Matches the engine convention (`AV_NOPTS_VALUE`).
pub const NO_TIMESTAMP: i64 = i64::MIN;

/// Map the [`NO_TIMESTAMP`] sentinel to `None`.
pub fn known(value: i64) -> Option<i64> {
    (value != NO_TIMESTAMP).then_some(value)
}

/// A rational number used as a timebase (seconds per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    /// Numerator.
    pub num: i32,
    /// Denominator.
    pub den: i32,
}

impl Rational {
    /// The caller-facing timebase: one tick per microsecond.
    pub const MICROSECONDS: Rational = Rational::new(1, 1_000_000);

    /// Create a new rational.
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Whether the rational can be used as a timebase.
    pub fn is_valid(&self) -> bool {
        self.num != 0 && self.den != 0
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::MICROSECONDS
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Convert `value` from the `from` timebase into the `to` timebase.
///
/// Computes `value * from.num * to.den / (from.den * to.num)` exactly and
/// rounds to the nearest tick, ties away from zero. Results outside the
/// `i64` range saturate. [`NO_TIMESTAMP`] passes through unchanged, and a
/// zero divisor yields [`NO_TIMESTAMP`].
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    if value == NO_TIMESTAMP {
        return NO_TIMESTAMP;
    }

    let mut numerator = i128::from(value) * i128::from(from.num) * i128::from(to.den);
    let mut denominator = i128::from(from.den) * i128::from(to.num);
    if denominator == 0 {
        return NO_TIMESTAMP;
    }
    if denominator < 0 {
        numerator = -numerator;
        denominator = -denominator;
    }

    let half = denominator / 2;
    let quotient = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    };

    // i64::MIN is reserved for the sentinel.
    quotient.clamp(i128::from(i64::MIN) + 1, i128::from(i64::MAX)) as i64
}

/// Convert a tick count in `from` into microseconds.
pub fn to_micros(value: i64, from: Rational) -> i64 {
    rescale(value, from, Rational::MICROSECONDS)
}

/// Convert microseconds into a tick count in `to`.
pub fn from_micros(micros: i64, to: Rational) -> i64 {
    rescale(micros, Rational::MICROSECONDS, to)
}
