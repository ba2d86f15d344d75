// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in nanoseconds.
//!
//! [`HostTime`] is a point on the compositor's monotonic clock (e.g.
//! `CLOCK_MONOTONIC`), and [`Duration`] is a span on the same clock. Both are
//! plain nanosecond counts; the frame loop never reads a clock itself, callers
//! pass the current time into every operation that needs it.

use core::fmt;
use core::ops::{Add, Sub};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// A point in time in nanoseconds on the monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Creates a host time from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * NANOS_PER_MILLI)
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Creates a duration from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * NANOS_PER_MILLI)
    }

    /// Returns the whole number of milliseconds, truncating.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / NANOS_PER_MILLI
    }

    /// Returns `true` for a zero-length duration.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a rational factor `numer / denom` using a `u128`
    /// intermediate.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; scaled durations fit in u64"
    )]
    pub const fn mul_ratio(self, numer: u64, denom: u64) -> Self {
        assert!(denom != 0, "ratio denominator must not be zero");
        Self((self.0 as u128 * numer as u128 / denom as u128) as u64)
    }

    /// Clamps into `[min, max]`.
    #[inline]
    #[must_use]
    pub const fn clamp(self, min: Self, max: Self) -> Self {
        if self.0 < min.0 {
            min
        } else if self.0 > max.0 {
            max
        } else {
            self
        }
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_trip() {
        assert_eq!(Duration::from_millis(16).as_millis(), 16);
        assert_eq!(Duration(16_666_667).as_millis(), 16);
        assert_eq!(HostTime::from_millis(3), HostTime(3_000_000));
    }

    #[test]
    fn mul_ratio_scales() {
        let refresh = Duration(16_666_667);
        assert_eq!(refresh.mul_ratio(3, 2), Duration(25_000_000));
        assert_eq!(Duration::from_millis(200).mul_ratio(3, 4), Duration::from_millis(150));
    }

    #[test]
    fn clamp_limits_both_ends() {
        let lo = Duration::from_millis(200);
        let hi = Duration::from_millis(30_000);
        assert_eq!(Duration::from_millis(100).clamp(lo, hi), lo);
        assert_eq!(Duration::from_millis(60_000).clamp(lo, hi), hi);
        assert_eq!(Duration::from_millis(500).clamp(lo, hi), Duration::from_millis(500));
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).nanos(), 1200);
        assert_eq!(HostTime(1500) - t, Duration(500));
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
    }
}
