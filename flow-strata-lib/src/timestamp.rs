//! Capture time
//!
//! Flows age by capture time, never by wall clock, so replaying a trace gives
//! the same evictions no matter how fast it is read.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Add, Sub},
};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds since the Unix epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Timestamp(0);

    #[inline]
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// From a seconds/microseconds pair, as in legacy pcap records
    #[inline]
    pub fn from_micros_parts(secs: u32, micros: u32) -> Self {
        Self(secs as u64 * NANOS_PER_SEC + micros as u64 * 1_000)
    }

    #[inline]
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / NANOS_PER_SEC;
        let nanos = self.0 % NANOS_PER_SEC;

        if !f.alternate() {
            if let Some(date_time) = DateTime::from_timestamp(secs as i64, nanos as u32) {
                return write!(f, "{}", date_time.format("%Y-%m-%d %H:%M:%S%.6f UTC"));
            }
        }

        write!(f, "{secs}.{nanos:09}")
    }
}

/// Signed nanoseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Interval(pub i64);

impl Interval {
    pub const ZERO: Self = Interval(0);

    #[inline]
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        Self((secs.saturating_mul(NANOS_PER_SEC)).min(i64::MAX as u64) as i64)
    }

    #[inline]
    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:09}", total / NANOS_PER_SEC, total % NANOS_PER_SEC)
    }
}

impl Add<Interval> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: Interval) -> Self::Output {
        Timestamp(self.0.saturating_add_signed(rhs.0))
    }
}

impl Sub<Interval> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn sub(self, rhs: Interval) -> Self::Output {
        Timestamp(self.0.saturating_sub_signed(rhs.0))
    }
}

impl Sub for Timestamp {
    type Output = Interval;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        if self.0 >= rhs.0 {
            Interval((self.0 - rhs.0) as i64)
        } else {
            Interval(-((rhs.0 - self.0) as i64))
        }
    }
}
