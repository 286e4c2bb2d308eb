//! Instants used to evaluate date-dependent frames.
//!
//! The graph never interprets the time scale of a date: it only hands dates to
//! the frame models, which agree with their caller on the scale in use.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SEC: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SEC;

/// An instant, stored as signed nanoseconds since the J2000.0 epoch
/// (2000-01-01T12:00:00 in the scale chosen by the caller).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct AbsoluteDate {
    nanos: i128,
}

impl AbsoluteDate {
    /// The J2000.0 reference epoch.
    pub const J2000_EPOCH: AbsoluteDate = AbsoluteDate { nanos: 0 };

    pub const fn from_j2000_nanos(nanos: i128) -> Self {
        Self { nanos }
    }

    pub fn from_j2000_seconds(seconds: f64) -> Self {
        Self {
            nanos: (seconds * NANOS_PER_SEC as f64).round() as i128,
        }
    }

    pub fn from_j2000_days(days: f64) -> Self {
        Self {
            nanos: (days * NANOS_PER_DAY as f64).round() as i128,
        }
    }

    pub const fn j2000_nanos(&self) -> i128 {
        self.nanos
    }

    /// Seconds elapsed since J2000.0 (negative before the epoch).
    pub fn j2000_seconds(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_SEC as f64
    }

    /// Julian centuries since J2000.0, the usual argument of precession and
    /// nutation series.
    pub fn j2000_centuries(&self) -> f64 {
        self.nanos as f64 / (36_525.0 * NANOS_PER_DAY as f64)
    }

    /// A new date shifted by `seconds` (may be negative).
    pub fn shifted_by(&self, seconds: f64) -> Self {
        Self {
            nanos: self.nanos + (seconds * NANOS_PER_SEC as f64).round() as i128,
        }
    }

    /// Signed duration in seconds from `other` to `self`.
    pub fn duration_from(&self, other: &AbsoluteDate) -> f64 {
        (self.nanos - other.nanos) as f64 / NANOS_PER_SEC as f64
    }
}

impl fmt::Display for AbsoluteDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.nanos < 0 { "-" } else { "+" };
        let abs = self.nanos.unsigned_abs();
        let secs = abs / NANOS_PER_SEC as u128;
        let frac = abs % NANOS_PER_SEC as u128;
        write!(f, "J2000{sign}{secs}.{frac:09}s")
    }
}
