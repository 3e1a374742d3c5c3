//! Echo width to distance conversion.
//!
//! Both factors encode the speed of sound in air for a round trip and are
//! fixed. Division truncates.

use serde::{Deserialize, Serialize};

/// Echo microseconds per inch of distance.
pub const MICROS_PER_INCH: u64 = 148;

/// Echo microseconds per centimeter of distance.
pub const MICROS_PER_CM: u64 = 58;

/// Distance in whole inches for an echo of `duration_us`.
#[must_use]
pub const fn distance_inches(duration_us: u64) -> u64 {
    duration_us / MICROS_PER_INCH
}

/// Distance in whole centimeters for an echo of `duration_us`.
#[must_use]
pub const fn distance_cm(duration_us: u64) -> u64 {
    duration_us / MICROS_PER_CM
}

/// A measured distance in both units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distance {
    /// Whole inches.
    pub inches: u64,
    /// Whole centimeters.
    pub centimeters: u64,
}

impl Distance {
    /// Convert an echo width.
    #[must_use]
    pub const fn from_echo_micros(duration_us: u64) -> Self {
        Self {
            inches: distance_inches(duration_us),
            centimeters: distance_cm(duration_us),
        }
    }
}
