//! Monotonic time for busy-polling loops.
//!
//! Every timing loop in the workspace measures against a [`Timestamp`]
//! captured from a [`Clock`]. Timestamps are opaque: the only thing you can
//! do with two of them is subtract, which yields elapsed microseconds.

use embedded_hal::delay::DelayNs;
use std::hint::spin_loop;
use std::ops::Sub;
use std::time::{Duration, Instant};

/// Microseconds in one second.
pub const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Delays shorter than this are spun instead of handed to the OS scheduler.
const SPIN_THRESHOLD: Duration = Duration::from_micros(200);

/// Opaque monotonic tick value with microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The clock origin.
    pub const ZERO: Self = Self(0);

    /// Build a timestamp from a raw microsecond tick. For clock implementors.
    #[must_use]
    pub const fn from_micros(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Microseconds from `earlier` to `self`, saturating at zero.
    #[must_use]
    pub const fn micros_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Sub for Timestamp {
    type Output = u64;

    fn sub(self, rhs: Timestamp) -> u64 {
        self.micros_since(rhs)
    }
}

/// Monotonic time source.
pub trait Clock {
    /// Read the current tick.
    fn now(&self) -> Timestamp;

    /// Microseconds elapsed since `since`.
    fn elapsed_micros(&self, since: Timestamp) -> u64 {
        self.now() - since
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Convert a [`Duration`] to whole microseconds, saturating.
#[must_use]
pub fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Convert a [`Duration`] to a `u32` microsecond count for `DelayNs::delay_us`.
#[must_use]
pub fn delay_micros(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

/// Seconds elapsed since `start`.
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_seconds<C: Clock + ?Sized>(clock: &C, start: Timestamp) -> f32 {
    clock.elapsed_micros(start) as f32 / MICROS_PER_SECOND
}

/// True once at least `window` has passed since `start`.
///
/// Loops bounded by a duration run `while !has_elapsed(..)`.
pub fn has_elapsed<C: Clock + ?Sized>(clock: &C, start: Timestamp, window: Duration) -> bool {
    clock.elapsed_micros(start) >= duration_micros(window)
}

/// Wall clock backed by [`Instant`].
///
/// Also implements [`DelayNs`]; short delays spin, longer ones sleep.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(duration_micros(self.origin.elapsed()))
    }
}

impl DelayNs for SystemClock {
    fn delay_ns(&mut self, ns: u32) {
        let wait = Duration::from_nanos(u64::from(ns));
        if wait < SPIN_THRESHOLD {
            let start = Instant::now();
            while start.elapsed() < wait {
                spin_loop();
            }
        } else {
            std::thread::sleep(wait);
        }
    }
}
