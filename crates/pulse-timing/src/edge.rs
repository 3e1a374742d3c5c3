//! Debounced rising-edge counting.
//!
//! An edge is a FALSE→TRUE transition between two consecutive samples. A
//! level that stays high across many polls is one edge, not many. The
//! assumed sample before the first poll is FALSE, so an input that is
//! already high when counting starts contributes one edge.

use embedded_hal::digital::InputPin;
use pulse_common::{duration_micros, has_elapsed, Clock, PulseError, PulseResult};
use std::time::Duration;
use tracing::{debug, trace};

/// Rising-edge counter state.
///
/// # Example
///
/// ```
/// use pulse_timing::edge::EdgeCounter;
///
/// let mut counter = EdgeCounter::new();
///
/// // Rising edge
/// assert!(counter.poll(true));
///
/// // Still high - no edge
/// assert!(!counter.poll(true));
///
/// // Falls, then rises again
/// assert!(!counter.poll(false));
/// assert!(counter.poll(true));
///
/// assert_eq!(counter.count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCounter {
    /// Sample seen on the previous poll.
    previous_sample: bool,
    /// Rising edges seen so far.
    count: u32,
}

impl EdgeCounter {
    /// Create a counter with no edges and a low previous sample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample.
    ///
    /// # Returns
    ///
    /// `true` if this sample completed a rising edge.
    pub fn poll(&mut self, sample: bool) -> bool {
        let edge = sample && !self.previous_sample;
        if edge {
            self.count = self.count.saturating_add(1);
        }
        self.previous_sample = sample;
        edge
    }

    /// Rising edges counted so far.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The last sample fed to the counter.
    #[must_use]
    pub fn previous_sample(&self) -> bool {
        self.previous_sample
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        self.previous_sample = false;
        self.count = 0;
    }

    /// Poll `input` without pausing until `window` has elapsed.
    ///
    /// State carries over from earlier windows, so a caller can split a long
    /// count into short windows (to refresh a display, say) without counting
    /// a level that spans two windows twice.
    ///
    /// # Returns
    ///
    /// Edges counted during this window.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Pin`] if the input cannot be read.
    pub fn run_for<C, P>(&mut self, clock: &C, input: &mut P, window: Duration) -> PulseResult<u32>
    where
        C: Clock + ?Sized,
        P: InputPin,
    {
        let before = self.count;
        let start = clock.now();
        while !has_elapsed(clock, start, window) {
            let sample = input.is_high().map_err(|e| PulseError::pin(&e))?;
            if self.poll(sample) {
                trace!(count = self.count, "Rising edge");
            }
        }
        Ok(self.count - before)
    }
}

/// Count rising edges on `input` over `window`, starting from a fresh state.
///
/// # Errors
///
/// Returns [`PulseError::Pin`] if the input cannot be read.
pub fn count_edges<C, P>(clock: &C, input: &mut P, window: Duration) -> PulseResult<u32>
where
    C: Clock + ?Sized,
    P: InputPin,
{
    let mut counter = EdgeCounter::new();
    let edges = counter.run_for(clock, input, window)?;
    debug!(edges, window_us = duration_micros(window), "Edge window complete");
    Ok(edges)
}

/// Count rising edges in an in-memory sample sequence.
pub fn count_rising_edges<I>(samples: I) -> u32
where
    I: IntoIterator<Item = bool>,
{
    let mut counter = EdgeCounter::new();
    for sample in samples {
        counter.poll(sample);
    }
    counter.count()
}
