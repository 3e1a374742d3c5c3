//! Simulated hardware for host-side runs and deterministic tests.
//!
//! All simulated devices are single-threaded and share state through
//! `Rc<Cell<_>>`. Time only moves when someone advances the
//! [`VirtualClock`], either explicitly, through a `DelayNs` call, or through
//! the optional per-read auto-advance.

use crate::time::{Clock, Timestamp};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

/// Echo microseconds per centimeter of target distance (round trip).
const ECHO_US_PER_CM: u64 = 58;

/// Shared virtual microsecond counter.
///
/// Clones share the same counter. Delays advance it by the requested amount.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    ticks: Rc<Cell<u64>>,
    auto_advance: u64,
}

impl VirtualClock {
    /// Create a clock at tick zero that only moves when advanced.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that advances by `micros` after every `now()` read.
    ///
    /// Needed for loops that poll without ever sleeping.
    #[must_use]
    pub fn with_auto_advance(micros: u64) -> Self {
        Self {
            ticks: Rc::default(),
            auto_advance: micros,
        }
    }

    /// Move time forward.
    pub fn advance(&self, micros: u64) {
        self.ticks.set(self.ticks.get().saturating_add(micros));
    }

    /// Current tick without triggering auto-advance.
    #[must_use]
    pub fn peek(&self) -> Timestamp {
        Timestamp::from_micros(self.ticks.get())
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Timestamp {
        let now = self.peek();
        self.advance(self.auto_advance);
        now
    }
}

impl DelayNs for VirtualClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns).div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms) * 1_000);
    }
}

/// Input pin replaying a fixed sample sequence, then reading low forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    samples: VecDeque<bool>,
    reads: usize,
}

impl ScriptedInput {
    /// Create a pin that yields `samples` in order.
    pub fn new(samples: impl IntoIterator<Item = bool>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            reads: 0,
        }
    }

    /// Samples not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    /// Total number of reads, including reads past the end of the script.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl ErrorType for ScriptedInput {
    type Error = Infallible;
}

impl InputPin for ScriptedInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.reads += 1;
        Ok(self.samples.pop_front().unwrap_or(false))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Input pin that is high for `high_us` out of every `period_us`.
///
/// Stands in for a modulated infrared receiver.
#[derive(Debug, Clone)]
pub struct SquareWave<C> {
    clock: C,
    period_us: u64,
    high_us: u64,
}

impl<C: Clock> SquareWave<C> {
    /// Create a square wave. A zero period reads permanently low.
    pub fn new(clock: C, period_us: u64, high_us: u64) -> Self {
        Self {
            clock,
            period_us,
            high_us,
        }
    }

    /// Number of rising edges the wave produces in `[0, until_us)`.
    #[must_use]
    pub fn edges_before(&self, until_us: u64) -> u64 {
        if self.period_us == 0 || self.high_us == 0 {
            return 0;
        }
        until_us.div_ceil(self.period_us)
    }
}

impl<C> ErrorType for SquareWave<C> {
    type Error = Infallible;
}

impl<C: Clock> InputPin for SquareWave<C> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.period_us == 0 {
            return Ok(false);
        }
        let t = self.clock.now() - Timestamp::ZERO;
        Ok(t % self.period_us < self.high_us)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

#[derive(Debug, Default)]
struct RangerState {
    trigger_high: Cell<bool>,
    last_fall: Cell<Option<Timestamp>>,
    pulses: Cell<u32>,
    latency_us: Cell<u64>,
    echo_width_us: Cell<Option<u64>>,
}

/// Ultrasonic ranger with a trigger input and an echo output.
///
/// The echo goes high `latency_us` after the trigger's falling edge and
/// stays high for the configured echo width. With no echo width the echo
/// never rises.
#[derive(Debug, Clone)]
pub struct SimulatedRanger<C> {
    clock: C,
    state: Rc<RangerState>,
}

impl<C: Clock + Clone> SimulatedRanger<C> {
    /// Create a ranger with an explicit echo width.
    pub fn new(clock: C, latency_us: u64, echo_width_us: Option<u64>) -> Self {
        let state = RangerState::default();
        state.latency_us.set(latency_us);
        state.echo_width_us.set(echo_width_us);
        Self {
            clock,
            state: Rc::new(state),
        }
    }

    /// Create a ranger facing a target `distance_cm` away.
    ///
    /// The echo width sits in the middle of that centimeter so polling
    /// jitter does not flip the reading to a neighbour. Targets too far to
    /// represent saturate to an echo that never ends.
    pub fn with_distance_cm(clock: C, latency_us: u64, distance_cm: u64) -> Self {
        let width = distance_cm
            .saturating_mul(ECHO_US_PER_CM)
            .saturating_add(ECHO_US_PER_CM / 2);
        Self::new(clock, latency_us, Some(width))
    }

    /// Change the echo width for subsequent triggers.
    pub fn set_echo_width(&self, echo_width_us: Option<u64>) {
        self.state.echo_width_us.set(echo_width_us);
    }

    /// Number of complete trigger pulses seen so far.
    #[must_use]
    pub fn trigger_count(&self) -> u32 {
        self.state.pulses.get()
    }

    /// The pin wired to the sensor's trigger input.
    #[must_use]
    pub fn trigger_pin(&self) -> RangerTrigger<C> {
        RangerTrigger {
            clock: self.clock.clone(),
            state: Rc::clone(&self.state),
        }
    }

    /// The pin wired to the sensor's echo output.
    #[must_use]
    pub fn echo_pin(&self) -> RangerEcho<C> {
        RangerEcho {
            clock: self.clock.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

/// Trigger side of a [`SimulatedRanger`].
#[derive(Debug)]
pub struct RangerTrigger<C> {
    clock: C,
    state: Rc<RangerState>,
}

impl<C> ErrorType for RangerTrigger<C> {
    type Error = Infallible;
}

impl<C: Clock> OutputPin for RangerTrigger<C> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.state.trigger_high.replace(false) {
            self.state.last_fall.set(Some(self.clock.now()));
            self.state.pulses.set(self.state.pulses.get() + 1);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.trigger_high.set(true);
        Ok(())
    }
}

/// Echo side of a [`SimulatedRanger`].
#[derive(Debug)]
pub struct RangerEcho<C> {
    clock: C,
    state: Rc<RangerState>,
}

impl<C> ErrorType for RangerEcho<C> {
    type Error = Infallible;
}

impl<C: Clock> InputPin for RangerEcho<C> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let (Some(fall), Some(width)) = (
            self.state.last_fall.get(),
            self.state.echo_width_us.get(),
        ) else {
            return Ok(false);
        };
        let since_fall = self.clock.now() - fall;
        let rise = self.state.latency_us.get();
        Ok(since_fall >= rise && since_fall < rise.saturating_add(width))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
