//! Echo-ranging pulse measurement.
//!
//! One measurement walks through three phases:
//!
//! ```text
//!            +--+
//! TRIG       |  |
//!        ----+  +--------------------------------------
//!              20us
//!                      +--------------------+
//! ECHO                 |                    |
//!        --------------+                    +----------
//!               |<---->|<------------------>|
//!              AwaitRise     MeasureWidth
//!           (rise_timeout)  (width_timeout)
//! ```
//!
//! [`EchoRanging`] is the pure state machine: it is fed the time spent in
//! the current phase plus the echo level, and decides what happens next.
//! [`measure_echo`] drives it against real (or simulated) pins.

use crate::distance::Distance;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use pulse_common::{
    delay_micros, duration_micros, Clock, EchoConfig, PulseError, PulseResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

/// Phase of an echo measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EchoPhase {
    /// Waiting to fire the trigger pulse.
    #[default]
    Trigger,
    /// Trigger sent, waiting for the echo to go high.
    AwaitRise,
    /// Echo is high, timing its width.
    MeasureWidth,
}

impl fmt::Display for EchoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trigger => write!(f, "trigger"),
            Self::AwaitRise => write!(f, "await-rise"),
            Self::MeasureWidth => write!(f, "measure-width"),
        }
    }
}

/// The phase in which a measurement gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPhase {
    /// The echo never went high.
    AwaitRise,
    /// The echo stayed high too long.
    MeasureWidth,
}

impl TimeoutPhase {
    /// Short numeric code shown on the robot's display (`fail 1`, `fail 2`).
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::AwaitRise => 1,
            Self::MeasureWidth => 2,
        }
    }
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitRise => write!(f, "await-rise"),
            Self::MeasureWidth => write!(f, "measure-width"),
        }
    }
}

/// Outcome of one echo measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseMeasurement {
    /// A phase exceeded its timeout. Non-fatal; retry on the next trigger.
    TimedOut {
        /// Which phase gave up.
        phase: TimeoutPhase,
    },
    /// The echo was high for `duration_us` microseconds.
    Completed {
        /// Echo width.
        duration_us: u64,
    },
}

impl PulseMeasurement {
    /// Echo width if the measurement completed.
    #[must_use]
    pub fn duration_us(&self) -> Option<u64> {
        match self {
            Self::Completed { duration_us } => Some(*duration_us),
            Self::TimedOut { .. } => None,
        }
    }

    /// Distance if the measurement completed.
    #[must_use]
    pub fn distance(&self) -> Option<Distance> {
        self.duration_us().map(Distance::from_echo_micros)
    }

    /// True for either timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// What the driver should do after a [`EchoRanging::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoStep {
    /// Stay in the current phase; wait one poll interval and sample again.
    Continue,
    /// A new phase started; restart the phase timer and sample again.
    Enter(EchoPhase),
    /// The measurement is over.
    Finished(PulseMeasurement),
}

/// Echo-ranging state machine.
///
/// Timeouts fire only when the time in phase is strictly greater than the
/// limit, and are checked before the sample: a sample taken after the limit
/// has passed never rises or completes a measurement. After a finished measurement the machine is back in
/// [`EchoPhase::Trigger`] and can be reused.
///
/// # Example
///
/// ```
/// use pulse_timing::echo::{EchoPhase, EchoRanging, EchoStep, PulseMeasurement};
///
/// let mut ranging = EchoRanging::new(1_000, 100_000);
/// assert_eq!(ranging.trigger_sent(), EchoStep::Enter(EchoPhase::AwaitRise));
///
/// // Echo still low
/// assert_eq!(ranging.step(200, false), EchoStep::Continue);
///
/// // Echo rises - phase timer restarts
/// assert_eq!(ranging.step(250, true), EchoStep::Enter(EchoPhase::MeasureWidth));
///
/// // Echo falls 3 ms later
/// assert_eq!(
///     ranging.step(3_000, false),
///     EchoStep::Finished(PulseMeasurement::Completed { duration_us: 3_000 })
/// );
/// assert_eq!(ranging.phase(), EchoPhase::Trigger);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoRanging {
    phase: EchoPhase,
    rise_timeout_us: u64,
    width_timeout_us: u64,
}

impl EchoRanging {
    /// Create a machine with explicit timeouts in microseconds.
    #[must_use]
    pub fn new(rise_timeout_us: u64, width_timeout_us: u64) -> Self {
        Self {
            phase: EchoPhase::Trigger,
            rise_timeout_us,
            width_timeout_us,
        }
    }

    /// Create a machine from configured timeouts.
    #[must_use]
    pub fn from_config(config: &EchoConfig) -> Self {
        Self::new(
            duration_micros(config.rise_timeout),
            duration_micros(config.width_timeout),
        )
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> EchoPhase {
        self.phase
    }

    /// Record that the trigger pulse has been sent.
    ///
    /// Always succeeds; calling it mid-measurement starts over.
    pub fn trigger_sent(&mut self) -> EchoStep {
        self.phase = EchoPhase::AwaitRise;
        EchoStep::Enter(EchoPhase::AwaitRise)
    }

    /// Advance the machine by one sample.
    ///
    /// # Arguments
    ///
    /// * `elapsed_us` - Time spent in the current phase.
    /// * `echo_high` - Current echo level.
    pub fn step(&mut self, elapsed_us: u64, echo_high: bool) -> EchoStep {
        match self.phase {
            // Nothing to sample until the trigger has fired
            EchoPhase::Trigger => EchoStep::Continue,
            EchoPhase::AwaitRise => {
                if elapsed_us > self.rise_timeout_us {
                    self.finish(PulseMeasurement::TimedOut {
                        phase: TimeoutPhase::AwaitRise,
                    })
                } else if echo_high {
                    self.phase = EchoPhase::MeasureWidth;
                    EchoStep::Enter(EchoPhase::MeasureWidth)
                } else {
                    EchoStep::Continue
                }
            }
            EchoPhase::MeasureWidth => {
                if elapsed_us > self.width_timeout_us {
                    self.finish(PulseMeasurement::TimedOut {
                        phase: TimeoutPhase::MeasureWidth,
                    })
                } else if !echo_high {
                    self.finish(PulseMeasurement::Completed {
                        duration_us: elapsed_us,
                    })
                } else {
                    EchoStep::Continue
                }
            }
        }
    }

    /// Abandon any measurement in progress.
    pub fn reset(&mut self) {
        self.phase = EchoPhase::Trigger;
    }

    fn finish(&mut self, measurement: PulseMeasurement) -> EchoStep {
        self.phase = EchoPhase::Trigger;
        EchoStep::Finished(measurement)
    }
}

/// Drive `trigger` high for `pulse_us`, then low.
///
/// # Errors
///
/// Returns [`PulseError::Pin`] if the output cannot be driven.
pub fn send_trigger<T, D>(trigger: &mut T, delay: &mut D, pulse_us: u32) -> PulseResult<()>
where
    T: OutputPin,
    D: DelayNs,
{
    trigger.set_high().map_err(|e| PulseError::pin(&e))?;
    delay.delay_us(pulse_us);
    trigger.set_low().map_err(|e| PulseError::pin(&e))
}

/// Run one complete echo measurement.
///
/// Fires the trigger, then polls `echo` every `config.poll_interval` until
/// the echo has risen and fallen or a phase times out. Timeouts are
/// reported in the returned [`PulseMeasurement`], never as errors.
///
/// # Errors
///
/// Returns [`PulseError::Pin`] if a pin cannot be read or driven.
pub fn measure_echo<T, E, C, D>(
    trigger: &mut T,
    echo: &mut E,
    clock: &C,
    delay: &mut D,
    config: &EchoConfig,
) -> PulseResult<PulseMeasurement>
where
    T: OutputPin,
    E: InputPin,
    C: Clock + ?Sized,
    D: DelayNs,
{
    let mut ranging = EchoRanging::from_config(config);
    let poll_us = delay_micros(config.poll_interval);

    send_trigger(trigger, delay, delay_micros(config.trigger_pulse))?;
    ranging.trigger_sent();
    let mut phase_start = clock.now();

    loop {
        let echo_high = echo.is_high().map_err(|e| PulseError::pin(&e))?;
        match ranging.step(clock.elapsed_micros(phase_start), echo_high) {
            EchoStep::Continue => delay.delay_us(poll_us),
            EchoStep::Enter(phase) => {
                trace!(%phase, "Echo phase started");
                phase_start = clock.now();
            }
            EchoStep::Finished(measurement) => {
                match measurement {
                    PulseMeasurement::Completed { duration_us } => {
                        debug!(duration_us, "Echo measured");
                    }
                    PulseMeasurement::TimedOut { phase } => {
                        warn!(%phase, "Echo measurement timed out");
                    }
                }
                return Ok(measurement);
            }
        }
    }
}
