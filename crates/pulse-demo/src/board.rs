//! Board wiring: the pins, converter and clock the demo routines use.
//!
//! [`Board`] only bundles parts; [`simulated_board`] builds one out of the
//! simulated devices in [`pulse_common::sim`] plus a [`SimulatedAdc`].

use embedded_hal::delay::DelayNs;
use pulse_common::sim::{RangerEcho, RangerTrigger, SimulatedRanger, SquareWave};
use pulse_common::{duration_micros, AnalogMode, Clock, SimulationConfig, Timestamp};

/// Full-scale reference voltage of the converter.
const REFERENCE_MILLIVOLTS: u32 = 5_000;

/// The battery is read through a 2/3 voltage divider.
const BATTERY_DIVIDER_NUM: u32 = 3;
const BATTERY_DIVIDER_DEN: u32 = 2;

/// Analog input channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    /// Battery voltage divider.
    Battery,
    /// Ambient light sensor, fitted in place of the user trimpot.
    AmbientLight,
}

/// Largest raw value for a converter mode.
#[must_use]
pub fn full_scale(mode: AnalogMode) -> u16 {
    match mode {
        AnalogMode::EightBit => 255,
        AnalogMode::TenBit => 1023,
    }
}

/// Convert a raw reading to millivolts at the converter input, rounding.
#[must_use]
pub fn to_millivolts(raw: u16, mode: AnalogMode) -> u16 {
    let max = u32::from(full_scale(mode));
    let raw = u32::from(raw).min(max);
    // At most 5000, always fits
    u16::try_from((raw * REFERENCE_MILLIVOLTS + max / 2) / max).unwrap_or(u16::MAX)
}

/// Convert a raw battery-channel reading to battery millivolts.
#[must_use]
pub fn battery_millivolts(raw: u16, mode: AnalogMode) -> u16 {
    let mv = u32::from(to_millivolts(raw, mode)) * BATTERY_DIVIDER_NUM / BATTERY_DIVIDER_DEN;
    u16::try_from(mv).unwrap_or(u16::MAX)
}

/// Analog-to-digital converter with a start/poll/read cycle.
pub trait AnalogInput {
    /// Converter resolution.
    fn mode(&self) -> AnalogMode;

    /// Begin a conversion on `channel`.
    fn start_conversion(&mut self, channel: AnalogChannel);

    /// True while the last conversion is still running.
    fn is_converting(&mut self) -> bool;

    /// Result of the last finished conversion.
    fn conversion_result(&mut self) -> u16;

    /// Start a conversion and wait for it.
    fn read(&mut self, channel: AnalogChannel) -> u16 {
        self.start_conversion(channel);
        while self.is_converting() {
            std::hint::spin_loop();
        }
        self.conversion_result()
    }
}

/// Converter whose readings come from fixed simulated values.
#[derive(Debug, Clone)]
pub struct SimulatedAdc<C> {
    clock: C,
    mode: AnalogMode,
    conversion_us: u64,
    battery_raw: u16,
    ambient_raw: u16,
    pending: Option<(AnalogChannel, Timestamp)>,
}

impl<C: Clock> SimulatedAdc<C> {
    /// Create a converter reporting the configured battery and light values.
    pub fn new(clock: C, mode: AnalogMode, sim: &SimulationConfig) -> Self {
        let max = u32::from(full_scale(mode));
        let divided_mv =
            u32::from(sim.battery_millivolts) * BATTERY_DIVIDER_DEN / BATTERY_DIVIDER_NUM;
        let battery_raw =
            ((divided_mv * max + REFERENCE_MILLIVOLTS / 2) / REFERENCE_MILLIVOLTS).min(max);
        Self {
            clock,
            mode,
            conversion_us: duration_micros(sim.conversion_time),
            battery_raw: u16::try_from(battery_raw).unwrap_or(u16::MAX),
            ambient_raw: sim.ambient_light_raw.min(full_scale(mode)),
            pending: None,
        }
    }
}

impl<C: Clock> AnalogInput for SimulatedAdc<C> {
    fn mode(&self) -> AnalogMode {
        self.mode
    }

    fn start_conversion(&mut self, channel: AnalogChannel) {
        self.pending = Some((channel, self.clock.now()));
    }

    fn is_converting(&mut self) -> bool {
        self.pending
            .is_some_and(|(_, started)| self.clock.elapsed_micros(started) < self.conversion_us)
    }

    fn conversion_result(&mut self) -> u16 {
        match self.pending {
            Some((AnalogChannel::Battery, _)) => self.battery_raw,
            Some((AnalogChannel::AmbientLight, _)) => self.ambient_raw,
            None => 0,
        }
    }
}

/// Everything the demo routines touch.
///
/// `clock` and `delay` are separate so a measurement can read time while
/// sleeping through another handle to the same timer.
#[derive(Debug)]
pub struct Board<C, D, I, T, E, A> {
    /// Monotonic time source.
    pub clock: C,
    /// Microsecond delay provider.
    pub delay: D,
    /// Infrared receiver input.
    pub ir: I,
    /// Ultrasonic trigger output.
    pub trigger: T,
    /// Ultrasonic echo input.
    pub echo: E,
    /// Analog converter.
    pub adc: A,
}

/// A board built entirely from simulated parts.
pub type SimulatedBoard<C> =
    Board<C, C, SquareWave<C>, RangerTrigger<C>, RangerEcho<C>, SimulatedAdc<C>>;

/// Build a simulated board on `clock`.
///
/// Also returns the ranger so callers can move the simulated obstacle.
pub fn simulated_board<C>(
    clock: C,
    sim: &SimulationConfig,
    mode: AnalogMode,
) -> (SimulatedBoard<C>, SimulatedRanger<C>)
where
    C: Clock + DelayNs + Clone,
{
    let latency_us = duration_micros(sim.echo_latency);
    let ranger = match sim.target_distance_cm {
        Some(cm) => SimulatedRanger::with_distance_cm(clock.clone(), latency_us, cm),
        None => SimulatedRanger::new(clock.clone(), latency_us, None),
    };
    let board = Board {
        delay: clock.clone(),
        ir: SquareWave::new(
            clock.clone(),
            duration_micros(sim.ir_period),
            duration_micros(sim.ir_high),
        ),
        trigger: ranger.trigger_pin(),
        echo: ranger.echo_pin(),
        adc: SimulatedAdc::new(clock.clone(), mode, sim),
        clock,
    };
    (board, ranger)
}
