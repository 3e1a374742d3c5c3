//! The four sensor demo routines and the cycle that runs them in turn.
//!
//! Each routine owns the display for its whole duration and checks the
//! clock only at the top of its loop, so a routine may overrun its
//! duration by up to one iteration.

use crate::board::{
    battery_millivolts, full_scale, to_millivolts, AnalogChannel, AnalogInput, Board,
};
use crate::display::CharDisplay;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use pulse_common::{
    delay_micros, elapsed_seconds, has_elapsed, Clock, DemoConfig, EchoConfig, PulseConfig,
    PulseError, PulseResult,
};
use pulse_timing::{measure_echo, Distance, EdgeCounter, PulseMeasurement, TimeoutPhase};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome counts for one run of the distance routine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangingStats {
    /// Measurements attempted.
    pub attempts: u32,
    /// Measurements that produced a distance.
    pub completed: u32,
    /// Echo never rose.
    pub rise_timeouts: u32,
    /// Echo stayed high too long.
    pub width_timeouts: u32,
    /// Most recent distance.
    pub last_distance: Option<Distance>,
}

impl RangingStats {
    fn record(&mut self, measurement: PulseMeasurement) {
        match measurement {
            PulseMeasurement::Completed { duration_us } => {
                self.completed += 1;
                self.last_distance = Some(Distance::from_echo_micros(duration_us));
            }
            PulseMeasurement::TimedOut {
                phase: TimeoutPhase::AwaitRise,
            } => self.rise_timeouts += 1,
            PulseMeasurement::TimedOut {
                phase: TimeoutPhase::MeasureWidth,
            } => self.width_timeouts += 1,
        }
    }
}

/// What one pass through all four routines observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// Last battery reading.
    pub battery_millivolts: Option<u16>,
    /// Infrared edges counted.
    pub ir_edges: u32,
    /// Distance routine outcomes.
    pub ranging: RangingStats,
    /// Ambient light readings displayed.
    pub light_readings: u32,
}

/// Clear the display and write both rows.
fn show<L: CharDisplay>(display: &mut L, top: &str, bottom: &str) {
    display.clear();
    display.print(top);
    display.goto_xy(0, 1);
    display.print(bottom);
}

impl<C, D, I, T, E, A> Board<C, D, I, T, E, A>
where
    C: Clock,
    D: DelayNs,
    I: InputPin,
    T: OutputPin,
    E: InputPin,
    A: AnalogInput,
{
    fn hold(&mut self, duration: Duration) {
        self.delay.delay_us(delay_micros(duration));
    }

    /// Show a "wait" banner naming the next routine.
    pub fn pause<L: CharDisplay>(&mut self, display: &mut L, message: &str, hold: Duration) {
        show(display, "wait", message);
        self.hold(hold);
    }

    /// Display the battery voltage until `config.battery_duration` passes.
    ///
    /// Returns the last reading.
    pub fn battery_voltage<L: CharDisplay>(
        &mut self,
        display: &mut L,
        config: &DemoConfig,
    ) -> Option<u16> {
        let mode = self.adc.mode();
        let start = self.clock.now();
        let mut last = None;
        while !has_elapsed(&self.clock, start, config.battery_duration) {
            let mv = battery_millivolts(self.adc.read(AnalogChannel::Battery), mode);
            display.clear();
            display.print(&format!("{mv}mV"));
            last = Some(mv);
            self.hold(config.refresh_interval);
        }
        info!(millivolts = ?last, "Battery routine finished");
        last
    }

    /// Count infrared edges until `config.ir_duration` passes.
    ///
    /// The whole display is redrawn every `config.refresh_interval`, and the
    /// edge count on the bottom row is rewritten as soon as an edge arrives.
    /// Edge state is kept across refreshes.
    ///
    /// # Errors
    ///
    /// Returns an error if the infrared input cannot be read.
    pub fn ir_counter<L: CharDisplay>(
        &mut self,
        display: &mut L,
        config: &DemoConfig,
    ) -> PulseResult<u32> {
        let mut counter = EdgeCounter::new();
        let mut loops: u32 = 0;
        let start = self.clock.now();
        while !has_elapsed(&self.clock, start, config.ir_duration) {
            loops = loops.wrapping_add(1);
            show(
                display,
                &format!("{:>7}", loops % 100_000),
                &format!("IR:{:>4}", counter.count() % 10_000),
            );
            let window = self.clock.now();
            while !has_elapsed(&self.clock, window, config.refresh_interval) {
                let sample = self.ir.is_high().map_err(|e| PulseError::pin(&e))?;
                if counter.poll(sample) {
                    display.goto_xy(0, 1);
                    display.print(&format!("IR:{:>4}", counter.count() % 10_000));
                }
            }
        }
        info!(
            edges = counter.count(),
            loops,
            seconds = elapsed_seconds(&self.clock, start),
            "IR routine finished"
        );
        Ok(counter.count())
    }

    /// Measure distance repeatedly until `config.distance_duration` passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger or echo pin fails.
    pub fn distance_check<L: CharDisplay>(
        &mut self,
        display: &mut L,
        config: &DemoConfig,
        echo: &EchoConfig,
    ) -> PulseResult<RangingStats> {
        let mut stats = RangingStats::default();
        let start = self.clock.now();
        while !has_elapsed(&self.clock, start, config.distance_duration) {
            stats.attempts += 1;
            display.clear();
            display.print(&format!("Dist:{:>2}", stats.attempts % 100));

            let measurement = measure_echo(
                &mut self.trigger,
                &mut self.echo,
                &self.clock,
                &mut self.delay,
                echo,
            )?;
            stats.record(measurement);

            match measurement {
                PulseMeasurement::TimedOut { phase } => {
                    show(
                        display,
                        &format!("Dist:{:>2}", stats.attempts),
                        &format!("fail {}", phase.code()),
                    );
                    self.hold(config.failure_hold);
                }
                PulseMeasurement::Completed { duration_us } => {
                    let distance = Distance::from_echo_micros(duration_us);
                    show(
                        display,
                        &format!("{:>4} in", distance.inches),
                        &format!("{:>4} cm", distance.centimeters),
                    );
                }
            }

            self.hold(config.ranging_interval);
        }
        info!(
            attempts = stats.attempts,
            completed = stats.completed,
            rise_timeouts = stats.rise_timeouts,
            width_timeouts = stats.width_timeouts,
            "Distance routine finished"
        );
        Ok(stats)
    }

    /// Show ambient light readings until `config.light_duration` passes.
    ///
    /// Each pass shows `config.light_samples` raw readings taken with
    /// free-running conversions, then as many blocking readings converted
    /// to millivolts.
    ///
    /// Returns the number of readings displayed.
    pub fn ambient_light<L: CharDisplay>(&mut self, display: &mut L, config: &DemoConfig) -> u32 {
        let mode = self.adc.mode();
        let scale = full_scale(mode);
        let mut readings = 0;
        let start = self.clock.now();
        while !has_elapsed(&self.clock, start, config.light_duration) {
            self.adc.start_conversion(AnalogChannel::AmbientLight);
            let mut taken = 0;
            while taken < config.light_samples {
                if self.adc.is_converting() {
                    continue;
                }
                let raw = self.adc.conversion_result();
                self.adc.start_conversion(AnalogChannel::AmbientLight);
                show(display, &format!("ver1:{taken:>2}"), &format!("{raw:>3}/{scale}"));
                self.hold(config.light_sample_interval);
                taken += 1;
            }

            for i in 0..config.light_samples {
                let mv = to_millivolts(self.adc.read(AnalogChannel::AmbientLight), mode);
                show(display, &format!("ver2:{i:>2}"), &format!("{mv:>4} mV"));
                self.hold(config.light_sample_interval);
            }
            readings += config.light_samples * 2;
            debug!(readings, "Ambient light pass complete");
        }
        info!(readings, "Ambient light routine finished");
        readings
    }

    /// Run every routine once, each preceded by its banner.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin fails.
    pub fn run_cycle<L: CharDisplay>(
        &mut self,
        display: &mut L,
        config: &PulseConfig,
        cycle: u64,
    ) -> PulseResult<CycleReport> {
        let demo = &config.demo;
        info!(cycle, "Starting demo cycle");

        self.pause(display, "Battery", demo.banner_pause);
        let battery_millivolts = self.battery_voltage(display, demo);

        self.pause(display, "IR", demo.banner_pause);
        let ir_edges = self.ir_counter(display, demo)?;

        self.pause(display, "Dist", demo.banner_pause);
        let ranging = self.distance_check(display, demo, &config.echo)?;

        self.pause(display, "Light", demo.banner_pause);
        let light_readings = self.ambient_light(display, demo);

        Ok(CycleReport {
            cycle,
            battery_millivolts,
            ir_edges,
            ranging,
            light_readings,
        })
    }
}
