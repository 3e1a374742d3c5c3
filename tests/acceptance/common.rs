//! Common utilities for integration tests.
//!
//! Provides helpers for:
//! - Generating reproducible sample sequences
//! - Running a single echo measurement against a simulated ranger

use pulse_common::sim::{SimulatedRanger, VirtualClock};
use pulse_common::EchoConfig;
use pulse_timing::{measure_echo, PulseMeasurement};

/// Linear congruential generator for reproducible boolean sequences.
pub struct SampleGen(u64);

impl SampleGen {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_bool(&mut self) -> bool {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) & 1 == 1
    }

    pub fn sequence(&mut self, len: usize) -> Vec<bool> {
        (0..len).map(|_| self.next_bool()).collect()
    }
}

/// Reference count: false→true transitions with an implicit leading false.
pub fn transitions(samples: &[bool]) -> u32 {
    let mut previous = false;
    let mut count = 0;
    for &sample in samples {
        if sample && !previous {
            count += 1;
        }
        previous = sample;
    }
    count
}

/// Result of one simulated measurement.
pub struct EchoRun {
    pub measurement: PulseMeasurement,
    /// Microseconds spent after the trigger pulse.
    pub waited_us: u64,
}

/// Trigger once against `ranger` and time the whole measurement.
pub fn run_echo(
    ranger: &SimulatedRanger<VirtualClock>,
    clock: &VirtualClock,
    config: &EchoConfig,
) -> EchoRun {
    let start = clock.peek();
    let measurement = measure_echo(
        &mut ranger.trigger_pin(),
        &mut ranger.echo_pin(),
        clock,
        &mut clock.clone(),
        config,
    )
    .expect("simulated pins are infallible");
    let trigger_us = pulse_common::duration_micros(config.trigger_pulse);
    EchoRun {
        measurement,
        waited_us: clock.peek() - start - trigger_us,
    }
}
