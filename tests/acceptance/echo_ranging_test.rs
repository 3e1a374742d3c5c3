//! Echo ranging acceptance tests.

use super::common::run_echo;
use pulse_common::sim::{SimulatedRanger, VirtualClock};
use pulse_common::EchoConfig;
use pulse_timing::{
    distance_cm, distance_inches, Distance, EchoPhase, EchoRanging, EchoStep, PulseMeasurement,
    TimeoutPhase,
};
use std::time::Duration;

const POLL_US: u64 = 5;

#[test]
fn test_no_echo_times_out_waiting_for_rise() {
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 0, None);
    let config = EchoConfig::default();

    let run = run_echo(&ranger, &clock, &config);
    assert_eq!(
        run.measurement,
        PulseMeasurement::TimedOut {
            phase: TimeoutPhase::AwaitRise
        }
    );
    assert!(
        run.waited_us >= 1_000 && run.waited_us <= 1_000 + POLL_US,
        "waited {} us",
        run.waited_us
    );
}

#[test]
fn test_endless_echo_times_out_measuring_width() {
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 0, Some(u64::MAX));
    let config = EchoConfig::default();

    let run = run_echo(&ranger, &clock, &config);
    assert_eq!(
        run.measurement,
        PulseMeasurement::TimedOut {
            phase: TimeoutPhase::MeasureWidth
        }
    );
    assert!(run.waited_us <= 100_000 + POLL_US);
}

#[test]
fn test_widths_measured_within_one_poll() {
    let config = EchoConfig::default();
    for width in [5, 100, 999, 5_003, 23_200, 99_990] {
        let clock = VirtualClock::new();
        let ranger = SimulatedRanger::new(clock.clone(), 0, Some(width));
        let measured = run_echo(&ranger, &clock, &config)
            .measurement
            .duration_us()
            .unwrap_or_else(|| panic!("width {width} timed out"));
        assert!(
            measured >= width && measured < width + POLL_US,
            "width {width} measured {measured}"
        );
    }
}

#[test]
fn test_echo_ending_just_past_width_timeout() {
    let config = EchoConfig::default();
    for width in [100_001, 100_003] {
        let clock = VirtualClock::new();
        let ranger = SimulatedRanger::new(clock.clone(), 0, Some(width));
        assert_eq!(
            run_echo(&ranger, &clock, &config).measurement,
            PulseMeasurement::TimedOut {
                phase: TimeoutPhase::MeasureWidth
            },
            "width {width}"
        );
    }

    // Falling exactly at the limit still completes
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 0, Some(100_000));
    assert_eq!(
        run_echo(&ranger, &clock, &config).measurement,
        PulseMeasurement::Completed {
            duration_us: 100_000
        }
    );
}

#[test]
fn test_echo_rising_just_past_rise_timeout() {
    let config = EchoConfig::default();
    for latency in [1_001, 1_003] {
        let clock = VirtualClock::new();
        let ranger = SimulatedRanger::new(clock.clone(), latency, Some(500));
        let run = run_echo(&ranger, &clock, &config);
        assert_eq!(
            run.measurement,
            PulseMeasurement::TimedOut {
                phase: TimeoutPhase::AwaitRise
            },
            "latency {latency}"
        );
        assert!(run.waited_us <= 1_000 + POLL_US, "waited {} us", run.waited_us);
    }

    // Rising exactly at the limit still starts a measurement
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 1_000, Some(500));
    assert_eq!(
        run_echo(&ranger, &clock, &config).measurement,
        PulseMeasurement::Completed { duration_us: 500 }
    );
}

#[test]
fn test_reference_distance() {
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 0, Some(5_000));
    let run = run_echo(&ranger, &clock, &EchoConfig::default());

    assert_eq!(run.measurement, PulseMeasurement::Completed { duration_us: 5_000 });
    assert_eq!(distance_inches(5_000), 33);
    assert_eq!(distance_cm(5_000), 86);
    assert_eq!(
        run.measurement.distance(),
        Some(Distance {
            inches: 33,
            centimeters: 86
        })
    );
}

#[test]
fn test_retry_after_timeout() {
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 150, None);
    let config = EchoConfig::default();

    assert!(run_echo(&ranger, &clock, &config).measurement.is_timeout());

    // Obstacle appears; the next trigger succeeds
    ranger.set_echo_width(Some(1_740));
    let run = run_echo(&ranger, &clock, &config);
    assert_eq!(run.measurement.distance().map(|d| d.centimeters), Some(30));
    assert_eq!(ranger.trigger_count(), 2);
}

#[test]
fn test_widened_rise_timeout() {
    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 3_000, Some(580));
    let mut config = EchoConfig::default();

    assert_eq!(
        run_echo(&ranger, &clock, &config).measurement,
        PulseMeasurement::TimedOut {
            phase: TimeoutPhase::AwaitRise
        }
    );

    config.rise_timeout = Duration::from_millis(5);
    let run = run_echo(&ranger, &clock, &config);
    assert_eq!(run.measurement.distance().map(|d| d.centimeters), Some(10));
}

#[test]
fn test_state_machine_with_fake_samples() {
    // (time in phase, echo level) as a driver would feed them
    let script = [
        (0, false),
        (5, false),
        (10, true),
        (0, true),
        (5, true),
        (1_450, true),
        (1_455, false),
    ];
    let mut ranging = EchoRanging::new(1_000, 100_000);
    ranging.trigger_sent();

    let steps: Vec<EchoStep> = script
        .iter()
        .map(|&(elapsed, level)| ranging.step(elapsed, level))
        .collect();

    assert_eq!(steps[2], EchoStep::Enter(EchoPhase::MeasureWidth));
    assert_eq!(
        steps[6],
        EchoStep::Finished(PulseMeasurement::Completed { duration_us: 1_455 })
    );
    assert_eq!(ranging.phase(), EchoPhase::Trigger);
    assert_eq!(
        PulseMeasurement::Completed { duration_us: 1_455 }.distance(),
        Some(Distance::from_echo_micros(1_455))
    );
}
