//! Edge counter acceptance tests.

use super::common::{transitions, SampleGen};
use pulse_common::sim::{ScriptedInput, SquareWave, VirtualClock};
use pulse_timing::{count_edges, count_rising_edges, EdgeCounter};
use std::time::Duration;

/// Long enough to drain any script used here on a 1 µs-per-read clock.
const DRAIN: Duration = Duration::from_millis(50);

#[test]
fn test_random_sequences_match_transition_count() {
    let mut gen = SampleGen::new(0x5eed);
    for len in [1, 2, 7, 64, 500, 4_000] {
        let samples = gen.sequence(len);
        let expected = transitions(&samples);

        assert_eq!(count_rising_edges(samples.iter().copied()), expected);

        let clock = VirtualClock::with_auto_advance(1);
        let mut input = ScriptedInput::new(samples.iter().copied());
        let counted = count_edges(&clock, &mut input, DRAIN).unwrap();
        assert_eq!(counted, expected, "length {len}");
        assert_eq!(input.remaining(), 0);
    }
}

#[test]
fn test_flat_inputs() {
    let clock = VirtualClock::with_auto_advance(1);

    let mut high = ScriptedInput::new(std::iter::repeat(true).take(1_000));
    assert_eq!(count_edges(&clock, &mut high, DRAIN).unwrap(), 1);

    let mut low = ScriptedInput::new(std::iter::repeat(false).take(1_000));
    assert_eq!(count_edges(&clock, &mut low, DRAIN).unwrap(), 0);
}

#[test]
fn test_disjoint_windows_start_fresh() {
    let clock = VirtualClock::with_auto_advance(1);
    // Steady high across both windows
    let mut wave = SquareWave::new(clock.clone(), 1_000_000, 1_000_000);

    let first = count_edges(&clock, &mut wave, Duration::from_millis(10)).unwrap();
    let second = count_edges(&clock, &mut wave, Duration::from_millis(10)).unwrap();
    assert_eq!((first, second), (1, 1));
}

#[test]
fn test_split_windows_equal_one_long_window() {
    // 1 kHz carrier, 30% duty
    let clock_a = VirtualClock::with_auto_advance(1);
    let mut wave_a = SquareWave::new(clock_a.clone(), 1_000, 300);
    let whole = count_edges(&clock_a, &mut wave_a, Duration::from_millis(100)).unwrap();

    let clock_b = VirtualClock::with_auto_advance(1);
    let mut wave_b = SquareWave::new(clock_b.clone(), 1_000, 300);
    let mut counter = EdgeCounter::new();
    for _ in 0..10 {
        counter
            .run_for(&clock_b, &mut wave_b, Duration::from_millis(10))
            .unwrap();
    }

    // 100 periods, plus the edge at the window's far end when it is sampled
    assert!((100..=101).contains(&whole), "whole = {whole}");
    // Window boundaries add a few microseconds, never an extra edge mid-level
    assert!(counter.count().abs_diff(whole) <= 1, "split = {}", counter.count());
}
