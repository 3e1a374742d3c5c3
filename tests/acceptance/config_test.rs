//! Configuration file acceptance tests.

use super::common::run_echo;
use pulse_common::sim::{SimulatedRanger, VirtualClock};
use pulse_common::{PulseConfig, PulseError};
use pulse_timing::{PulseMeasurement, TimeoutPhase};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_config_file_drives_measurement() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[echo]
poll_interval = "10us"
width_timeout = "2ms"
"#
    )
    .unwrap();

    let config = PulseConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.echo.poll_interval, Duration::from_micros(10));

    let clock = VirtualClock::new();
    let ranger = SimulatedRanger::new(clock.clone(), 0, Some(2_500));
    assert_eq!(
        run_echo(&ranger, &clock, &config.echo).measurement,
        PulseMeasurement::TimedOut {
            phase: TimeoutPhase::MeasureWidth
        }
    );

    ranger.set_echo_width(Some(1_500));
    assert_eq!(
        run_echo(&ranger, &clock, &config.echo).measurement,
        PulseMeasurement::Completed { duration_us: 1_500 }
    );
}

#[test]
fn test_shipped_default_config_matches_builtin() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let shipped = PulseConfig::from_file(&path).unwrap();
    assert_eq!(shipped, PulseConfig::default());
}

#[test]
fn test_zero_timeout_rejected() {
    let config = PulseConfig::from_toml("[echo]\nrise_timeout = \"0s\"\n").unwrap();
    assert_eq!(
        config.validate(),
        Err(PulseError::Config("echo.rise_timeout must be non-zero".into()))
    );
}
