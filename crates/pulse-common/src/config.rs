//! Configuration structures for the pulse timing core and the demo runner.
//!
//! Supports TOML deserialization with defaults that reproduce the robot
//! firmware's fixed timings. Durations are written in humantime form
//! (`"20us"`, `"1ms"`, `"15s"`).

use crate::error::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Echo-ranging timings.
    pub echo: EchoConfig,

    /// Demo routine durations and display pacing.
    pub demo: DemoConfig,

    /// Simulated board values used when no real hardware is attached.
    pub simulation: SimulationConfig,
}

/// Timings for one echo-ranging measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// How long the trigger output is held high.
    #[serde(with = "humantime_serde")]
    pub trigger_pulse: Duration,

    /// Delay between polls while waiting for the echo.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Longest wait for the echo to start after the trigger.
    ///
    /// The 1 ms default is far below typical sensor datasheet worst-case
    /// latency and may be too tight; it is kept as the firmware shipped it.
    #[serde(with = "humantime_serde")]
    pub rise_timeout: Duration,

    /// Longest echo accepted before the measurement is abandoned.
    #[serde(with = "humantime_serde")]
    pub width_timeout: Duration,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            trigger_pulse: Duration::from_micros(20),
            poll_interval: Duration::from_micros(5),
            rise_timeout: Duration::from_micros(1_000),
            width_timeout: Duration::from_micros(100_000),
        }
    }
}

impl EchoConfig {
    /// Reject settings that would make a measurement loop meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if any timing is zero.
    pub fn validate(&self) -> PulseResult<()> {
        let checks = [
            (self.trigger_pulse, "trigger_pulse"),
            (self.poll_interval, "poll_interval"),
            (self.rise_timeout, "rise_timeout"),
            (self.width_timeout, "width_timeout"),
        ];
        for (value, name) in checks {
            if value.is_zero() {
                return Err(PulseError::Config(format!("echo.{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

/// Resolution of the analog-to-digital converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalogMode {
    /// Conversions yield 0-255.
    #[default]
    EightBit,
    /// Conversions yield 0-1023.
    TenBit,
}

/// Demo routine durations and display pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// How long the "wait" banner is shown before each routine.
    #[serde(with = "humantime_serde")]
    pub banner_pause: Duration,

    /// Battery voltage routine length.
    #[serde(with = "humantime_serde")]
    pub battery_duration: Duration,

    /// Infrared counter routine length.
    #[serde(with = "humantime_serde")]
    pub ir_duration: Duration,

    /// Distance routine length.
    #[serde(with = "humantime_serde")]
    pub distance_duration: Duration,

    /// Ambient light routine length.
    #[serde(with = "humantime_serde")]
    pub light_duration: Duration,

    /// Display refresh period for the battery and IR routines.
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Pause between echo measurements.
    #[serde(with = "humantime_serde")]
    pub ranging_interval: Duration,

    /// How long a failed measurement stays on screen.
    #[serde(with = "humantime_serde")]
    pub failure_hold: Duration,

    /// Readings per ambient light pass.
    pub light_samples: u32,

    /// Pause between ambient light readings.
    #[serde(with = "humantime_serde")]
    pub light_sample_interval: Duration,

    /// ADC resolution.
    pub analog_mode: AnalogMode,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            banner_pause: Duration::from_millis(500),
            battery_duration: Duration::from_secs(5),
            ir_duration: Duration::from_secs(15),
            distance_duration: Duration::from_secs(15),
            light_duration: Duration::from_secs(40),
            refresh_interval: Duration::from_millis(100),
            ranging_interval: Duration::from_millis(500),
            failure_hold: Duration::from_secs(1),
            light_samples: 20,
            light_sample_interval: Duration::from_millis(500),
            analog_mode: AnalogMode::EightBit,
        }
    }
}

/// Which clock drives the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockSource {
    /// Simulated time; delays return immediately.
    #[default]
    Virtual,
    /// Wall-clock time.
    System,
}

/// Simulated board values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Clock used by the simulated board.
    pub clock: ClockSource,

    /// Battery voltage reported by the board.
    pub battery_millivolts: u16,

    /// Raw ambient light reading at full ADC resolution.
    pub ambient_light_raw: u16,

    /// Time an analog conversion takes.
    #[serde(with = "humantime_serde")]
    pub conversion_time: Duration,

    /// Infrared carrier period.
    #[serde(with = "humantime_serde")]
    pub ir_period: Duration,

    /// Time the infrared input is high within each period.
    #[serde(with = "humantime_serde")]
    pub ir_high: Duration,

    /// Delay between the trigger's falling edge and the echo rising.
    #[serde(with = "humantime_serde")]
    pub echo_latency: Duration,

    /// Distance to the simulated obstacle; `None` means no echo at all.
    pub target_distance_cm: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            clock: ClockSource::Virtual,
            battery_millivolts: 4_850,
            ambient_light_raw: 128,
            conversion_time: Duration::from_micros(100),
            ir_period: Duration::from_millis(10),
            ir_high: Duration::from_millis(5),
            echo_latency: Duration::from_micros(200),
            target_distance_cm: Some(86),
        }
    }
}

impl PulseConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        debug!(?path, "Reading configuration file");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] describing the first invalid value.
    pub fn validate(&self) -> PulseResult<()> {
        self.echo.validate()?;
        if self.demo.refresh_interval.is_zero() {
            return Err(PulseError::Config(
                "demo.refresh_interval must be non-zero".into(),
            ));
        }
        if self.simulation.ir_high > self.simulation.ir_period {
            return Err(PulseError::Config(
                "simulation.ir_high cannot exceed simulation.ir_period".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PulseConfig::default();
        assert_eq!(config.echo.trigger_pulse, Duration::from_micros(20));
        assert_eq!(config.echo.poll_interval, Duration::from_micros(5));
        assert_eq!(config.echo.rise_timeout, Duration::from_micros(1_000));
        assert_eq!(config.echo.width_timeout, Duration::from_micros(100_000));
        assert_eq!(config.demo.ir_duration, Duration::from_secs(15));
        assert_eq!(config.demo.light_samples, 20);
        assert_eq!(config.simulation.clock, ClockSource::Virtual);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [echo]
            rise_timeout = "2ms"
            width_timeout = "40ms"

            [demo]
            battery_duration = "1s"
            analog_mode = "ten_bit"

            [simulation]
            clock = "system"
            target_distance_cm = 30
        "#;

        let config = PulseConfig::from_toml(toml).unwrap();
        assert_eq!(config.echo.rise_timeout, Duration::from_millis(2));
        assert_eq!(config.echo.width_timeout, Duration::from_millis(40));
        // Unspecified fields keep their defaults
        assert_eq!(config.echo.poll_interval, Duration::from_micros(5));
        assert_eq!(config.demo.battery_duration, Duration::from_secs(1));
        assert_eq!(config.demo.analog_mode, AnalogMode::TenBit);
        assert_eq!(config.simulation.clock, ClockSource::System);
        assert_eq!(config.simulation.target_distance_cm, Some(30));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = PulseConfig::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("20us"), "unexpected TOML: {toml}");
        let parsed = PulseConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_rejects_bad_duration() {
        let err = PulseConfig::from_toml("[echo]\nrise_timeout = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = PulseConfig::default();
        config.echo.poll_interval = Duration::ZERO;
        assert_eq!(
            config.validate(),
            Err(PulseError::Config(
                "echo.poll_interval must be non-zero".into()
            ))
        );
    }

    #[test]
    fn test_validate_ir_duty_cycle() {
        let mut config = PulseConfig::default();
        config.simulation.ir_high = config.simulation.ir_period + Duration::from_micros(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clock_source_names() {
        let source: ClockSource = serde_json::from_str("\"virtual\"").unwrap();
        assert_eq!(source, ClockSource::Virtual);
        let mode: AnalogMode = serde_json::from_str("\"eight_bit\"").unwrap();
        assert_eq!(mode, AnalogMode::EightBit);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[demo]\nlight_samples = 5").unwrap();
        let config = PulseConfig::from_file(file.path()).unwrap();
        assert_eq!(config.demo.light_samples, 5);
    }

    #[test]
    fn test_from_missing_file() {
        let err = PulseConfig::from_file(std::path::Path::new("/nonexistent/pulse.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
