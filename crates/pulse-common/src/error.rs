use embedded_hal::digital::ErrorKind;
use thiserror::Error;

/// Errors raised by the pulse timing core and its hardware collaborators.
///
/// Measurement timeouts are not errors; `pulse-timing` reports them as
/// `PulseMeasurement::TimedOut` values. Only hardware faults and bad
/// settings end up here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PulseError {
    /// Configuration or validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A digital pin reported a HAL error.
    #[error("digital pin error: {0:?}")]
    Pin(ErrorKind),
}

impl PulseError {
    /// Map any `embedded-hal` digital error into a [`PulseError::Pin`].
    pub fn pin<E: embedded_hal::digital::Error>(err: &E) -> Self {
        Self::Pin(err.kind())
    }
}

/// Convenience type alias for pulse operations.
pub type PulseResult<T> = Result<T, PulseError>;
