//! Pulse and edge timing over polled digital inputs.
//!
//! This crate provides the measurement core of the sensor demo:
//!
//! - **Edge counting** ([`edge`]): debounced rising-edge counter over a time window
//! - **Echo ranging** ([`echo`]): trigger/await-rise/measure-width state machine
//! - **Distance** ([`distance`]): echo width to inches and centimeters
//!
//! Hardware is reached only through `embedded-hal` pins, a `DelayNs`
//! provider and a [`pulse_common::Clock`], so everything here runs against
//! the simulated devices in [`pulse_common::sim`].
//!
//! # Example
//!
//! ```
//! use pulse_common::sim::{SimulatedRanger, VirtualClock};
//! use pulse_common::EchoConfig;
//! use pulse_timing::distance::Distance;
//! use pulse_timing::echo::{measure_echo, PulseMeasurement};
//! use pulse_timing::edge::count_rising_edges;
//!
//! // Rising edges in a sample sequence
//! assert_eq!(count_rising_edges([true, true, false, true]), 2);
//!
//! // Echo ranging against a simulated 5 ms echo
//! let clock = VirtualClock::new();
//! let ranger = SimulatedRanger::new(clock.clone(), 0, Some(5_000));
//! let measurement = measure_echo(
//!     &mut ranger.trigger_pin(),
//!     &mut ranger.echo_pin(),
//!     &clock,
//!     &mut clock.clone(),
//!     &EchoConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(measurement, PulseMeasurement::Completed { duration_us: 5_000 });
//! assert_eq!(Distance::from_echo_micros(5_000).centimeters, 86);
//! ```

pub mod distance;
pub mod echo;
pub mod edge;

// Re-export main types for convenience
pub use distance::{distance_cm, distance_inches, Distance};
pub use echo::{measure_echo, EchoPhase, EchoRanging, EchoStep, PulseMeasurement, TimeoutPhase};
pub use edge::{count_edges, count_rising_edges, EdgeCounter};
