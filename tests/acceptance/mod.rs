//! Integration tests for pulse-kit acceptance testing.
//!
//! These tests verify the measurement contracts:
//! - Rising edges equal false→true transitions, per window
//! - Echo timeouts fire in the right phase within one poll
//! - Completed echoes convert to the expected distances

mod common;
mod config_test;
mod echo_ranging_test;
mod edge_counter_test;
