#![doc = "Common types shared across the pulse-kit workspace."]

pub mod config;
pub mod error;
pub mod sim;
pub mod time;

pub use config::*;
pub use error::*;
pub use time::*;
