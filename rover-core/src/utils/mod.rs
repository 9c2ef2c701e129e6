//! Utility re-exports for the RC rover.
//!
//! This module re-exports the control loop, its hardware seams, the mixer and
//! the runtime configuration:
//!
//! - `config`: serde-backed runtime configuration loaded from JSON
//! - `controllers`: channel reader, motor drivers, indicator and the loop
//!   scheduler (`SystemController`)
//! - `math`: drive mode selection and differential drive mixing

pub mod config;
pub mod controllers;
pub mod math;

pub use config::RoverConfig;
pub use controllers::{SystemController, TickState};
pub use embassy_time::Duration;
pub use math::mixer::{mix, DriveCommand, DriveMode};
