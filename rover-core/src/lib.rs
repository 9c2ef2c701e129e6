//! Receiver-to-motor control loop for a differential drive RC rover on no-std
//! embedded platforms.
//!
//! For a host-side run of the loop, see the `rover-app/mock-mcu` simulator.
#![no_std]

pub mod utils;
