//! Differential drive mixing for a two-motor rover.
//!
//! `mix` turns one tick's `ChannelFrame` into a `DriveCommand`. It is a pure
//! function of its input: there is no state carried between ticks, so the
//! mode can change on every call.
//!
//! # Example
//! ```rust
//! use rover_core::utils::controllers::receiver::ChannelFrame;
//! use rover_core::utils::math::mixer::{mix, Direction};
//!
//! let frame = ChannelFrame { throttle: 100, yaw: 50, ..ChannelFrame::default() };
//! let cmd = mix(&frame);
//! assert_eq!((cmd.a.speed, cmd.b.speed), (50, 150));
//! assert_eq!(cmd.a.direction, Direction::Forward);
//! ```
use serde::{Deserialize, Serialize};

use crate::utils::controllers::receiver::ChannelFrame;

/// Highest duty value accepted by the motor actuators.
pub const MAX_SPEED: u8 = 255;

/// Active drive mode, derived from the mode switch every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// Throttle plus steering with differential yaw.
    #[default]
    Normal,
    /// Both sides counter-rotate to turn in place.
    Spin,
}

impl DriveMode {
    /// Switch on selects `Spin`; no hysteresis.
    pub fn from_switch(on: bool) -> Self {
        if on {
            DriveMode::Spin
        } else {
            DriveMode::Normal
        }
    }
}

/// State of a motor's single direction-select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Non-negative values drive forward.
    pub fn from_sign(value: i32) -> Self {
        if value >= 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Level written to the direction line (`true` = high = backward).
    pub fn is_high(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

/// One of the two independently driven sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorSide {
    A,
    B,
}

/// Speed and direction for a single motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorCommand {
    pub speed: u8,
    pub direction: Direction,
}

impl MotorCommand {
    /// Build a command from an unclamped speed sum.
    pub fn new(
        raw_speed: i32,
        direction: Direction,
    ) -> Self {
        MotorCommand {
            speed: clamp_speed(raw_speed),
            direction,
        }
    }
}

/// Commands for both motors plus the mode that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveCommand {
    pub mode: DriveMode,
    pub a: MotorCommand,
    pub b: MotorCommand,
}

impl DriveCommand {
    /// Both motors at rest.
    pub const STOPPED: DriveCommand = DriveCommand {
        mode: DriveMode::Normal,
        a: MotorCommand {
            speed: 0,
            direction: Direction::Forward,
        },
        b: MotorCommand {
            speed: 0,
            direction: Direction::Forward,
        },
    };

    /// Command for the given side.
    pub fn side(
        &self,
        side: MotorSide,
    ) -> MotorCommand {
        match side {
            MotorSide::A => self.a,
            MotorSide::B => self.b,
        }
    }
}

/// Saturate a raw speed sum into `[0, 255]`.
///
/// Negative sums become 0; the sign is not carried into the direction.
pub fn clamp_speed(v: i32) -> u8 {
    v.clamp(0, MAX_SPEED as i32) as u8
}

/// Compute both motor commands for one tick.
pub fn mix(frame: &ChannelFrame) -> DriveCommand {
    let mode = DriveMode::from_switch(frame.spin_mode);
    let base = frame.throttle as i32;

    match mode {
        DriveMode::Normal => {
            let steer = frame.steer as i32;
            let yaw = frame.yaw as i32;
            let direction = Direction::from_sign(steer);
            let speed = base + steer.abs();

            DriveCommand {
                mode,
                a: MotorCommand::new(speed - yaw, direction),
                b: MotorCommand::new(speed + yaw, direction),
            }
        }
        DriveMode::Spin => {
            let spin = frame.spin as i32;
            let (dir_a, dir_b) = if spin >= 0 {
                (Direction::Backward, Direction::Forward)
            } else {
                (Direction::Forward, Direction::Backward)
            };
            let speed = base + spin.abs();

            DriveCommand {
                mode,
                a: MotorCommand::new(speed, dir_a),
                b: MotorCommand::new(speed, dir_b),
            }
        }
    }
}
