//! Control loop for the RC rover.
//!
//! - `receiver`: channel reader over a `ChannelSource`
//! - `motors`: `MotorDriver` implementations (GPIO/PWM pins, PCA9685, dry run)
//! - `leds`: mode `Indicator` implementations
//!
//! `SystemController` wires them together: every tick it decodes a
//! `ChannelFrame`, mixes it into a `DriveCommand`, writes the motors and
//! updates the indicator. Nothing survives from one tick to the next.

pub mod leds;
pub mod motors;
pub mod receiver;

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

pub use leds::{Indicator, LedModule, PinIndicator};
pub use motors::{DryRunMotors, MotorBackend, MotorDriver, PinMotor, PinMotors, PwmMotors};
pub use receiver::{ChannelFrame, ChannelMap, ChannelSource};

use crate::utils::{
    config::RoverConfig,
    math::mixer::{mix, DriveCommand, DriveMode},
};

/// Default pause between ticks (~20 Hz).
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Everything one tick derived; dropped at the end of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickState {
    pub frame: ChannelFrame,
    pub command: DriveCommand,
}

pub struct SystemController<S, M, I> {
    pub source: S,
    pub motors: M,
    pub indicator: I,
    channels: ChannelMap,
    tick_interval: Duration,
}

impl<S, M, I> SystemController<S, M, I>
where
    S: ChannelSource,
    M: MotorDriver,
    I: Indicator,
{
    /// Controller with the default channel map and a 50 ms tick.
    pub fn new(
        source: S,
        motors: M,
        indicator: I,
    ) -> Self {
        SystemController {
            source,
            motors,
            indicator,
            channels: ChannelMap::default(),
            tick_interval: DEFAULT_TICK,
        }
    }

    /// Controller using the channel map and tick interval from `config`.
    pub fn with_config(
        source: S,
        motors: M,
        indicator: I,
        config: &RoverConfig,
    ) -> Self {
        SystemController {
            source,
            motors,
            indicator,
            channels: config.channels,
            tick_interval: config.tick_interval(),
        }
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one decode, mix, actuate pass.
    pub fn tick(&mut self) -> TickState {
        let frame = ChannelFrame::read(&mut self.source, &self.channels);
        let command = mix(&frame);

        self.motors.apply(&command);
        self.indicator.set_active(command.mode == DriveMode::Spin);

        tracing::debug!(?frame, ?command, "tick");
        TickState { frame, command }
    }

    /// Run `ticks` iterations, pausing for the tick interval after each.
    ///
    /// Returns the state of the last tick, or `None` when `ticks` is zero.
    pub async fn run_for<D: DelayNs>(
        &mut self,
        ticks: usize,
        delay: &mut D,
    ) -> Option<TickState> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.tick());
            self.pause(delay).await;
        }
        last
    }

    /// Run the loop until power is removed.
    pub async fn run<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> ! {
        tracing::info!(
            interval_ms = self.tick_interval.as_millis(),
            "control loop started"
        );
        loop {
            self.tick();
            self.pause(delay).await;
        }
    }

    /// Stop both motors and clear the indicator.
    pub fn shutdown(&mut self) {
        self.motors.stop();
        self.indicator.set_active(false);
        tracing::info!("motors stopped");
    }

    async fn pause<D: DelayNs>(
        &self,
        delay: &mut D,
    ) {
        let us = self.tick_interval.as_micros().min(u32::MAX as u64) as u32;
        delay.delay_us(us).await;
    }
}
