//! Runtime configuration for the RC rover.
//!
//! `RoverConfig` is deserialized from JSON. Missing fields take their
//! defaults, so `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "channels": { "steer": 0, "yaw": 1, "throttle": 2, "spin": 4, "mode": 5 },
//!   "tick_ms": 50,
//!   "pwm": { "address": 64, "prescale": 60 }
//! }
//! ```

use core::fmt;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::utils::controllers::receiver::ChannelMap;

/// Receiver channels accepted in a `ChannelMap`.
pub const MAX_CHANNELS: u8 = 16;
/// Longest accepted pause between ticks (ms).
pub const MAX_TICK_MS: u64 = 60_000;

/// PCA9685 board settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmConfig {
    /// 7-bit I2C address.
    pub address: u8,
    /// Prescaler; 60 gives ~100 Hz from the 25 MHz internal oscillator.
    pub prescale: u8,
}

impl Default for PwmConfig {
    fn default() -> Self {
        PwmConfig {
            address: 0x40,
            prescale: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    pub channels: ChannelMap,
    /// Pause between ticks in milliseconds.
    pub tick_ms: u64,
    pub pwm: PwmConfig,
}

impl Default for RoverConfig {
    fn default() -> Self {
        RoverConfig {
            channels: ChannelMap::default(),
            tick_ms: 50,
            pwm: PwmConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    ZeroTickInterval,
    TickIntervalTooLong(u64),
    ChannelOutOfRange(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
            ConfigError::ZeroTickInterval => f.write_str("tick_ms must be greater than zero"),
            ConfigError::TickIntervalTooLong(ms) => {
                write!(f, "tick_ms {} exceeds the maximum of {}", ms, MAX_TICK_MS)
            }
            ConfigError::ChannelOutOfRange(ch) => {
                write!(f, "channel {} is out of range (max {})", ch, MAX_CHANNELS - 1)
            }
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl RoverConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: RoverConfig = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.tick_ms > MAX_TICK_MS {
            return Err(ConfigError::TickIntervalTooLong(self.tick_ms));
        }
        if let Some(&ch) = self
            .channels
            .indices()
            .iter()
            .find(|&&ch| ch >= MAX_CHANNELS)
        {
            return Err(ConfigError::ChannelOutOfRange(ch));
        }
        Ok(())
    }

    /// Pause between ticks, capped at `MAX_TICK_MS` for unvalidated configs.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.min(MAX_TICK_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(RoverConfig::from_json(b"{}").unwrap(), RoverConfig::default());
    }

    #[test]
    fn partial_fields_keep_defaults() {
        let cfg = RoverConfig::from_json(br#"{"channels": {"mode": 7}, "tick_ms": 20}"#).unwrap();
        assert_eq!(cfg.channels.mode, 7);
        assert_eq!(cfg.channels.throttle, 2);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(20));
        assert_eq!(cfg.pwm, PwmConfig::default());
    }

    #[test]
    fn rejects_zero_tick() {
        assert!(matches!(
            RoverConfig::from_json(br#"{"tick_ms": 0}"#),
            Err(ConfigError::ZeroTickInterval)
        ));
    }

    #[test]
    fn rejects_tick_longer_than_a_minute() {
        assert!(matches!(
            RoverConfig::from_json(br#"{"tick_ms": 18446744073709551615}"#),
            Err(ConfigError::TickIntervalTooLong(u64::MAX))
        ));
        assert!(matches!(
            RoverConfig::from_json(br#"{"tick_ms": 60001}"#),
            Err(ConfigError::TickIntervalTooLong(60_001))
        ));
        let cfg = RoverConfig::from_json(br#"{"tick_ms": 60000}"#).unwrap();
        assert_eq!(cfg.tick_interval(), Duration::from_millis(MAX_TICK_MS));
    }

    #[test]
    fn unvalidated_huge_tick_is_capped() {
        let cfg = RoverConfig {
            tick_ms: u64::MAX,
            ..RoverConfig::default()
        };
        assert_eq!(cfg.tick_interval(), Duration::from_millis(MAX_TICK_MS));
    }

    #[test]
    fn rejects_out_of_range_channel() {
        assert!(matches!(
            RoverConfig::from_json(br#"{"channels": {"spin": 16}}"#),
            Err(ConfigError::ChannelOutOfRange(16))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            RoverConfig::from_json(b"{\"tick_ms\": "),
            Err(ConfigError::Parse(_))
        ));
    }
}
