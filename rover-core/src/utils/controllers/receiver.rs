//! Channel reader for pulse-position receivers.
//!
//! Raw pulse widths come from a `ChannelSource`, the receiver-decoding
//! collaborator. Widths below `INVALID_PULSE_US` mean the decoder has no
//! fresh frame for that channel; every read then falls back to the
//! caller-supplied default instead of reporting an error.

use serde::{Deserialize, Serialize};

/// Pulse widths below this value signal a stale or undecodable channel.
pub const INVALID_PULSE_US: u16 = 100;
/// Nominal pulse width at full negative stick (µs).
pub const PULSE_MIN_US: i32 = 1000;
/// Nominal pulse width at full positive stick (µs).
pub const PULSE_MAX_US: i32 = 2000;

/// Latest decoded pulse width per receiver channel.
///
/// Implementations only report buffered values; reading must not reset or
/// consume them.
pub trait ChannelSource {
    /// Most recent pulse width for `channel` in microseconds, or a value
    /// below `INVALID_PULSE_US` when no valid frame is available.
    fn pulse_width(
        &mut self,
        channel: u8,
    ) -> u16;
}

impl<T: ChannelSource + ?Sized> ChannelSource for &mut T {
    fn pulse_width(
        &mut self,
        channel: u8,
    ) -> u16 {
        (**self).pulse_width(channel)
    }
}

/// Linearly re-map `x` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// Integer arithmetic with truncating division; inputs outside the source
/// range extrapolate and are not clamped. The product is formed in `i64` and
/// the result saturates at the `i32` bounds.
pub fn map_range(
    x: i32,
    in_min: i32,
    in_max: i32,
    out_min: i32,
    out_max: i32,
) -> i32 {
    let scaled = (x as i64 - in_min as i64) * (out_max as i64 - out_min as i64)
        / (in_max as i64 - in_min as i64)
        + out_min as i64;
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Read `channel` mapped into `[min_out, max_out]`, or `default_out` when the
/// receiver reports an invalid pulse.
pub fn read_channel<S: ChannelSource + ?Sized>(
    source: &mut S,
    channel: u8,
    min_out: i32,
    max_out: i32,
    default_out: i32,
) -> i32 {
    let pulse = source.pulse_width(channel);
    if pulse < INVALID_PULSE_US {
        return default_out;
    }
    map_range(pulse as i32, PULSE_MIN_US, PULSE_MAX_US, min_out, max_out)
}

/// Read `channel` as a two-position switch.
///
/// The channel is mapped to `[0, 100]` with a default of 100 or 0 standing in
/// for `default`, then thresholded at 50.
pub fn read_switch<S: ChannelSource + ?Sized>(
    source: &mut S,
    channel: u8,
    default: bool,
) -> bool {
    let default_out = if default { 100 } else { 0 };
    read_channel(source, channel, 0, 100, default_out) > 50
}

/// Receiver channel index assigned to each control role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    pub steer: u8,
    pub yaw: u8,
    pub throttle: u8,
    pub spin: u8,
    pub mode: u8,
}

impl Default for ChannelMap {
    fn default() -> Self {
        ChannelMap {
            steer: 0,
            yaw: 1,
            throttle: 2,
            spin: 4,
            mode: 5,
        }
    }
}

impl ChannelMap {
    /// All assigned indices, in `steer, yaw, throttle, spin, mode` order.
    pub fn indices(&self) -> [u8; 5] {
        [self.steer, self.yaw, self.throttle, self.spin, self.mode]
    }
}

/// Normalized control inputs for a single tick.
///
/// | field       | range        | no-signal default |
/// |-------------|--------------|-------------------|
/// | `steer`     | -100..=100   | 0                 |
/// | `yaw`       | -100..=100   | 0                 |
/// | `throttle`  | 0..=155      | 0                 |
/// | `spin`      | -100..=100   | 0                 |
/// | `spin_mode` | bool         | false             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelFrame {
    pub steer: i16,
    pub yaw: i16,
    pub throttle: i16,
    pub spin: i16,
    pub spin_mode: bool,
}

impl ChannelFrame {
    /// Sample every mapped channel once.
    pub fn read<S: ChannelSource + ?Sized>(
        source: &mut S,
        map: &ChannelMap,
    ) -> Self {
        ChannelFrame {
            steer: read_channel(source, map.steer, -100, 100, 0) as i16,
            yaw: read_channel(source, map.yaw, -100, 100, 0) as i16,
            throttle: read_channel(source, map.throttle, 0, 155, 0) as i16,
            spin: read_channel(source, map.spin, -100, 100, 0) as i16,
            spin_mode: read_switch(source, map.mode, false),
        }
    }
}
