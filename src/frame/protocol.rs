//! # Meter Protocol Constants and Types
//!
//! Core definitions for the fixed 28-byte telemetry frame.
//!
//! ```text
//! offset  size  type  field
//! 0       3     -     marker AB 00 06
//! 3       4     i32   volt    (÷ 10000)
//! 7       4     i32   amp     (÷ 10000)
//! 11      4     u32   a_h     (÷ 10000)
//! 15      4     u32   w_h     (÷ 10000)
//! 19      4     u32   delta   (÷ 100, seconds)
//! 23      2     u16   data_n  (÷ 1000)
//! 25      2     u16   data_p  (÷ 1000)
//! 27      1     -     reserved
//! ```

use rust_decimal::Decimal;
use std::time::Duration;

/// Frame start marker
pub const FRAME_MARKER: [u8; 3] = [0xAB, 0x00, 0x06];

/// Total frame size in bytes
pub const FRAME_SIZE: usize = 28;

/// Offset of the first payload slot
pub const PAYLOAD_OFFSET: usize = FRAME_MARKER.len();

/// Decimal scale for volt, amp, a_h and w_h (divisor 10000)
pub const POWER_SCALE: u32 = 4;

/// Decimal scale for the data line channels (divisor 1000)
pub const DATA_LINE_SCALE: u32 = 3;

/// Elapsed time resolution: one raw unit is 10ms (divisor 100)
pub const DELTA_UNIT_MILLIS: u64 = 10;

/// One raw 28-byte frame whose marker has already been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_SIZE]);

impl RawFrame {
    /// Wrap a block if it starts with [`FRAME_MARKER`]
    pub fn from_block(block: [u8; FRAME_SIZE]) -> Option<Self> {
        if has_marker(&block) {
            Some(Self(block))
        } else {
            None
        }
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    /// Payload bytes following the marker
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_OFFSET..]
    }
}

/// Check whether a block starts with the frame marker
pub fn has_marker(block: &[u8]) -> bool {
    block.starts_with(&FRAME_MARKER)
}

/// The seven raw integer slots of a frame, before scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFields {
    pub volt: i32,
    pub amp: i32,
    pub a_h: u32,
    pub w_h: u32,
    pub delta: u32,
    pub data_n: u16,
    pub data_p: u16,
}

/// One decoded measurement in physical units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Bus voltage in volts
    pub volt: Decimal,

    /// Current in amperes (negative when flowing backwards)
    pub amp: Decimal,

    /// Power in watts, always `volt * amp`
    pub watt: Decimal,

    /// Accumulated charge in ampere-hours
    pub a_h: Decimal,

    /// Accumulated energy in watt-hours
    pub w_h: Decimal,

    /// Time elapsed since the meter session started
    pub delta: Duration,

    /// D- data line voltage in volts
    pub data_n: Decimal,

    /// D+ data line voltage in volts
    pub data_p: Decimal,
}
