//! # Frame Decoder
//!
//! Unpacks the little-endian payload of a frame and scales it into exact
//! decimal quantities.

use bytes::Buf;
use rust_decimal::Decimal;
use std::time::Duration;

use super::protocol::*;
use crate::error::{MeterError, Result};

/// Decode a frame into a measurement
///
/// Decoding never fails: any frame carrying the marker is accepted and no
/// range or plausibility checks are made on the values.
///
/// # Examples
///
/// ```
/// use usb_meter::frame::decoder::decode_frame;
/// use usb_meter::frame::encoder::encode_raw;
/// use usb_meter::frame::protocol::{RawFields, RawFrame};
///
/// let block = encode_raw(&RawFields { volt: 51234, ..Default::default() });
/// let frame = RawFrame::from_block(block).unwrap();
/// let measurement = decode_frame(&frame);
/// assert_eq!(measurement.volt.to_string(), "5.1234");
/// ```
pub fn decode_frame(frame: &RawFrame) -> Measurement {
    scale_fields(&read_raw_fields(frame))
}

/// Decode an arbitrary byte slice
///
/// # Errors
///
/// Returns error if:
/// - The slice is not exactly [`FRAME_SIZE`] bytes long
/// - The slice does not start with the frame marker
pub fn decode_block(block: &[u8]) -> Result<Measurement> {
    let block: [u8; FRAME_SIZE] = block.try_into().map_err(|_| {
        MeterError::Protocol(format!(
            "Invalid frame length: expected {} bytes, got {}",
            FRAME_SIZE,
            block.len()
        ))
    })?;

    let frame = RawFrame::from_block(block).ok_or_else(|| {
        MeterError::Protocol(format!(
            "Invalid frame marker: {:02X} {:02X} {:02X}",
            block[0], block[1], block[2]
        ))
    })?;

    Ok(decode_frame(&frame))
}

/// Read the seven integer slots of a frame
pub fn read_raw_fields(frame: &RawFrame) -> RawFields {
    let mut payload = frame.payload();

    RawFields {
        volt: payload.get_i32_le(),
        amp: payload.get_i32_le(),
        a_h: payload.get_u32_le(),
        w_h: payload.get_u32_le(),
        delta: payload.get_u32_le(),
        data_n: payload.get_u16_le(),
        data_p: payload.get_u16_le(),
    }
}

/// Apply the per-field divisors and derive the power
pub fn scale_fields(raw: &RawFields) -> Measurement {
    let volt = Decimal::new(raw.volt.into(), POWER_SCALE);
    let amp = Decimal::new(raw.amp.into(), POWER_SCALE);

    Measurement {
        volt,
        amp,
        // i32 × i32 fits comfortably in the 96-bit mantissa
        watt: volt * amp,
        a_h: Decimal::new(raw.a_h.into(), POWER_SCALE),
        w_h: Decimal::new(raw.w_h.into(), POWER_SCALE),
        delta: Duration::from_millis(u64::from(raw.delta) * DELTA_UNIT_MILLIS),
        data_n: Decimal::new(raw.data_n.into(), DATA_LINE_SCALE),
        data_p: Decimal::new(raw.data_p.into(), DATA_LINE_SCALE),
    }
}
