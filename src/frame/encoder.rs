//! # Frame Encoder
//!
//! Packs measurements back into 28-byte frames, as the meter would emit them.

use bytes::BufMut;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::protocol::*;
use crate::error::{MeterError, Result};

/// Pack raw integer slots into a complete frame
///
/// The reserved trailing byte is written as zero.
pub fn encode_raw(raw: &RawFields) -> [u8; FRAME_SIZE] {
    let mut block = [0u8; FRAME_SIZE];
    let mut buf = &mut block[..];

    buf.put_slice(&FRAME_MARKER);
    buf.put_i32_le(raw.volt);
    buf.put_i32_le(raw.amp);
    buf.put_u32_le(raw.a_h);
    buf.put_u32_le(raw.w_h);
    buf.put_u32_le(raw.delta);
    buf.put_u16_le(raw.data_n);
    buf.put_u16_le(raw.data_p);

    block
}

/// Encode a measurement into a complete frame
///
/// `watt` is derived and is not written to the frame.
///
/// # Errors
///
/// Returns error if a field carries more precision than its divisor allows
/// or does not fit into its slot type.
pub fn encode_measurement(measurement: &Measurement) -> Result<[u8; FRAME_SIZE]> {
    Ok(encode_raw(&unscale_fields(measurement)?))
}

/// Invert the per-field scaling of a measurement
pub fn unscale_fields(m: &Measurement) -> Result<RawFields> {
    let unit_nanos = u128::from(DELTA_UNIT_MILLIS) * 1_000_000;
    let delta_nanos = m.delta.as_nanos();
    if delta_nanos % unit_nanos != 0 {
        return Err(MeterError::Protocol(format!(
            "delta {:?} is not a multiple of {}ms",
            m.delta, DELTA_UNIT_MILLIS
        )));
    }
    let delta = u32::try_from(delta_nanos / unit_nanos)
        .map_err(|_| MeterError::Protocol(format!("delta {:?} out of range", m.delta)))?;

    Ok(RawFields {
        volt: to_slot("volt", m.volt, POWER_SCALE)?,
        amp: to_slot("amp", m.amp, POWER_SCALE)?,
        a_h: to_slot("a_h", m.a_h, POWER_SCALE)?,
        w_h: to_slot("w_h", m.w_h, POWER_SCALE)?,
        delta,
        data_n: to_slot("data_n", m.data_n, DATA_LINE_SCALE)?,
        data_p: to_slot("data_p", m.data_p, DATA_LINE_SCALE)?,
    })
}

/// Multiply by `10^scale` and narrow into the slot type
fn to_slot<T: TryFrom<i64>>(name: &str, value: Decimal, scale: u32) -> Result<T> {
    let scaled = value
        .checked_mul(Decimal::from(10i64.pow(scale)))
        .ok_or_else(|| MeterError::Protocol(format!("{} = {} out of range", name, value)))?;

    if !scaled.fract().is_zero() {
        return Err(MeterError::Protocol(format!(
            "{} = {} has more than {} decimal places",
            name, value, scale
        )));
    }

    scaled
        .to_i64()
        .and_then(|raw| T::try_from(raw).ok())
        .ok_or_else(|| MeterError::Protocol(format!("{} = {} out of range", name, value)))
}
