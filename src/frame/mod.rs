//! # Meter Frame Module
//!
//! Implementation of the USB meter telemetry frame protocol.
//!
//! This module handles:
//! - Frame layout constants and the decoded measurement type
//! - Frame synchronization over a blocking byte stream
//! - Decoding frames into exact decimal measurements
//! - Encoding measurements back into frames

pub mod protocol;
pub mod sync;
pub mod decoder;
pub mod encoder;

pub use protocol::{Measurement, RawFields, RawFrame, FRAME_MARKER, FRAME_SIZE};
pub use sync::{FrameReader, MeasurementStream, ResyncPolicy};
