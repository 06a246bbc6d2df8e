//! # USB Meter Library
//!
//! Read telemetry from USB power meters over a serial link.
//!
//! The meter streams fixed 28-byte frames. This library locates them in the
//! byte stream, decodes them into exact decimal measurements and hands them
//! to an output sink (CSV rows or a live terminal display).

pub mod config;
pub mod error;
pub mod frame;
pub mod output;
pub mod serial;
