//! # Error Types
//!
//! Custom error types for USB Meter using `thiserror`.

use thiserror::Error;

/// Main error type for USB Meter
#[derive(Debug, Error)]
pub enum MeterError {
    /// Frame protocol errors (bad block length, wrong marker, unencodable values)
    #[error("Frame protocol error: {0}")]
    Protocol(String),

    /// Serial device could not be opened
    #[error("Serial error: {0}")]
    Serial(String),

    /// No device was given on the command line or in the config file
    #[error("No serial device specified (use --device or [serial] port)")]
    MissingDevice,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for USB Meter
pub type Result<T> = std::result::Result<T, MeterError>;
