//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//! Every section and field is optional; command-line flags are applied on
//! top of the loaded values.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{MeterError, Result};
use crate::frame::ResyncPolicy;
use crate::serial::LinkKind;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path; empty means it must come from the command line
    #[serde(default)]
    pub port: String,

    /// Bluetooth link (9600 baud) instead of USB (115200 baud)
    #[serde(default)]
    pub wireless: bool,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Frame decoder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DecoderConfig {
    #[serde(default)]
    pub resync: ResyncMode,
}

/// Resync mode as written in the config file
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResyncMode {
    #[default]
    Frame,
    Sliding,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,

    #[serde(default = "default_header")]
    pub header: bool,
}

/// Where measurements go
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// CSV rows on stdout
    #[default]
    Csv,
    /// Full-screen terminal display
    Live,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file; logs go to stderr when unset
    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_timeout_ms() -> u64 { 1000 }
fn default_header() -> bool { true }
fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            wireless: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { resync: ResyncMode::default() }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            header: default_header(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use usb_meter::config::Config;
    ///
    /// let config = Config::load("meter.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// The device path is not checked here since it may still be supplied
    /// on the command line; see [`Config::device`].
    pub fn validate(&self) -> Result<()> {
        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(MeterError::Config(
                toml::de::Error::custom("timeout_ms must be between 1 and 10000")
            ));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(MeterError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        if matches!(&self.logging.file, Some(file) if file.is_empty()) {
            return Err(MeterError::Config(
                toml::de::Error::custom("log file cannot be empty when set")
            ));
        }

        Ok(())
    }

    /// Device path to open
    ///
    /// # Errors
    ///
    /// Returns [`MeterError::MissingDevice`] if no port was configured
    pub fn device(&self) -> Result<&str> {
        if self.serial.port.is_empty() {
            Err(MeterError::MissingDevice)
        } else {
            Ok(&self.serial.port)
        }
    }

    /// Link kind derived from the wireless flag
    pub fn link(&self) -> LinkKind {
        LinkKind::from_wireless(self.serial.wireless)
    }

    /// Serial read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.timeout_ms)
    }

    /// Resync policy for the frame reader
    pub fn resync_policy(&self) -> ResyncPolicy {
        match self.decoder.resync {
            ResyncMode::Frame => ResyncPolicy::FrameAligned,
            ResyncMode::Sliding => ResyncPolicy::Sliding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.link(), LinkKind::Wired);
        assert_eq!(config.resync_policy(), ResyncPolicy::FrameAligned);
        assert_eq!(config.output.mode, OutputMode::Csv);
        assert!(config.output.header);
        assert_eq!(config.read_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_load_config_from_file() {
        let config = load_str(r#"
[serial]
port = "/dev/rfcomm0"
wireless = true
timeout_ms = 250

[decoder]
resync = "sliding"

[output]
mode = "live"
header = false

[logging]
level = "debug"
file = "meter.log"
"#).unwrap();

        assert_eq!(config.device().unwrap(), "/dev/rfcomm0");
        assert_eq!(config.link(), LinkKind::Wireless);
        assert_eq!(config.link().baud_rate(), 9600);
        assert_eq!(config.read_timeout(), Duration::from_millis(250));
        assert_eq!(config.resync_policy(), ResyncPolicy::Sliding);
        assert_eq!(config.output.mode, OutputMode::Live);
        assert!(!config.output.header);
        assert_eq!(config.logging.file.as_deref(), Some("meter.log"));
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let config = load_str("").unwrap();
        assert_eq!(config.serial.timeout_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_device() {
        let config = Config::default();
        assert!(matches!(config.device(), Err(MeterError::MissingDevice)));
    }

    #[test]
    fn test_unknown_resync_mode() {
        let result = load_str("[decoder]\nresync = \"bytewise\"\n");
        assert!(matches!(result, Err(MeterError::Config(_))));
    }

    #[test]
    fn test_unknown_output_mode() {
        let result = load_str("[output]\nmode = \"json\"\n");
        assert!(matches!(result, Err(MeterError::Config(_))));
    }

    #[test]
    fn test_timeout_ms_zero() {
        let mut config = Config::default();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_ms_too_high() {
        let mut config = Config::default();
        config.serial.timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_file() {
        let mut config = Config::default();
        config.logging.file = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load("/nonexistent/meter.toml");
        assert!(matches!(result, Err(MeterError::Io(_))));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_timeout_ms(), 1000);
        assert_eq!(default_header(), true);
        assert_eq!(default_log_level(), "info");
    }
}
