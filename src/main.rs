//! # USB Meter
//!
//! Stream measurements from a USB power meter as CSV or a live display.

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use usb_meter::config::{Config, LoggingConfig, OutputMode, ResyncMode};
use usb_meter::frame::FrameReader;
use usb_meter::output::{pump, CsvSink, LiveDisplay, RecordSink};
use usb_meter::serial::MeterSerial;

/// Command line options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial device of the meter (e.g. /dev/ttyUSB0)
    #[arg(short, long)]
    device: Option<String>,

    /// Use the wireless (Bluetooth) link at 9600 baud
    #[arg(short, long, alias = "bluetooth")]
    wireless: bool,

    /// Render a live full-screen display instead of CSV rows
    #[arg(short, long, alias = "curses")]
    live: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search byte-by-byte for the frame marker after a bad frame
    #[arg(long)]
    sliding_resync: bool,

    /// Do not print the CSV header row
    #[arg(long)]
    no_header: bool,
}

impl Args {
    /// Apply command line flags on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.serial.port = device.clone();
        }
        if self.wireless {
            config.serial.wireless = true;
        }
        if self.live {
            config.output.mode = OutputMode::Live;
        }
        if self.sliding_resync {
            config.decoder.resync = ResyncMode::Sliding;
        }
        if self.no_header {
            config.output.header = false;
        }
    }
}

/// Main entry point for USB Meter
///
/// # Control Flow
///
/// 1. Load configuration and apply command line overrides
/// 2. Set up logging (stderr, or a file when configured)
/// 3. Open the serial device at the link's baud rate
/// 4. Decode frames on a blocking worker and feed them to the output sink
/// 5. Stop when the stream ends, on a fatal I/O error, or on Ctrl+C
///
/// # Errors
///
/// Returns error if:
/// - No device is specified or the configuration is invalid
/// - The serial port cannot be opened
/// - The byte source fails while streaming
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    let device = config.device()?.to_string();

    let live = config.output.mode == OutputMode::Live;
    let guard = init_logging(&config.logging, live)?;

    info!("USB Meter v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = MeterSerial::open(&device, config.link(), config.read_timeout())?;
    let reader = FrameReader::with_policy(port, config.resync_policy());

    let mut sink: Box<dyn RecordSink + Send> = match config.output.mode {
        OutputMode::Csv => Box::new(CsvSink::new(io::stdout(), config.output.header)?),
        OutputMode::Live => Box::new(LiveDisplay::fullscreen(io::stdout())?),
    };

    let worker = tokio::task::spawn_blocking(move || pump(reader.measurements(), &mut sink));

    tokio::select! {
        joined = worker => {
            let count = joined??;
            info!("Byte source closed after {} measurements", count);
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            if live {
                restore_terminal();
            }
            drop(guard);
            // The worker is parked in a blocking read and cannot be joined
            std::process::exit(0);
        }
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// Live mode owns the terminal, so without a log file its logs are dropped.
fn init_logging(config: &LoggingConfig, live: bool) -> Result<WorkerGuard> {
    let level: tracing::Level = config.level.parse()?;

    let (writer, guard) = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_appender::non_blocking(file)
        }
        None if live => tracing_appender::non_blocking(io::sink()),
        None => tracing_appender::non_blocking(io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(config.file.is_none())
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.into())
        )
        .init();

    Ok(guard)
}

fn restore_terminal() {
    use crossterm::cursor::Show;
    use crossterm::execute;
    use crossterm::terminal::LeaveAlternateScreen;

    if let Err(e) = execute!(io::stdout(), Show, LeaveAlternateScreen) {
        warn!("Failed to restore terminal: {}", e);
    }
}
