//! CSV row writer: one line per measurement.

use serde::Serialize;
use std::io::{self, Write};

use super::units::ceil_seconds;
use super::RecordSink;
use crate::error::{MeterError, Result};
use crate::frame::Measurement;

/// Column order of every row
pub const CSV_COLUMNS: [&str; 8] = ["volt", "amp", "watt", "a_h", "w_h", "delta", "data_n", "data_p"];

/// Serialized form of one row, fields in [`CSV_COLUMNS`] order
#[derive(Debug, Serialize)]
struct CsvRow {
    volt: String,
    amp: String,
    watt: String,
    a_h: String,
    w_h: String,
    delta: u64,
    data_n: String,
    data_p: String,
}

impl From<&Measurement> for CsvRow {
    fn from(m: &Measurement) -> Self {
        Self {
            volt: m.volt.normalize().to_string(),
            amp: m.amp.normalize().to_string(),
            // Keeps the scale of the product, so 1.5 × 2.2 prints as 3.30
            watt: (m.volt.normalize() * m.amp.normalize()).to_string(),
            a_h: m.a_h.normalize().to_string(),
            w_h: m.w_h.normalize().to_string(),
            delta: ceil_seconds(m.delta),
            data_n: m.data_n.normalize().to_string(),
            data_p: m.data_p.normalize().to_string(),
        }
    }
}

/// Writes measurements as CSV rows, flushing after each row
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Create a sink, writing the header row immediately if `header` is set
    pub fn new(output: W, header: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(output);

        if header {
            writer.write_record(CSV_COLUMNS)?;
            writer.flush()?;
        }

        Ok(Self { writer })
    }

    /// Recover the inner writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| MeterError::Io(io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, measurement: &Measurement) -> Result<()> {
        self.writer.serialize(CsvRow::from(measurement))?;
        // Rows must reach a pipe as they arrive
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
