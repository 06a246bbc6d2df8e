//! # Output Module
//!
//! Destinations for decoded measurements.
//!
//! This module handles:
//! - The `RecordSink` capability shared by all outputs
//! - CSV rows on any writer (usually stdout)
//! - A live full-screen terminal display
//! - Unit scaling and elapsed time formatting

pub mod csv_sink;
pub mod live;
pub mod units;

pub use csv_sink::CsvSink;
pub use live::LiveDisplay;

use tracing::{debug, info};

use crate::error::Result;
use crate::frame::Measurement;

/// Number of records between progress log messages
const LOG_INTERVAL_RECORDS: u64 = 1000;

/// Something that accepts measurements one at a time
#[cfg_attr(test, mockall::automock)]
pub trait RecordSink {
    /// Emit one measurement
    fn write_record(&mut self, measurement: &Measurement) -> Result<()>;

    /// Flush and release the output once the stream is over
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn write_record(&mut self, measurement: &Measurement) -> Result<()> {
        (**self).write_record(measurement)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Feed every measurement from `records` into `sink`
///
/// Stops at the first error from either side. `finish` is called on the
/// sink in every case.
///
/// # Returns
///
/// * `Result<u64>` - Number of records written
pub fn pump<I, S>(records: I, sink: &mut S) -> Result<u64>
where
    I: IntoIterator<Item = Result<Measurement>>,
    S: RecordSink + ?Sized,
{
    let mut count: u64 = 0;

    let result: Result<()> = records.into_iter().try_for_each(|record| {
        sink.write_record(&record?)?;
        count += 1;
        if count % LOG_INTERVAL_RECORDS == 0 {
            info!("Decoded {} measurements", count);
        }
        Ok(())
    });

    let finished = sink.finish();
    debug!("Measurement stream ended after {} records", count);

    result.and(finished).map(|_| count)
}
