//! Live full-screen display, redrawn on every measurement.

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::Write;

use super::units::{format_elapsed, with_unit};
use super::RecordSink;
use crate::error::Result;
use crate::frame::Measurement;

/// Screen lines for one measurement, top to bottom
pub fn display_lines(m: &Measurement) -> [String; 8] {
    [
        format!(" Volt: {}", with_unit(m.volt, "V")),
        format!("  Amp: {}", with_unit(m.amp, "A")),
        format!(" Watt: {}", with_unit(m.watt, "W")),
        format!("  A·h: {}", with_unit(m.a_h, "A·h")),
        format!("  W·h: {}", with_unit(m.w_h, "W·h")),
        format!("Delta: {}", format_elapsed(m.delta)),
        format!("   D-: {}", with_unit(m.data_n, "V")),
        format!("   D+: {}", with_unit(m.data_p, "V")),
    ]
}

/// Terminal sink that clears and redraws the screen per measurement
pub struct LiveDisplay<W: Write> {
    out: W,
    fullscreen: bool,
}

impl<W: Write> LiveDisplay<W> {
    /// Draw into `out` without taking over the terminal
    pub fn new(out: W) -> Self {
        Self {
            out,
            fullscreen: false,
        }
    }

    /// Switch `out` to the alternate screen and hide the cursor
    ///
    /// The terminal is restored by [`RecordSink::finish`].
    pub fn fullscreen(mut out: W) -> Result<Self> {
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self {
            out,
            fullscreen: true,
        })
    }
}

impl<W: Write> RecordSink for LiveDisplay<W> {
    fn write_record(&mut self, measurement: &Measurement) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in display_lines(measurement).iter().enumerate() {
            queue!(self.out, MoveTo(0, row as u16), Print(line))?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.fullscreen {
            execute!(self.out, Show, LeaveAlternateScreen)?;
            self.fullscreen = false;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for LiveDisplay<W> {
    fn drop(&mut self) {
        if self.fullscreen {
            let _ = execute!(self.out, Show, LeaveAlternateScreen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decoder::scale_fields;
    use crate::frame::RawFields;

    fn sample() -> Measurement {
        scale_fields(&RawFields {
            volt: 200_000,
            amp: 600_000,
            a_h: 12_345,
            w_h: 12_345_678,
            delta: 8_345,
            data_n: 20,
            data_p: 3_300,
        })
    }

    #[test]
    fn test_display_lines() {
        let lines = display_lines(&sample());

        assert_eq!(lines[0], " Volt: 20 V");
        assert_eq!(lines[1], "  Amp: 60 A");
        assert_eq!(lines[2], " Watt: 1.2 kW");
        assert_eq!(lines[3], "  A·h: 1.2345 A·h");
        assert_eq!(lines[4], "  W·h: 1.2345678 kW·h");
        assert_eq!(lines[5], "Delta: 0:01:23.450000");
        assert_eq!(lines[6], "   D-: 0.02 V");
        assert_eq!(lines[7], "   D+: 3.3 V");
    }

    #[test]
    fn test_redraw_writes_every_line() {
        let mut display = LiveDisplay::new(Vec::new());
        display.write_record(&sample()).unwrap();
        display.finish().unwrap();

        let out = String::from_utf8(display.out.clone()).unwrap();
        for line in display_lines(&sample()) {
            assert!(out.contains(&line), "missing line {:?}", line);
        }
        // Clear screen escape sequence precedes the redraw
        assert!(out.starts_with("\x1b[2J"));
    }
}
