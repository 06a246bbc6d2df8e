//! # Frame Synchronizer
//!
//! Turns a blocking byte stream into marker-aligned frames and decoded
//! measurements.
//!
//! By default the stream is consumed in whole 28-byte blocks. A block that
//! does not start with the marker is dropped and the next block is read. The
//! reader never searches byte-by-byte in this mode, so a stream shifted by a
//! non-multiple of the frame size will not regain lock. Byte-wise search is
//! available as [`ResyncPolicy::Sliding`].

use std::io::{ErrorKind, Read};
use tracing::{debug, trace};

use super::decoder::decode_frame;
use super::protocol::*;
use crate::error::Result;

/// How the reader recovers after a block without the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResyncPolicy {
    /// Drop the whole block and read the next one
    #[default]
    FrameAligned,

    /// Shift the window one byte at a time until the marker lines up
    Sliding,
}

/// Pull-based frame reader over a blocking byte source
#[derive(Debug)]
pub struct FrameReader<R> {
    source: R,
    policy: ResyncPolicy,
    frames_read: u64,
    blocks_discarded: u64,
    locked: bool,
    finished: bool,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader using [`ResyncPolicy::FrameAligned`]
    pub fn new(source: R) -> Self {
        Self::with_policy(source, ResyncPolicy::default())
    }

    /// Create a reader with an explicit resync policy
    pub fn with_policy(source: R, policy: ResyncPolicy) -> Self {
        Self {
            source,
            policy,
            frames_read: 0,
            blocks_discarded: 0,
            locked: false,
            finished: false,
        }
    }

    /// Read the next frame carrying the marker
    ///
    /// Blocks until enough bytes are available.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` - Next aligned frame
    /// * `Ok(None)` - The source ended before a complete frame was read
    ///
    /// # Errors
    ///
    /// Returns error on any I/O failure other than end-of-stream. The reader
    /// is finished afterwards.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.finished {
            return Ok(None);
        }

        let result = match self.policy {
            ResyncPolicy::FrameAligned => self.next_aligned(),
            ResyncPolicy::Sliding => self.next_sliding(),
        };

        match result {
            Ok(Some(frame)) => {
                self.frames_read += 1;
                if !self.locked {
                    debug!("Frame lock acquired after {} discarded blocks", self.blocks_discarded);
                    self.locked = true;
                }
                Ok(Some(frame))
            }
            Ok(None) => {
                debug!(
                    "Byte source ended ({} frames read, {} blocks discarded)",
                    self.frames_read, self.blocks_discarded
                );
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn next_aligned(&mut self) -> Result<Option<RawFrame>> {
        loop {
            let mut block = [0u8; FRAME_SIZE];
            if !self.fill(&mut block)? {
                return Ok(None);
            }

            if let Some(frame) = RawFrame::from_block(block) {
                return Ok(Some(frame));
            }

            self.discard(&block[..3]);
        }
    }

    fn next_sliding(&mut self) -> Result<Option<RawFrame>> {
        let mut block = [0u8; FRAME_SIZE];
        if !self.fill(&mut block)? {
            return Ok(None);
        }

        loop {
            if let Some(frame) = RawFrame::from_block(block) {
                return Ok(Some(frame));
            }

            self.discard(&block[..3]);

            // Resume at the next candidate marker byte, or take a fresh byte
            let shift = block[1..]
                .iter()
                .position(|&b| b == FRAME_MARKER[0])
                .map_or(FRAME_SIZE, |p| p + 1);

            block.copy_within(shift.., 0);
            if !self.fill(&mut block[FRAME_SIZE - shift..])? {
                return Ok(None);
            }
        }
    }

    fn discard(&mut self, head: &[u8]) {
        self.blocks_discarded += 1;
        if self.locked {
            debug!("Frame lock lost, resynchronizing ({:?})", self.policy);
            self.locked = false;
        }
        trace!("Discarding block starting {:02X?}", head);
    }

    /// Fill `buf` completely, returning `false` on end-of-stream
    fn fill(&mut self, buf: &mut [u8]) -> Result<bool> {
        match self.source.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of frames emitted so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Number of blocks (or shifted windows) dropped for a bad marker
    pub fn blocks_discarded(&self) -> u64 {
        self.blocks_discarded
    }

    /// Active resync policy
    pub fn policy(&self) -> ResyncPolicy {
        self.policy
    }

    /// Turn this reader into a stream of decoded measurements
    pub fn measurements(self) -> MeasurementStream<R> {
        MeasurementStream { frames: self }
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for FrameReader<R> {}

/// Lazy, unbounded sequence of measurements
///
/// Nothing is read from the source until the next item is requested.
#[derive(Debug)]
pub struct MeasurementStream<R> {
    frames: FrameReader<R>,
}

impl<R: Read> MeasurementStream<R> {
    /// Access the underlying frame reader (for counters)
    pub fn frames(&self) -> &FrameReader<R> {
        &self.frames
    }
}

impl<R: Read> Iterator for MeasurementStream<R> {
    type Item = Result<Measurement>;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames
            .next()
            .map(|frame| frame.map(|frame| decode_frame(&frame)))
    }
}

impl<R: Read> std::iter::FusedIterator for MeasurementStream<R> {}
