//! Replay of recorded frames.
//!
//! A recording is a sequence of 22-byte records: an 8-byte big-endian
//! timestamp in nanoseconds followed by the 14 frame bytes.

use std::io::{self, Read};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::byte_seq::be_u64;
use crate::demodulator::FrameSource;
use crate::error::Result;
use crate::frame::{FRAME_BYTES, RawFrame};
use crate::samples::read_fully;

/// Size of one recorded frame.
pub const RECORD_BYTES: usize = 8 + FRAME_BYTES;

pub struct FrameReplay<R> {
    reader: R,
    skipped: u64,
}

impl<R: Read> FrameReplay<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, skipped: 0 }
    }

    /// Records dropped because their CRC did not check out.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn read_record(&mut self) -> Result<Option<[u8; RECORD_BYTES]>> {
        let mut record = [0u8; RECORD_BYTES];
        match read_fully(&mut self.reader, &mut record)? {
            0 => Ok(None),
            RECORD_BYTES => Ok(Some(record)),
            n => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("truncated frame record: {} of {} bytes", n, RECORD_BYTES),
            )
            .into()),
        }
    }
}

impl<R: Read> FrameSource for FrameReplay<R> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        while let Some(record) = self.read_record()? {
            let timestamp_ns = be_u64(&record[..8]);
            let mut bytes = [0u8; FRAME_BYTES];
            bytes.copy_from_slice(&record[8..]);

            match RawFrame::of(timestamp_ns, bytes) {
                Some(frame) => return Ok(Some(frame)),
                None => {
                    self.skipped += 1;
                    debug!(timestamp_ns, "skipping recorded frame with bad CRC");
                }
            }
        }
        Ok(None)
    }
}

/// Write `frame` as one replay record.
pub fn encode_record(frame: &RawFrame) -> [u8; RECORD_BYTES] {
    let mut record = [0u8; RECORD_BYTES];
    record[..8].copy_from_slice(&frame.timestamp_ns().to_be_bytes());
    record[8..].copy_from_slice(frame.bytes());
    record
}

/// Holds frames back until their timestamp has elapsed on the wall clock.
pub struct Pacer {
    start: Instant,
}

impl Pacer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time left before a frame stamped `timestamp_ns` is due.
    pub fn delay(&self, timestamp_ns: u64) -> Duration {
        Duration::from_nanos(timestamp_ns).saturating_sub(self.start.elapsed())
    }

    /// Block until `timestamp_ns` has elapsed since the pacer was created.
    pub fn wait_for(&self, timestamp_ns: u64) {
        let delay = self.delay(timestamp_ns);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}
