//! ADS-B signal demodulation
//!
//! Detects extended squitter preambles in the power stream and
//! demodulates the pulse-position coded bits that follow.

use std::io::Read;

use tracing::trace;

use crate::error::Result;
use crate::frame::{FRAME_BITS, FRAME_BYTES, RawFrame};
use crate::window::PowerWindow;

/// Power samples spanned by a preamble plus a full frame.
pub const WINDOW_SIZE: usize = 1200;
/// Duration of one power sample.
pub const SAMPLE_PERIOD_NS: u64 = 100;

/// Expected pulse offsets of the preamble.
const PEAK_OFFSETS: [usize; 4] = [0, 10, 35, 45];
/// Offsets where the preamble is silent.
const VALLEY_OFFSETS: [usize; 6] = [5, 15, 20, 25, 30, 40];
/// Offset of the first data bit.
const DATA_OFFSET: usize = 80;
/// Power samples per data bit.
const BIT_SAMPLES: usize = 10;

/// Anything that yields validated frames.
pub trait FrameSource {
    /// Next valid frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RawFrame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        (**self).next_frame()
    }
}

/// Extended squitter demodulator
pub struct Demodulator<R> {
    window: PowerWindow<R>,
    candidates: u64,
}

impl<R: Read> Demodulator<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            window: PowerWindow::new(reader, WINDOW_SIZE)?,
            candidates: 0,
        })
    }

    /// Number of preambles detected so far, valid frame or not.
    pub fn candidates(&self) -> u64 {
        self.candidates
    }

    fn peak_sum(&self, offset: usize) -> u32 {
        PEAK_OFFSETS.iter().map(|&o| self.window.get(offset + o)).sum()
    }

    fn valley_sum(&self) -> u32 {
        VALLEY_OFFSETS.iter().map(|&o| self.window.get(o)).sum()
    }

    /// Bit `k` of the frame at the current window position.
    #[inline]
    fn bit(&self, k: usize) -> u8 {
        let at = DATA_OFFSET + BIT_SAMPLES * k;
        if self.window.get(at) < self.window.get(at + BIT_SAMPLES / 2) {
            0
        } else {
            1
        }
    }

    fn byte(&self, index: usize) -> u8 {
        (0..8).fold(0u8, |acc, i| (acc << 1) | self.bit(index * 8 + i))
    }

    /// Try to read a valid frame at the current window position.
    fn frame_here(&mut self) -> Option<RawFrame> {
        self.candidates += 1;

        let first = self.byte(0);
        if RawFrame::size(first) != FRAME_BYTES {
            return None;
        }

        let mut bytes = [0u8; FRAME_BYTES];
        bytes[0] = first;
        for (i, b) in bytes.iter_mut().enumerate().skip(1) {
            *b = self.byte(i);
        }

        let timestamp_ns = self.window.position() * SAMPLE_PERIOD_NS;
        let frame = RawFrame::of(timestamp_ns, bytes);
        if frame.is_none() {
            trace!(position = self.window.position(), "bad CRC");
        }
        frame
    }
}

impl<R: Read> FrameSource for Demodulator<R> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let mut previous = 0;
        let mut current = if self.window.is_full() { self.peak_sum(0) } else { 0 };

        while self.window.is_full() {
            let next = self.peak_sum(1);

            if previous < current && current > next && current > 2 * self.valley_sum() {
                if let Some(frame) = self.frame_here() {
                    self.window.advance_by(self.window.size())?;
                    return Ok(Some(frame));
                }
            }

            self.window.advance()?;
            previous = current;
            current = next;
        }

        Ok(None)
    }
}

const _: () = assert!(DATA_OFFSET + BIT_SAMPLES * FRAME_BITS <= WINDOW_SIZE);
