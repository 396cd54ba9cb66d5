//! Fixed-size sliding window over the power stream.
//!
//! Two batch buffers back the window: `current` holds the batch the
//! window starts in, `next` the following one. When the window position
//! crosses a batch boundary the buffers swap and the trailing one is
//! refilled from the stream.

use std::io::Read;

use crate::error::{Error, Result};
use crate::power::PowerComputer;

/// Number of power samples per batch buffer.
pub const BATCH_SIZE: usize = 1 << 16;

pub struct PowerWindow<R> {
    computer: PowerComputer<R>,
    window_size: usize,
    /// Absolute position of the first sample in the window.
    position: u64,
    /// Total number of power samples read from the stream so far.
    available: u64,
    current: Box<[u32]>,
    next: Box<[u32]>,
}

impl<R: Read> PowerWindow<R> {
    pub fn new(reader: R, window_size: usize) -> Result<Self> {
        if window_size == 0 || window_size > BATCH_SIZE {
            return Err(Error::InvalidArgument(format!(
                "window size {} not in 1..={}",
                window_size, BATCH_SIZE
            )));
        }

        let mut computer = PowerComputer::new(reader);
        let mut current = vec![0u32; BATCH_SIZE].into_boxed_slice();
        let mut next = vec![0u32; BATCH_SIZE].into_boxed_slice();

        let mut available = computer.read_batch(&mut current)? as u64;
        if available == BATCH_SIZE as u64 {
            available += computer.read_batch(&mut next)? as u64;
        }

        Ok(Self {
            computer,
            window_size,
            position: 0,
            available,
            current,
            next,
        })
    }

    pub fn size(&self) -> usize {
        self.window_size
    }

    /// Absolute stream position of the window start.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// True while a whole window of samples is available.
    pub fn is_full(&self) -> bool {
        self.position + self.window_size as u64 <= self.available
    }

    /// Power sample at offset `i` inside the window.
    ///
    /// # Panics
    /// If `i` is not smaller than the window size.
    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        assert!(i < self.window_size, "window index {} out of bounds", i);
        let idx = (self.position % BATCH_SIZE as u64) as usize + i;
        if idx < BATCH_SIZE {
            self.current[idx]
        } else {
            self.next[idx - BATCH_SIZE]
        }
    }

    /// Move the window forward by one sample.
    pub fn advance(&mut self) -> Result<()> {
        self.position += 1;
        if self.position % BATCH_SIZE as u64 == 0 {
            std::mem::swap(&mut self.current, &mut self.next);
            // The stream is only read further once the previous batch
            // came back complete.
            if self.available >= self.position + BATCH_SIZE as u64 {
                self.available += self.computer.read_batch(&mut self.next)? as u64;
            }
        }
        Ok(())
    }

    pub fn advance_by(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.advance()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Pseudo-random capture bytes; tests compare the window against a
    /// power vector computed in one go.
    fn capture(samples: usize) -> Vec<u8> {
        (0..samples)
            .flat_map(|k| {
                let v = ((k * 7919) % 4096) as u16;
                [v as u8, (v >> 8) as u8]
            })
            .collect()
    }

    fn reference_powers(bytes: &[u8]) -> Vec<u32> {
        let mut pc = PowerComputer::new(Cursor::new(bytes.to_vec()));
        let mut out = vec![0u32; bytes.len() / 4];
        let n = pc.read_batch(&mut out).unwrap();
        out.truncate(n);
        out
    }

    #[test]
    fn test_rejects_bad_window_size() {
        assert!(PowerWindow::new(Cursor::new(Vec::new()), 0).is_err());
        assert!(PowerWindow::new(Cursor::new(Vec::new()), BATCH_SIZE + 1).is_err());
    }

    #[test]
    fn test_get_follows_stream_across_batches() {
        let bytes = capture((BATCH_SIZE * 2 + 5_000) * 2);
        let reference = reference_powers(&bytes);
        let mut window = PowerWindow::new(Cursor::new(bytes), 100).unwrap();

        let checkpoints = [0u64, 1, 65_000, 65_500, 65_536, 131_000, 131_100];
        for &target in &checkpoints {
            window.advance_by((target - window.position()) as usize).unwrap();
            assert!(window.is_full());
            for i in 0..100 {
                assert_eq!(window.get(i), reference[target as usize + i], "at {} + {}", target, i);
            }
        }
    }

    #[test]
    fn test_is_full_until_stream_exhausted() {
        let power_samples = 300;
        let bytes = capture(power_samples * 2);
        let mut window = PowerWindow::new(Cursor::new(bytes), 100).unwrap();

        let mut steps = 0;
        while window.is_full() {
            window.advance().unwrap();
            steps += 1;
        }
        assert_eq!(steps, power_samples - 100 + 1);
    }

    #[test]
    fn test_short_stream_is_never_full() {
        let bytes = capture(50 * 2);
        let window = PowerWindow::new(Cursor::new(bytes), 100).unwrap();
        assert!(!window.is_full());
    }
}
