//! Sample pairs to power values.
//!
//! Keeps the last eight samples and, for every two new samples, emits
//! `(s7 - s5 + s3 - s1)^2 + (s6 - s4 + s2 - s0)^2` where `s0` is the
//! oldest sample in the history and `s7` the newest.

use std::io::Read;

use crate::error::Result;
use crate::samples::SampleDecoder;

const HISTORY_LEN: usize = 8;

/// Converts a sample stream into a power stream, one power value per
/// sample pair.
pub struct PowerComputer<R> {
    decoder: SampleDecoder<R>,
    history: [i32; HISTORY_LEN],
    samples: Vec<i16>,
}

impl<R: Read> PowerComputer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            decoder: SampleDecoder::new(reader),
            history: [0; HISTORY_LEN],
            samples: Vec::new(),
        }
    }

    /// Fill `out` with power values.
    ///
    /// Returns how many were produced; fewer than `out.len()` only at
    /// end of stream.
    pub fn read_batch(&mut self, out: &mut [u32]) -> Result<usize> {
        let wanted = out.len() * 2;
        if self.samples.len() < wanted {
            self.samples.resize(wanted, 0);
        }

        let n = self.decoder.read_batch(&mut self.samples[..wanted])?;
        let count = n / 2;

        let history = &mut self.history;
        for (power, pair) in out
            .iter_mut()
            .zip(self.samples[..count * 2].chunks_exact(2))
        {
            *power = push_pair(history, pair[0], pair[1]);
        }

        Ok(count)
    }
}

/// Shift one sample pair into `history` and return the new power.
#[inline]
fn push_pair(history: &mut [i32; HISTORY_LEN], first: i16, second: i16) -> u32 {
    history.copy_within(2.., 0);
    history[HISTORY_LEN - 2] = first as i32;
    history[HISTORY_LEN - 1] = second as i32;
    power_of(history)
}

#[inline]
fn power_of(s: &[i32; HISTORY_LEN]) -> u32 {
    let odd = s[7] - s[5] + s[3] - s[1];
    let even = s[6] - s[4] + s[2] - s[0];
    (odd * odd + even * even) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(samples: &[i16]) -> Vec<u8> {
        samples
            .iter()
            .flat_map(|&s| {
                let v = (s + 2048) as u16;
                [v as u8, (v >> 8) as u8]
            })
            .collect()
    }

    #[test]
    fn test_power_formula() {
        let s = [1, 2, 3, 4, 5, 6, 7, 8];
        // (8 - 6 + 4 - 2)^2 + (7 - 5 + 3 - 1)^2 = 16 + 16
        assert_eq!(power_of(&s), 32);
    }

    #[test]
    fn test_push_pair_shifts_history() {
        let mut history = [1, 2, 3, 4, 5, 6, 7, 8];
        let power = push_pair(&mut history, 9, 10);
        assert_eq!(history, [3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(power, power_of(&history));
    }

    #[test]
    fn test_history_starts_empty() {
        let bytes = encode(&[3, -4]);
        let mut pc = PowerComputer::new(Cursor::new(bytes));
        let mut out = [0u32; 1];
        assert_eq!(pc.read_batch(&mut out).unwrap(), 1);
        // Only s6 = 3 and s7 = -4 are non-zero.
        assert_eq!(out[0], 16 + 9);
    }

    #[test]
    fn test_quarter_rate_carrier_has_constant_power() {
        let a = 100i16;
        let carrier: Vec<i16> = (0..64).map(|k| [a, 0, -a, 0][k % 4]).collect();
        let mut pc = PowerComputer::new(Cursor::new(encode(&carrier)));
        let mut out = [0u32; 32];
        assert_eq!(pc.read_batch(&mut out).unwrap(), 32);
        for &p in &out[3..] {
            assert_eq!(p, 16 * (a as u32) * (a as u32));
        }
    }

    #[test]
    fn test_history_carries_across_batches() {
        let samples: Vec<i16> = (0..16).map(|k| (k * 37 % 200) as i16 - 100).collect();
        let bytes = encode(&samples);

        let mut whole = PowerComputer::new(Cursor::new(bytes.clone()));
        let mut all = [0u32; 8];
        whole.read_batch(&mut all).unwrap();

        let mut split = PowerComputer::new(Cursor::new(bytes));
        let mut first = [0u32; 3];
        let mut second = [0u32; 5];
        split.read_batch(&mut first).unwrap();
        split.read_batch(&mut second).unwrap();

        assert_eq!(&all[..3], &first);
        assert_eq!(&all[3..], &second);
    }
}
