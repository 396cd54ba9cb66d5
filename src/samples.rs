//! Raw capture bytes to signed samples.
//!
//! The capture format stores each 12-bit unsigned sample in two bytes,
//! least significant byte first. Removing the mid-scale bias of 2048
//! centres the samples on zero.

use std::io::{ErrorKind, Read};

use crate::error::{Error, Result};

/// Mid-scale bias of the 12-bit converter.
pub const SAMPLE_BIAS: i16 = 2048;

const BYTES_PER_SAMPLE: usize = 2;

/// Decodes a byte stream into centred signed samples, in batches.
pub struct SampleDecoder<R> {
    reader: R,
    raw: Vec<u8>,
}

impl<R: Read> SampleDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            raw: Vec::new(),
        }
    }

    /// Fill `out` with decoded samples.
    ///
    /// Returns the number of samples written, which is smaller than
    /// `out.len()` only when the stream ended.
    pub fn read_batch(&mut self, out: &mut [i16]) -> Result<usize> {
        let wanted = out.len() * BYTES_PER_SAMPLE;
        if self.raw.len() < wanted {
            self.raw.resize(wanted, 0);
        }

        let total_read = read_fully(&mut self.reader, &mut self.raw[..wanted])?;
        let count = total_read / BYTES_PER_SAMPLE;

        for (sample, chunk) in out
            .iter_mut()
            .zip(self.raw[..count * BYTES_PER_SAMPLE].chunks_exact(BYTES_PER_SAMPLE))
        {
            *sample = decode_sample(chunk[0], chunk[1]);
        }

        Ok(count)
    }
}

/// Decode one little-endian 12-bit sample and remove the bias.
#[inline]
pub fn decode_sample(low: u8, high: u8) -> i16 {
    // The top nibble of the high byte is padding and is ignored.
    ((((high as u16) << 8) | low as u16) & 0x0FFF) as i16 - SAMPLE_BIAS
}

/// Read until `buf` is full or the stream ends.
pub(crate) fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total_read = 0;
    while total_read < buf.len() {
        match reader.read(&mut buf[total_read..]) {
            Ok(0) => break,
            Ok(n) => total_read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(total_read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_sample_removes_bias() {
        assert_eq!(decode_sample(0x00, 0x08), 0);
        assert_eq!(decode_sample(0x00, 0x00), -2048);
        assert_eq!(decode_sample(0xFF, 0x0F), 2047);
        assert_eq!(decode_sample(0x34, 0x0A), 0x0A34 - 2048);
    }

    #[test]
    fn test_decode_sample_ignores_padding_nibble() {
        assert_eq!(decode_sample(0x00, 0xF8), 0);
        assert_eq!(decode_sample(0x34, 0x5A), decode_sample(0x34, 0x0A));
    }

    #[test]
    fn test_read_batch() {
        let bytes = vec![0x00, 0x08, 0xFF, 0x0F, 0x00, 0x00];
        let mut decoder = SampleDecoder::new(Cursor::new(bytes));
        let mut out = [0i16; 3];
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 3);
        assert_eq!(out, [0, 2047, -2048]);
    }

    #[test]
    fn test_short_read_at_end_of_stream() {
        // Two and a half samples: the dangling byte is ignored.
        let bytes = vec![0x00, 0x08, 0x01, 0x08, 0x05];
        let mut decoder = SampleDecoder::new(Cursor::new(bytes));
        let mut out = [0i16; 4];
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 2);
        assert_eq!(&out[..2], &[0, 1]);
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 0);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "device gone"))
        }
    }

    #[test]
    fn test_io_errors_propagate() {
        let mut decoder = SampleDecoder::new(FailingReader);
        let mut out = [0i16; 4];
        assert!(matches!(decoder.read_batch(&mut out), Err(Error::Io(_))));
    }
}
