//! Immutable byte sequences with hex conversion.

use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};

/// An immutable sequence of bytes.
///
/// Clones share the underlying buffer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteSequence {
    bytes: Bytes,
}

impl ByteSequence {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parse an even-length hex string (either case).
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() % 2 != 0 {
            return Err(Error::InvalidArgument(format!(
                "hex string has odd length {}",
                hex.len()
            )));
        }

        let mut bytes = Vec::with_capacity(hex.len() / 2);
        for chunk in hex.as_bytes().chunks_exact(2) {
            let high = hex_digit_val(chunk[0]);
            let low = hex_digit_val(chunk[1]);
            match (high, low) {
                (Some(h), Some(l)) => bytes.push((h << 4) | l),
                _ => {
                    return Err(Error::InvalidArgument(format!(
                        "invalid hex digits in {:?}",
                        hex
                    )));
                }
            }
        }

        Ok(Self::new(bytes))
    }

    /// Uppercase hex representation.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(self.bytes.len() * 2);
        for &b in self.bytes.iter() {
            s.push(HEX_CHARS[(b >> 4) as usize] as char);
            s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
        }
        s
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte at `index`, as an unsigned value.
    ///
    /// # Panics
    /// If `index` is out of bounds, like slice indexing.
    pub fn byte_at(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    /// Big-endian integer made of the bytes in `from..to`.
    ///
    /// At most 8 bytes fit in the result.
    pub fn bytes_in_range(&self, from: usize, to: usize) -> Result<u64> {
        if from >= to || to > self.bytes.len() {
            return Err(Error::InvalidArgument(format!(
                "byte range {}..{} outside sequence of length {}",
                from,
                to,
                self.bytes.len()
            )));
        }
        if to - from > 8 {
            return Err(Error::InvalidArgument(format!(
                "byte range {}..{} wider than 8 bytes",
                from, to
            )));
        }
        Ok(be_u64(&self.bytes[from..to]))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ByteSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ByteSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSequence({})", self.to_hex())
    }
}

/// Big-endian fold of up to 8 bytes.
pub(crate) fn be_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
