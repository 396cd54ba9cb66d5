//! Bit field extraction over 64-bit words.
//!
//! Bit 0 is the least significant bit. Extended squitter payloads are
//! handled as 56-bit words, so every field in `decoder` is addressed by
//! its LSB offset inside the word.

use crate::error::{Error, Result};

const WORD_BITS: u32 = u64::BITS;

/// Extract the unsigned `size`-bit field starting at bit `start`.
///
/// Fails with `InvalidSize` when `size` is 0 or at least 32, and with
/// `OutOfRange` when the field does not fit inside the word.
pub fn extract(value: u64, start: u32, size: u32) -> Result<u32> {
    if size == 0 || size >= 32 {
        return Err(Error::InvalidSize { size });
    }
    if start.checked_add(size).is_none_or(|end| end > WORD_BITS) {
        return Err(Error::OutOfRange { start, size });
    }
    Ok(slice(value, start, size))
}

/// Test the bit at `index`.
pub fn test_bit(value: u64, index: u32) -> Result<bool> {
    if index >= WORD_BITS {
        return Err(Error::OutOfRange { start: index, size: 1 });
    }
    Ok((value >> index) & 1 == 1)
}

/// Unchecked extraction for fixed, known-good field layouts.
#[inline]
pub(crate) const fn slice(value: u64, start: u32, size: u32) -> u32 {
    debug_assert!(size > 0 && size < 32 && start + size <= WORD_BITS);
    ((value >> start) & ((1u64 << size) - 1)) as u32
}

/// Unchecked single-bit test, see [`slice`].
#[inline]
pub(crate) const fn bit(value: u64, index: u32) -> bool {
    debug_assert!(index < WORD_BITS);
    (value >> index) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_matches_shift_and_mask() {
        let v = 0xFEDC_BA98_7654_3210u64;
        for start in 0..64u32 {
            for size in 1..32u32 {
                if start + size > 64 {
                    continue;
                }
                let expected = ((v >> start) & ((1u64 << size) - 1)) as u32;
                assert_eq!(extract(v, start, size).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_extract_known_fields() {
        assert_eq!(extract(0b1011_0000, 4, 4).unwrap(), 0b1011);
        assert_eq!(extract(u64::MAX, 33, 31).unwrap(), 0x7FFF_FFFF);
        assert_eq!(extract(1 << 63, 63, 1).unwrap(), 1);
    }

    #[test]
    fn test_extract_invalid_size() {
        assert!(matches!(extract(0, 0, 0), Err(Error::InvalidSize { size: 0 })));
        assert!(matches!(extract(0, 0, 32), Err(Error::InvalidSize { size: 32 })));
        assert!(matches!(extract(0, 0, 64), Err(Error::InvalidSize { .. })));
    }

    #[test]
    fn test_extract_out_of_range() {
        assert!(matches!(extract(0, 60, 5), Err(Error::OutOfRange { .. })));
        assert!(matches!(extract(0, 64, 1), Err(Error::OutOfRange { .. })));
        assert!(matches!(extract(0, u32::MAX, 4), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_test_bit() {
        let v = 0x8000_0000_0000_0001u64;
        assert!(test_bit(v, 0).unwrap());
        assert!(!test_bit(v, 1).unwrap());
        assert!(test_bit(v, 63).unwrap());
        assert!(test_bit(v, 64).is_err());
    }
}
