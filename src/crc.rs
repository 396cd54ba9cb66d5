//! CRC-24 for Mode S extended squitter frames.
//!
//! Generator polynomial 0xFFF409 (the 25th, implicit bit dropped).
//! The table-driven version processes one byte per step; the table
//! itself is built at compile time from the bitwise algorithm applied
//! to every single byte value, augmented by 24 zero bits.
//!
//! A frame whose last three bytes hold the parity of the preceding
//! bytes has a CRC of zero.

/// Generator polynomial, without its leading x^24 term.
pub const GENERATOR: u32 = 0xFFF409;

const CRC_BITS: u32 = 24;
const CRC_MASK: u32 = (1 << CRC_BITS) - 1;

static CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = crc_bitwise(&[i as u8]);
        i += 1;
    }
    table
}

/// Bit-at-a-time CRC over `bytes` followed by 24 zero bits.
const fn crc_bitwise(bytes: &[u8]) -> u32 {
    let mut crc = 0u32;
    let mut i = 0;
    while i < bytes.len() + 3 {
        let byte = if i < bytes.len() { bytes[i] } else { 0 };
        let mut bit = 8u32;
        while bit > 0 {
            bit -= 1;
            let top = (crc >> (CRC_BITS - 1)) & 1;
            crc = ((crc << 1) | ((byte >> bit) & 1) as u32) & CRC_MASK;
            if top == 1 {
                crc ^= GENERATOR;
            }
        }
        i += 1;
    }
    crc
}

/// Compute the 24-bit CRC of `bytes`.
///
/// Returns 0 for a frame that carries its own valid parity bits.
pub fn crc24(bytes: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &b in bytes {
        crc = step(crc, b);
    }
    // Flush the 24 implicit zero bits.
    for _ in 0..3 {
        crc = step(crc, 0);
    }
    crc
}

#[inline]
fn step(crc: u32, byte: u8) -> u32 {
    let top = (crc >> (CRC_BITS - 8)) as usize & 0xFF;
    (((crc << 8) | byte as u32) ^ CRC_TABLE[top]) & CRC_MASK
}
