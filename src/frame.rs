//! Validated raw frames and ICAO addresses.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::bits;
use crate::byte_seq::be_u64;
use crate::crc::crc24;
use crate::error::{Error, Result};

/// Length of an extended squitter frame in bytes.
pub const FRAME_BYTES: usize = 14;
/// Length of an extended squitter frame in bits.
pub const FRAME_BITS: usize = FRAME_BYTES * 8;
/// Downlink format of ADS-B extended squitters.
pub const DF_EXTENDED_SQUITTER: u8 = 17;

/// 24-bit ICAO aircraft address, as six uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IcaoAddress(String);

impl IcaoAddress {
    pub fn new(hex: &str) -> Result<Self> {
        if hex.len() != 6 || !hex.bytes().all(|c| c.is_ascii_digit() || (b'A'..=b'F').contains(&c)) {
            return Err(Error::InvalidArgument(format!(
                "invalid ICAO address {:?}",
                hex
            )));
        }
        Ok(Self(hex.to_string()))
    }

    pub fn from_u32(addr: u32) -> Self {
        Self(format!("{:06X}", addr & 0xFF_FFFF))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IcaoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IcaoAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A CRC-checked extended squitter frame.
///
/// Holding a `RawFrame` built by [`RawFrame::of`] is proof that its CRC
/// was zero; nothing re-checks it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    timestamp_ns: u64,
    bytes: [u8; FRAME_BYTES],
}

impl RawFrame {
    /// Build a frame from already validated data.
    pub fn new(timestamp_ns: u64, bytes: [u8; FRAME_BYTES]) -> Self {
        Self {
            timestamp_ns,
            bytes,
        }
    }

    /// Build a frame only if its CRC checks out.
    pub fn of(timestamp_ns: u64, bytes: [u8; FRAME_BYTES]) -> Option<Self> {
        (crc24(&bytes) == 0).then(|| Self::new(timestamp_ns, bytes))
    }

    /// Parse a 28-digit hex frame, checking its CRC.
    pub fn from_hex(timestamp_ns: u64, hex: &str) -> Result<Option<Self>> {
        let seq = crate::byte_seq::ByteSequence::from_hex(hex)?;
        let bytes: [u8; FRAME_BYTES] = seq.as_slice().try_into().map_err(|_| {
            Error::InvalidArgument(format!(
                "frame must be {} bytes, got {}",
                FRAME_BYTES,
                seq.len()
            ))
        })?;
        Ok(Self::of(timestamp_ns, bytes))
    }

    /// Frame length implied by the first byte: 14 for extended
    /// squitters, 0 for anything this decoder does not handle.
    pub fn size(first_byte: u8) -> usize {
        if first_byte >> 3 == DF_EXTENDED_SQUITTER {
            FRAME_BYTES
        } else {
            0
        }
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.bytes
    }

    pub fn downlink_format(&self) -> u8 {
        self.bytes[0] >> 3
    }

    pub fn icao_address(&self) -> IcaoAddress {
        IcaoAddress::from_u32(be_u64(&self.bytes[1..4]) as u32)
    }

    /// The 56-bit ME field.
    pub fn payload(&self) -> u64 {
        be_u64(&self.bytes[4..11])
    }

    pub fn type_code(&self) -> u8 {
        type_code_of(self.payload())
    }

    pub fn to_hex(&self) -> String {
        crate::byte_seq::ByteSequence::new(self.bytes.to_vec()).to_hex()
    }
}

/// Type code carried in the top 5 bits of a 56-bit payload.
pub fn type_code_of(payload: u64) -> u8 {
    bits::slice(payload, 51, 5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(hex: &str) -> RawFrame {
        RawFrame::from_hex(100, hex).unwrap().unwrap()
    }

    #[test]
    fn test_field_accessors() {
        let f = frame("8D4840D6202CC371C32CE0576098");
        assert_eq!(f.downlink_format(), 17);
        assert_eq!(f.icao_address().as_str(), "4840D6");
        assert_eq!(f.payload(), 0x202CC371C32CE0);
        assert_eq!(f.type_code(), 4);
        assert_eq!(f.timestamp_ns(), 100);
        assert_eq!(f.to_hex(), "8D4840D6202CC371C32CE0576098");
    }

    #[test]
    fn test_position_type_code() {
        assert_eq!(frame("8D40621D58C382D690C8AC2863A7").type_code(), 11);
        assert_eq!(frame("8D485020994409940838175B284F").type_code(), 19);
    }

    #[test]
    fn test_of_rejects_bad_crc() {
        let mut bytes = *frame("8D4840D6202CC371C32CE0576098").bytes();
        bytes[6] ^= 0x10;
        assert!(RawFrame::of(0, bytes).is_none());
    }

    #[test]
    fn test_from_hex_wrong_length() {
        assert!(RawFrame::from_hex(0, "8D4840D6").is_err());
    }

    #[test]
    fn test_size() {
        assert_eq!(RawFrame::size(0x8D), FRAME_BYTES);
        assert_eq!(RawFrame::size(0x8F), FRAME_BYTES);
        assert_eq!(RawFrame::size(0x90), 0);
        assert_eq!(RawFrame::size(0x28), 0);
    }

    #[test]
    fn test_icao_address_validation() {
        assert!(IcaoAddress::new("4840D6").is_ok());
        assert!(IcaoAddress::new("4840d6").is_err());
        assert!(IcaoAddress::new("4840D").is_err());
        assert!(IcaoAddress::new("4840DG").is_err());
        assert_eq!(IcaoAddress::from_u32(0xA1).as_str(), "0000A1");
        assert_eq!("ABCDEF".parse::<IcaoAddress>().unwrap().to_string(), "ABCDEF");
    }
}
