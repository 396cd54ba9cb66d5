//! ADS-B extended squitter payload decoder
//!
//!  Turns CRC-checked frames into typed messages. Three kinds are
//!  understood: identification (TC 1-4), airborne position with
//!  barometric altitude (TC 9-18) and airborne velocity (TC 19).
//!
//! Payload fields are addressed by their LSB offset in the 56-bit ME
//! word; see `bits`.

use std::f64::consts::TAU;
use std::fmt;

use serde::Serialize;

use crate::bits::{bit, slice};
use crate::error::{Error, Result};
use crate::frame::{IcaoAddress, RawFrame, type_code_of};
use crate::units;

/// Maximum number of characters in a callsign.
pub const CALL_SIGN_MAX_LEN: usize = 8;

/// Width of a normalised CPR coordinate, in bits.
const CPR_BITS: u32 = 17;
const CPR_SCALE: f64 = (1u32 << CPR_BITS) as f64;

/// Flight callsign: up to 8 characters from `[A-Z0-9 ]`, no trailing
/// spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CallSign(String);

impl CallSign {
    pub fn new(s: &str) -> Result<Self> {
        let valid = s.len() <= CALL_SIGN_MAX_LEN
            && s.bytes().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == b' ')
            && !s.ends_with(' ');
        if !valid {
            return Err(Error::InvalidArgument(format!("invalid call sign {:?}", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CPR format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even = 0,
    Odd = 1,
}

impl Parity {
    pub fn from_bit(odd: bool) -> Self {
        if odd { Parity::Odd } else { Parity::Even }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

/// What the angle of a velocity message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityKind {
    /// Ground speed with track over ground (sub-types 1 and 2).
    Ground,
    /// Airspeed with heading (sub-types 3 and 4).
    Airspeed,
}

/// TC 1-4: identification and category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationMessage {
    pub timestamp_ns: u64,
    pub icao: IcaoAddress,
    pub category: u8,
    pub call_sign: CallSign,
}

/// TC 9-18: airborne position, barometric altitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMessage {
    pub timestamp_ns: u64,
    pub icao: IcaoAddress,
    pub altitude_m: f64,
    pub parity: Parity,
    /// Normalised local longitude in `[0, 1)`.
    pub x: f64,
    /// Normalised local latitude in `[0, 1)`.
    pub y: f64,
}

/// TC 19: airborne velocity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityMessage {
    pub timestamp_ns: u64,
    pub icao: IcaoAddress,
    pub speed_mps: f64,
    /// Track or heading in degrees, `[0, 360)`.
    pub track_or_heading_deg: f64,
    pub kind: VelocityKind,
}

/// Decoded ADS-B message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    Identification(IdentificationMessage),
    Position(PositionMessage),
    Velocity(VelocityMessage),
}

impl Message {
    pub fn icao(&self) -> &IcaoAddress {
        match self {
            Message::Identification(m) => &m.icao,
            Message::Position(m) => &m.icao,
            Message::Velocity(m) => &m.icao,
        }
    }

    pub fn timestamp_ns(&self) -> u64 {
        match self {
            Message::Identification(m) => m.timestamp_ns,
            Message::Position(m) => m.timestamp_ns,
            Message::Velocity(m) => m.timestamp_ns,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Identification(_) => "identification",
            Message::Position(_) => "position",
            Message::Velocity(_) => "velocity",
        }
    }
}

/// Decode a frame into a message.
///
/// Position, identification and velocity decoders are tried in that
/// order; the first one that applies wins. `None` means the frame
/// carries nothing this decoder understands, or carries invalid data.
pub fn decode(frame: &RawFrame) -> Option<Message> {
    decode_position(frame)
        .map(Message::Position)
        .or_else(|| decode_identification(frame).map(Message::Identification))
        .or_else(|| decode_velocity(frame).map(Message::Velocity))
}

// ---------------------------------------------------------------------------
// Identification
// ---------------------------------------------------------------------------

const CALL_SIGN_CHARS: u32 = 8;
const CHAR_BITS: u32 = 6;

pub fn decode_identification(frame: &RawFrame) -> Option<IdentificationMessage> {
    let payload = frame.payload();
    let tc = type_code_of(payload);
    if !(1..=4).contains(&tc) {
        return None;
    }

    let ca = slice(payload, 48, 3) as u8;
    let category = ((14 - tc) << 4) | ca;

    let mut s = String::with_capacity(CALL_SIGN_CHARS as usize);
    for i in (0..CALL_SIGN_CHARS).rev() {
        let code = slice(payload, i * CHAR_BITS, CHAR_BITS);
        s.push(call_sign_char(code)?);
    }

    let call_sign = CallSign::new(s.trim_end_matches(' ')).ok()?;

    Some(IdentificationMessage {
        timestamp_ns: frame.timestamp_ns(),
        icao: frame.icao_address(),
        category,
        call_sign,
    })
}

/// Map a 6-bit callsign code to its character.
///
/// Codes outside letters, digits and space invalidate the whole
/// callsign.
fn call_sign_char(code: u32) -> Option<char> {
    match code {
        1..=26 => Some((b'A' + (code - 1) as u8) as char),
        48..=57 => Some((b'0' + (code - 48) as u8) as char),
        32 => Some(' '),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Airborne position
// ---------------------------------------------------------------------------

pub fn decode_position(frame: &RawFrame) -> Option<PositionMessage> {
    let payload = frame.payload();
    let tc = type_code_of(payload);
    if !(9..=18).contains(&tc) {
        return None;
    }

    let altitude_ft = decode_altitude(slice(payload, 36, 12) as u16)?;
    let parity = Parity::from_bit(bit(payload, 34));
    let y = slice(payload, 17, CPR_BITS) as f64 / CPR_SCALE;
    let x = slice(payload, 0, CPR_BITS) as f64 / CPR_SCALE;

    Some(PositionMessage {
        timestamp_ns: frame.timestamp_ns(),
        icao: frame.icao_address(),
        altitude_m: units::feet_to_meters(altitude_ft as f64),
        parity,
        x,
        y,
    })
}

/// Decode the 12-bit altitude field of an airborne position, in feet.
///
/// With the Q bit set the other 11 bits count 25 ft steps from
/// -1000 ft. Otherwise the field is a Gillham code, bit order
/// `C1 A1 C2 A2 C4 A4 B1 D1 B2 D2 B4 D4` from the top.
pub fn decode_altitude(ac12: u16) -> Option<i32> {
    let q_bit = (ac12 >> 4) & 1 == 1;
    if q_bit {
        let n = ((ac12 >> 5) << 4) | (ac12 & 0x0F);
        return Some(-1000 + n as i32 * 25);
    }

    let gillham = untangle_gillham(ac12);
    let mut hundreds = gray_to_binary(gillham & 0x7, 3);
    let five_hundreds = gray_to_binary(gillham >> 3, 9);

    if matches!(hundreds, 0 | 5 | 6) {
        return None;
    }
    if hundreds == 7 {
        hundreds = 5;
    }
    if five_hundreds % 2 == 1 {
        hundreds = 6 - hundreds;
    }

    Some(-1300 + 100 * hundreds as i32 + 500 * five_hundreds as i32)
}

/// Source bit for each output bit, output MSB first:
/// `D1 D2 D4 A1 A2 A4 B1 B2 B4 C1 C2 C4`.
const GILLHAM_ORDER: [u16; 12] = [4, 2, 0, 10, 8, 6, 5, 3, 1, 11, 9, 7];

fn untangle_gillham(ac12: u16) -> u16 {
    GILLHAM_ORDER
        .iter()
        .fold(0u16, |acc, &src| (acc << 1) | ((ac12 >> src) & 1))
}

/// Convert a `width`-bit Gray code to binary.
fn gray_to_binary(gray: u16, width: u32) -> u16 {
    let mut binary = gray;
    for shift in 1..width {
        binary ^= gray >> shift;
    }
    binary
}

// ---------------------------------------------------------------------------
// Airborne velocity
// ---------------------------------------------------------------------------

pub fn decode_velocity(frame: &RawFrame) -> Option<VelocityMessage> {
    let payload = frame.payload();
    if type_code_of(payload) != 19 {
        return None;
    }

    let sub_type = slice(payload, 48, 3);
    let (speed_kts, angle_turns, kind) = match sub_type {
        1 | 2 => {
            let (speed, track) = ground_vector(payload)?;
            let scale = if sub_type == 2 { 4.0 } else { 1.0 };
            (speed * scale, track, VelocityKind::Ground)
        }
        3 | 4 => {
            let (speed, heading) = airspeed_heading(payload)?;
            let scale = if sub_type == 4 { 4.0 } else { 1.0 };
            (speed * scale, heading, VelocityKind::Airspeed)
        }
        _ => return None,
    };

    Some(VelocityMessage {
        timestamp_ns: frame.timestamp_ns(),
        icao: frame.icao_address(),
        speed_mps: units::knots_to_mps(speed_kts),
        track_or_heading_deg: units::turns_to_degrees(angle_turns),
        kind,
    })
}

/// Ground speed (kt, subsonic units) and track (turns) from the
/// east-west / north-south components.
fn ground_vector(payload: u64) -> Option<(f64, f64)> {
    let west = bit(payload, 42);
    let v_ew = slice(payload, 32, 10);
    let south = bit(payload, 31);
    let v_ns = slice(payload, 21, 10);

    // 0 means "no velocity information".
    if v_ew == 0 || v_ns == 0 {
        return None;
    }

    let vx = signed(v_ew - 1, west);
    let vy = signed(v_ns - 1, south);

    let speed = vx.hypot(vy);
    let track = units::radians_to_turns(vx.atan2(vy).rem_euclid(TAU));
    Some((speed, track))
}

/// Airspeed (kt, subsonic units) and heading (turns).
fn airspeed_heading(payload: u64) -> Option<(f64, f64)> {
    let heading_available = bit(payload, 42);
    if !heading_available {
        return None;
    }
    let heading = slice(payload, 32, 10) as f64 / 1024.0;

    let airspeed = slice(payload, 21, 10);
    if airspeed == 0 {
        return None;
    }

    Some(((airspeed - 1) as f64, heading))
}

fn signed(magnitude: u32, negative: bool) -> f64 {
    if negative {
        -(magnitude as f64)
    } else {
        magnitude as f64
    }
}
