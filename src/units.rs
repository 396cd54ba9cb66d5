//! Unit conversions.
//!
//! Angles travel through the decoder in turns; positions are stored as
//! T32, a signed 32-bit fixed-point where 2^32 units make a full turn.

use std::f64::consts::TAU;

/// T32 units per turn.
pub const T32_PER_TURN: f64 = 4_294_967_296.0;

pub const METERS_PER_FOOT: f64 = 0.3048;
pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;
pub const MPS_PER_KNOT: f64 = METERS_PER_NAUTICAL_MILE / 3600.0;

/// Turns to T32, rounded to the nearest unit.
///
/// Longitudes of exactly half a turn wrap to `i32::MIN`.
pub fn turns_to_t32(turns: f64) -> i32 {
    (turns * T32_PER_TURN).round() as i64 as i32
}

pub fn t32_to_turns(t32: i32) -> f64 {
    t32 as f64 / T32_PER_TURN
}

pub fn radians_to_turns(rad: f64) -> f64 {
    rad / TAU
}

pub fn turns_to_radians(turns: f64) -> f64 {
    turns * TAU
}

pub fn turns_to_degrees(turns: f64) -> f64 {
    turns * 360.0
}

pub fn t32_to_degrees(t32: i32) -> f64 {
    turns_to_degrees(t32_to_turns(t32))
}

pub fn feet_to_meters(ft: f64) -> f64 {
    ft * METERS_PER_FOOT
}

pub fn knots_to_mps(kts: f64) -> f64 {
    kts * MPS_PER_KNOT
}

pub fn mps_to_knots(mps: f64) -> f64 {
    mps / MPS_PER_KNOT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t32() {
        assert_eq!(turns_to_t32(0.25), 1 << 30);
        assert_eq!(turns_to_t32(-0.25), -(1 << 30));
        assert_eq!(turns_to_t32(0.5), i32::MIN);
        assert!((t32_to_degrees(1 << 30) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_angles() {
        assert!((turns_to_radians(0.5) - std::f64::consts::PI).abs() < 1e-12);
        assert!((radians_to_turns(turns_to_radians(0.1234)) - 0.1234).abs() < 1e-12);
        assert!((turns_to_degrees(0.25) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_units() {
        assert!((feet_to_meters(1000.0) - 304.8).abs() < 1e-9);
        assert!((knots_to_mps(1.0) - 0.514_444).abs() < 1e-6);
        assert!((mps_to_knots(knots_to_mps(159.0)) - 159.0).abs() < 1e-9);
    }
}
