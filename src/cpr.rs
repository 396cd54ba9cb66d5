//! Compact Position Reporting, global decoding.
//!
//! An even and an odd position message each carry a normalised latitude
//! and longitude inside their own zone grid. Combined, they pin down a
//! single global position.

use std::f64::consts::TAU;
use std::fmt;

use serde::Serialize;

use crate::decoder::Parity;
use crate::units;

/// Latitude zones for even messages.
const EVEN_LAT_ZONES: f64 = 60.0;
/// Latitude zones for odd messages.
const ODD_LAT_ZONES: f64 = 59.0;

/// Limit of valid latitudes, a quarter turn, in T32.
const MAX_LAT_T32: i32 = 1 << 30;

/// Geographic position, longitude and latitude in T32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeoPos {
    pub lon_t32: i32,
    pub lat_t32: i32,
}

impl GeoPos {
    /// Returns `None` when `lat_t32` lies outside `[-2^30, 2^30]`.
    pub fn new(lon_t32: i32, lat_t32: i32) -> Option<Self> {
        Self::is_valid_latitude(lat_t32).then_some(Self { lon_t32, lat_t32 })
    }

    pub fn is_valid_latitude(lat_t32: i32) -> bool {
        (-MAX_LAT_T32..=MAX_LAT_T32).contains(&lat_t32)
    }

    pub fn longitude_deg(&self) -> f64 {
        units::t32_to_degrees(self.lon_t32)
    }

    pub fn latitude_deg(&self) -> f64 {
        units::t32_to_degrees(self.lat_t32)
    }
}

impl fmt::Display for GeoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}°, {:.5}°)", self.longitude_deg(), self.latitude_deg())
    }
}

/// Decode a global position from an even (`x0`, `y0`) and an odd
/// (`x1`, `y1`) pair of normalised coordinates.
///
/// The result is the position of whichever message is `most_recent`.
/// `None` if the two messages straddle a longitude zone boundary or the
/// latitude comes out beyond the poles.
pub fn decode_position(x0: f64, y0: f64, x1: f64, y1: f64, most_recent: Parity) -> Option<GeoPos> {
    let z_lat = (y0 * ODD_LAT_ZONES - y1 * EVEN_LAT_ZONES).round_ties_even();
    let (z_lat0, z_lat1) = if z_lat < 0.0 {
        (z_lat + EVEN_LAT_ZONES, z_lat + ODD_LAT_ZONES)
    } else {
        (z_lat, z_lat)
    };

    let lat0 = recentre((z_lat0 + y0) / EVEN_LAT_ZONES);
    let lat1 = recentre((z_lat1 + y1) / ODD_LAT_ZONES);

    let nl = longitude_zones(lat0);
    if nl != longitude_zones(lat1) {
        return None;
    }

    let (lon0, lon1) = if nl == 1 {
        (x0, x1)
    } else {
        let nl = nl as f64;
        let z_lon = (x0 * (nl - 1.0) - x1 * nl).round_ties_even();
        let (z_lon0, z_lon1) = if z_lon < 0.0 {
            (z_lon + nl, z_lon + nl - 1.0)
        } else {
            (z_lon, z_lon)
        };
        ((z_lon0 + x0) / nl, (z_lon1 + x1) / (nl - 1.0))
    };

    let (lat, lon) = match most_recent {
        Parity::Even => (lat0, recentre(lon0)),
        Parity::Odd => (lat1, recentre(lon1)),
    };

    GeoPos::new(units::turns_to_t32(lon), units::turns_to_t32(lat))
}

/// Map an angle in `[0, 1)` turns to `[-0.5, 0.5)`.
fn recentre(turns: f64) -> f64 {
    if turns >= 0.5 { turns - 1.0 } else { turns }
}

/// Number of even longitude zones at `lat` (turns).
fn longitude_zones(lat: f64) -> u32 {
    let a = (1.0 - (TAU / EVEN_LAT_ZONES).cos()) / units::turns_to_radians(lat).cos().powi(2);
    let arg = (1.0 - a).acos();
    if arg.is_nan() || arg == 0.0 {
        return 1;
    }
    (TAU / arg).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: f64 = 131_072.0;

    #[test]
    fn test_decode_even_most_recent() {
        let pos = decode_position(0.851440, 0.720558, 0.830574, 0.591721, Parity::Even).unwrap();
        assert!((pos.latitude_deg() - 46.323349).abs() < 1e-5);
        assert!((pos.longitude_deg() - 7.476062).abs() < 1e-5);
    }

    #[test]
    fn test_decode_odd_most_recent() {
        let pos = decode_position(0.851440, 0.720558, 0.830574, 0.591721, Parity::Odd).unwrap();
        assert!((pos.latitude_deg() - 46.322365).abs() < 1e-5);
        assert!((pos.longitude_deg() - 7.475166).abs() < 1e-5);
    }

    #[test]
    fn test_decode_from_raw_fields() {
        let pos = decode_position(
            51_372.0 / SCALE,
            93_000.0 / SCALE,
            50_194.0 / SCALE,
            74_158.0 / SCALE,
            Parity::Even,
        )
        .unwrap();
        assert!((pos.latitude_deg() - 52.257202).abs() < 1e-5);
        assert!((pos.longitude_deg() - 3.919373).abs() < 1e-5);
    }

    #[test]
    fn test_zone_crossing_is_rejected() {
        assert!(decode_position(0.2, 0.97, 0.2, 0.111, Parity::Even).is_none());
        assert!(decode_position(0.2, 0.97, 0.2, 0.111, Parity::Odd).is_none());
    }

    #[test]
    fn test_latitude_beyond_pole_is_rejected() {
        // Both latitudes come out at 99 degrees.
        assert!(decode_position(0.3, 0.5, 0.3, 0.225, Parity::Even).is_none());
    }

    #[test]
    fn test_polar_cap_uses_raw_longitude() {
        let lat = 88.0 / 360.0;
        let y0 = (lat * EVEN_LAT_ZONES).fract();
        let y1 = (lat * ODD_LAT_ZONES).fract();

        let even = decode_position(0.25, y0, 0.7, y1, Parity::Even).unwrap();
        assert!((even.latitude_deg() - 88.0).abs() < 1e-6);
        assert!((even.longitude_deg() - 90.0).abs() < 1e-6);

        let odd = decode_position(0.25, y0, 0.7, y1, Parity::Odd).unwrap();
        assert!((odd.longitude_deg() + 108.0).abs() < 1e-6);
    }

    #[test]
    fn test_longitude_zones() {
        assert_eq!(longitude_zones(0.0), 59);
        assert_eq!(longitude_zones(87.0 / 360.0), 1);
        assert_eq!(longitude_zones(-87.0 / 360.0), 1);
        assert_eq!(longitude_zones(0.25), 1);
    }

    #[test]
    fn test_geo_pos_bounds() {
        assert!(GeoPos::new(0, 1 << 30).is_some());
        assert!(GeoPos::new(0, -(1 << 30)).is_some());
        assert!(GeoPos::new(0, (1 << 30) + 1).is_none());
        assert!(GeoPos::new(i32::MIN, 0).is_some());
    }
}
