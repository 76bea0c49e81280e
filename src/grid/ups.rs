//!
//! Universal Polar Stereographic hemisphere split and codec
//!
//! UPS covers the polar caps that UTM leaves out: south of -80 degrees
//! and north of +84 degrees. The false origin and scale factor are
//! fixed; only the pole (hemisphere) varies.
//!
use crate::constants::deg_to_rad;
use crate::errors::{Error, Result};
use crate::projection::polar_stereographic::PolarStereographic;
use crate::projection::{ParamSet, Projection};

pub const MIN_NORTH_LATITUDE: f64 = 84.0;
pub const MAX_SOUTH_LATITUDE: f64 = -80.0;

const SCALE_FACTOR: f64 = 0.994;
const FALSE_EASTING: f64 = 2_000_000.0;
const FALSE_NORTHING: f64 = 2_000_000.0;
const MIN_EASTING: f64 = 0.0;
const MAX_EASTING: f64 = 4_000_000.0;
const MIN_NORTHING: f64 = 0.0;
const MAX_NORTHING: f64 = 4_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

/// True when `lat` (radians) falls in the UPS polar caps rather than the
/// UTM belt.
pub fn covers(lat: f64) -> bool {
    let lat_deg = lat.to_degrees();
    !(MAX_SOUTH_LATITUDE..MIN_NORTH_LATITUDE).contains(&lat_deg)
}

fn projection_for(hemisphere: Hemisphere, a: f64, es: f64) -> Result<PolarStereographic> {
    let origin_latitude = match hemisphere {
        Hemisphere::North => deg_to_rad(90.0),
        Hemisphere::South => deg_to_rad(-90.0),
    };
    PolarStereographic::new(ParamSet {
        a,
        es,
        central_meridian: 0.0,
        origin_latitude,
        scale_factor: SCALE_FACTOR,
        false_easting: FALSE_EASTING,
        false_northing: FALSE_NORTHING,
    })
}

/// Geodetic (lon, lat radians) -> (hemisphere, easting, northing).
pub fn convert_from_geodetic(lon: f64, lat: f64, a: f64, es: f64) -> Result<(Hemisphere, f64, f64)> {
    if !covers(lat) {
        return Err(Error::Latitude);
    }
    let hemisphere = if lat < 0.0 { Hemisphere::South } else { Hemisphere::North };
    let ps = projection_for(hemisphere, a, es)?;
    let (easting, northing) = ps.convert_from_geodetic(lon, lat)?;

    if !(MIN_EASTING..=MAX_EASTING).contains(&easting) {
        return Err(Error::Easting);
    }
    if !(MIN_NORTHING..=MAX_NORTHING).contains(&northing) {
        return Err(Error::Northing);
    }

    Ok((hemisphere, easting, northing))
}

/// (hemisphere, easting, northing) -> geodetic (lon, lat radians).
pub fn convert_to_geodetic(hemisphere: Hemisphere, easting: f64, northing: f64, a: f64, es: f64) -> Result<(f64, f64)> {
    if !(MIN_EASTING..=MAX_EASTING).contains(&easting) {
        return Err(Error::Easting);
    }
    if !(MIN_NORTHING..=MAX_NORTHING).contains(&northing) {
        return Err(Error::Northing);
    }
    let ps = projection_for(hemisphere, a, es)?;
    ps.convert_to_geodetic(easting, northing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const WGS84_A: f64 = 6_378_137.0;
    const WGS84_ES: f64 = 0.00669437999014;

    #[test]
    fn utm_belt_is_not_covered() {
        assert!(!covers(deg_to_rad(45.0)));
    }

    #[test]
    fn north_cap_is_covered() {
        assert!(covers(deg_to_rad(85.0)));
    }

    #[test]
    fn south_cap_is_covered() {
        assert!(covers(deg_to_rad(-85.0)));
    }

    #[test]
    fn roundtrip_north() {
        let lon = deg_to_rad(123.0);
        let lat = deg_to_rad(86.0);
        let (hemisphere, e, n) = convert_from_geodetic(lon, lat, WGS84_A, WGS84_ES).unwrap();
        assert_eq!(hemisphere, Hemisphere::North);
        let (lon2, lat2) = convert_to_geodetic(hemisphere, e, n, WGS84_A, WGS84_ES).unwrap();
        assert_abs_diff_eq!(lon, lon2, epsilon = 1e-7);
        assert_abs_diff_eq!(lat, lat2, epsilon = 1e-7);
    }

    #[test]
    fn rejects_utm_belt_latitude() {
        assert!(convert_from_geodetic(0.0, deg_to_rad(10.0), WGS84_A, WGS84_ES).is_err());
    }
}
