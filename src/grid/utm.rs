//!
//! UTM zone selection and codec
//!
//! Drives the Transverse Mercator projection module with a per-zone
//! central meridian, leaving the projection math itself to
//! `crate::projection::transverse_mercator`.
//!
use crate::constants::{deg_to_rad, PI};
use crate::errors::{Error, Result};
use crate::projection::transverse_mercator::TransverseMercator;
use crate::projection::{ParamSet, Projection};

const MIN_LAT: f64 = -80.5 * PI / 180.0;
const MAX_LAT: f64 = 84.5 * PI / 180.0;
const MIN_EASTING: f64 = 100_000.0;
const MAX_EASTING: f64 = 900_000.0;
const MIN_NORTHING: f64 = 0.0;
const MAX_NORTHING: f64 = 10_000_000.0;
const EPSILON: f64 = 1.75e-7;
const FALSE_EASTING: f64 = 500_000.0;
const SCALE_FACTOR: f64 = 0.9996;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

/// Central meridian, in radians, for UTM zone `zone` (1..=60).
pub fn central_meridian(zone: i32) -> f64 {
    if zone >= 31 {
        deg_to_rad((6 * zone - 183) as f64)
    } else {
        deg_to_rad((6 * zone + 177) as f64)
    }
}

/// The "natural" zone for a longitude already normalized into `[0, 2*pi)`,
/// ignoring the Norway/Svalbard special cases and any override.
fn natural_zone(longitude_0_2pi: f64) -> i32 {
    let zone = if longitude_0_2pi < PI {
        31 + ((longitude_0_2pi + 1.0e-10) * 180.0 / PI / 6.0) as i32
    } else {
        (((longitude_0_2pi + 1.0e-10) * 180.0 / PI / 6.0) as i32) - 29
    };
    if zone > 60 {
        1
    } else {
        zone
    }
}

fn apply_special_zones(zone: i32, lat_deg: i32, lon_deg: i32) -> i32 {
    let mut zone = zone;
    if (56..64).contains(&lat_deg) && (0..3).contains(&lon_deg) {
        zone = 31;
    }
    if (56..64).contains(&lat_deg) && (3..12).contains(&lon_deg) {
        zone = 32;
    }
    if lat_deg > 71 && (0..9).contains(&lon_deg) {
        zone = 31;
    }
    if lat_deg > 71 && (9..21).contains(&lon_deg) {
        zone = 33;
    }
    if lat_deg > 71 && (21..33).contains(&lon_deg) {
        zone = 35;
    }
    if lat_deg > 71 && (33..42).contains(&lon_deg) {
        zone = 37;
    }
    zone
}

fn apply_override(natural: i32, requested: i32) -> Result<i32> {
    if (natural == 1 && requested == 60) || (natural == 60 && requested == 1) {
        Ok(requested)
    } else if (natural - 1..=natural + 1).contains(&requested) {
        Ok(requested)
    } else {
        Err(Error::ZoneOverride)
    }
}

/// Select the UTM zone for `(lon, lat)` in radians, honoring the
/// Norway/Svalbard special cases unless `zone_override` pins one.
pub fn select_zone(lon: f64, lat: f64, zone_override: Option<i32>) -> Result<i32> {
    if lat < MIN_LAT - EPSILON || lat >= MAX_LAT + EPSILON {
        return Err(Error::Latitude);
    }
    if lon < -PI - EPSILON || lon > 2.0 * PI + EPSILON {
        return Err(Error::Longitude);
    }

    let lon = if lon < 0.0 { lon + 2.0 * PI } else { lon };
    let lat_deg = (lat * 180.0 / PI) as i32;
    let lon_deg = (lon * 180.0 / PI) as i32;

    let natural = natural_zone(lon);

    match zone_override {
        Some(z) => apply_override(natural, z),
        None => Ok(apply_special_zones(natural, lat_deg, lon_deg)),
    }
}

fn projection_for(zone: i32, a: f64, es: f64) -> Result<TransverseMercator> {
    if !(1..=60).contains(&zone) {
        return Err(Error::Zone(zone));
    }
    TransverseMercator::new(ParamSet {
        a,
        es,
        central_meridian: central_meridian(zone),
        origin_latitude: 0.0,
        scale_factor: SCALE_FACTOR,
        false_easting: FALSE_EASTING,
        false_northing: 0.0,
    })
}

/// Geodetic (lon, lat radians) -> (zone, hemisphere, easting, northing).
pub fn convert_from_geodetic(
    lon: f64,
    lat: f64,
    a: f64,
    es: f64,
    zone_override: Option<i32>,
) -> Result<(i32, Hemisphere, f64, f64)> {
    let zone = select_zone(lon, lat, zone_override)?;
    let tm = projection_for(zone, a, es)?;

    let lon = if lon < 0.0 { lon + 2.0 * PI } else { lon };
    let lat = if lat > -1.0e-9 && lat < 0.0 { 0.0 } else { lat };

    let (hemisphere, false_northing) = if lat < 0.0 { (Hemisphere::South, 10_000_000.0) } else { (Hemisphere::North, 0.0) };

    let (easting, northing) = tm.convert_from_geodetic(lon, lat)?;
    let northing = northing + false_northing;

    if !(MIN_EASTING..=MAX_EASTING).contains(&easting) {
        return Err(Error::Easting);
    }
    if !(MIN_NORTHING..=MAX_NORTHING).contains(&northing) {
        return Err(Error::Northing);
    }

    Ok((zone, hemisphere, easting, northing))
}

/// (zone, hemisphere, easting, northing) -> geodetic (lon, lat radians).
pub fn convert_to_geodetic(zone: i32, hemisphere: Hemisphere, easting: f64, northing: f64, a: f64, es: f64) -> Result<(f64, f64)> {
    if !(1..=60).contains(&zone) {
        return Err(Error::Zone(zone));
    }
    if !(MIN_EASTING..=MAX_EASTING).contains(&easting) {
        return Err(Error::Easting);
    }
    if !(MIN_NORTHING..=MAX_NORTHING).contains(&northing) {
        return Err(Error::Northing);
    }

    let tm = projection_for(zone, a, es)?;
    let false_northing = if hemisphere == Hemisphere::South { 10_000_000.0 } else { 0.0 };
    tm.convert_to_geodetic(easting, northing - false_northing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const WGS84_A: f64 = 6_378_137.0;
    const WGS84_ES: f64 = 0.00669437999014;

    #[test]
    fn zone_31_at_prime_meridian() {
        assert_eq!(select_zone(0.001, 0.5, None).unwrap(), 31);
    }

    #[test]
    fn norway_special_zone_32() {
        let lon = deg_to_rad(7.0);
        let lat = deg_to_rad(60.0);
        assert_eq!(select_zone(lon, lat, None).unwrap(), 32);
    }

    #[test]
    fn svalbard_special_zone_33() {
        let lon = deg_to_rad(15.0);
        let lat = deg_to_rad(75.0);
        assert_eq!(select_zone(lon, lat, None).unwrap(), 33);
    }

    #[test]
    fn override_must_be_within_one_zone() {
        assert!(select_zone(0.001, 0.5, Some(45)).is_err());
        assert!(select_zone(0.001, 0.5, Some(32)).is_ok());
    }

    #[test]
    fn roundtrip() {
        let lon = deg_to_rad(-77.0);
        let lat = deg_to_rad(38.9);
        let (zone, hemisphere, e, n) = convert_from_geodetic(lon, lat, WGS84_A, WGS84_ES, None).unwrap();
        assert_eq!(zone, 18);
        assert_eq!(hemisphere, Hemisphere::North);
        let (lon2, lat2) = convert_to_geodetic(zone, hemisphere, e, n, WGS84_A, WGS84_ES).unwrap();
        assert_abs_diff_eq!(lon, lon2, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, lat2, epsilon = 1e-9);
    }

    #[test]
    fn southern_hemisphere_uses_false_northing() {
        let lon = deg_to_rad(-70.0);
        let lat = deg_to_rad(-33.0);
        let (_, hemisphere, _e, n) = convert_from_geodetic(lon, lat, WGS84_A, WGS84_ES, None).unwrap();
        assert_eq!(hemisphere, Hemisphere::South);
        assert!(n > 5_000_000.0);
    }
}
