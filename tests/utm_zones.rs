//!
//! UTM zone selection and codec, including the Norway/Svalbard special
//! zones and an explicit zone override, exercised against real locations.
//!
use approx::assert_abs_diff_eq;
use geotrans::constants::deg_to_rad;
use geotrans::grid::utm;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_ES: f64 = 0.006_694_379_990_14;

/// Bergen, Norway sits in zone 32's normal longitude range but west of the
/// dateline-ish split; the real test is zones 31/32 bulge for Norway.
#[test]
fn norway_bulge_widens_zone_32() {
    // 56-64N, 3-12E is folded into zone 32 even though plain longitude
    // division would put part of it in zone 31.
    let lon = deg_to_rad(4.5);
    let lat = deg_to_rad(60.0);
    let zone = utm::select_zone(lon, lat, None).unwrap();
    assert_eq!(zone, 32);
}

/// Svalbard (72-84N) splits into four wide zones: 31, 33, 35, 37.
#[test]
fn svalbard_special_zones() {
    let lat = deg_to_rad(78.0);
    assert_eq!(utm::select_zone(deg_to_rad(4.0), lat, None).unwrap(), 31);
    assert_eq!(utm::select_zone(deg_to_rad(15.0), lat, None).unwrap(), 33);
    assert_eq!(utm::select_zone(deg_to_rad(25.0), lat, None).unwrap(), 35);
    assert_eq!(utm::select_zone(deg_to_rad(35.0), lat, None).unwrap(), 37);
}

/// A point's natural zone can be overridden to an adjacent one (callers
/// comparing points near a zone boundary); an override far from the
/// point's own zone is rejected.
#[test]
fn zone_override_accepts_neighbor_rejects_distant() {
    let lon = deg_to_rad(-77.035);
    let lat = deg_to_rad(38.889);
    let natural = utm::select_zone(lon, lat, None).unwrap();
    assert_eq!(natural, 18);

    assert_eq!(utm::select_zone(lon, lat, Some(17)).unwrap(), 17);
    assert!(utm::select_zone(lon, lat, Some(1)).is_err());
}

/// Round-trips a mid-latitude point and a southern-hemisphere point (to
/// exercise the false-northing branch) through forward/inverse UTM.
#[test]
fn forward_inverse_round_trip_both_hemispheres() {
    for (lon_deg, lat_deg) in [(-77.035, 38.889), (151.209, -33.868)] {
        let lon = deg_to_rad(lon_deg);
        let lat = deg_to_rad(lat_deg);
        let (zone, hemisphere, easting, northing) = utm::convert_from_geodetic(lon, lat, WGS84_A, WGS84_ES, None).unwrap();
        let (lon2, lat2) = utm::convert_to_geodetic(zone, hemisphere, easting, northing, WGS84_A, WGS84_ES).unwrap();
        assert_abs_diff_eq!(lon, lon2, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, lat2, epsilon = 1e-9);
    }
}

/// Outside UTM's latitude coverage, zone selection fails rather than
/// silently clamping.
#[test]
fn latitude_outside_utm_coverage_is_rejected() {
    assert!(utm::select_zone(0.0, deg_to_rad(85.5), None).is_err());
    assert!(utm::select_zone(0.0, deg_to_rad(-81.5), None).is_err());
}
