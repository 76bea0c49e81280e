//!
//! MGRS/USNG encode-decode exercised against a handful of realistic
//! geodetic points, rather than a mechanical grid of inputs.
//!
use approx::assert_abs_diff_eq;
use geotrans::constants::deg_to_rad;
use geotrans::grid::mgrs;
use geotrans::precision::Precision;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_ES: f64 = 0.006_694_379_990_14;

/// One meter of ground distance in radians of latitude, used to size the
/// round-trip tolerance to the requested string precision.
fn one_meter_in_radians() -> f64 {
    1.0 / WGS84_A
}

/// Washington Monument: mid-latitude UTM coverage, five-digit precision.
#[test]
fn utm_zone_round_trip_full_precision() {
    let lon = deg_to_rad(-77.035);
    let lat = deg_to_rad(38.889);

    let encoded = mgrs::encode(lon, lat, WGS84_A, WGS84_ES, Precision::TenThousandthSecond, false).unwrap();
    assert!(encoded.starts_with("18S"), "unexpected MGRS string: {encoded}");

    let (lon2, lat2, precision) = mgrs::decode(&encoded, WGS84_A, WGS84_ES, false).unwrap();
    assert_eq!(precision, Precision::TenThousandthSecond);
    let tol = Precision::TenThousandthSecond.to_meters() * one_meter_in_radians();
    assert_abs_diff_eq!(lon, lon2, epsilon = tol);
    assert_abs_diff_eq!(lat, lat2, epsilon = tol);
}

/// Coarser precision truncates the string but the decode should still land
/// back within that precision's own grid cell.
#[test]
fn coarser_precision_round_trips_within_its_own_tolerance() {
    let lon = deg_to_rad(2.294);
    let lat = deg_to_rad(48.858);

    let encoded = mgrs::encode(lon, lat, WGS84_A, WGS84_ES, Precision::Minute, false).unwrap();
    let (lon2, lat2, precision) = mgrs::decode(&encoded, WGS84_A, WGS84_ES, false).unwrap();
    assert_eq!(precision, Precision::Minute);

    let tol = Precision::Minute.to_meters() * one_meter_in_radians();
    assert_abs_diff_eq!(lon, lon2, epsilon = tol);
    assert_abs_diff_eq!(lat, lat2, epsilon = tol);
}

/// Near the north pole, MGRS falls through to the UPS grid-square overlay
/// instead of a UTM zone/band pair.
#[test]
fn ups_polar_cap_round_trip() {
    let lon = deg_to_rad(10.0);
    let lat = deg_to_rad(88.5);

    let encoded = mgrs::encode(lon, lat, WGS84_A, WGS84_ES, Precision::Second, false).unwrap();
    assert!(encoded.starts_with('Z'), "expected a north-polar band letter, got: {encoded}");

    let (lon2, lat2, _) = mgrs::decode(&encoded, WGS84_A, WGS84_ES, false).unwrap();
    let tol = Precision::Second.to_meters() * one_meter_in_radians();
    assert_abs_diff_eq!(lon, lon2, epsilon = tol);
    assert_abs_diff_eq!(lat, lat2, epsilon = tol);
}

/// Clarke 1880 IGN-style ellipsoid codes use the legacy AL grid-square
/// offset; encoding with the modern offset and decoding with the legacy
/// one should land on a different, wrong grid square rather than erroring.
#[test]
fn legacy_offset_mismatch_does_not_silently_agree() {
    let lon = deg_to_rad(-77.035);
    let lat = deg_to_rad(38.889);

    let modern = mgrs::encode(lon, lat, WGS84_A, WGS84_ES, Precision::TenSecond, false).unwrap();
    let legacy = mgrs::encode(lon, lat, WGS84_A, WGS84_ES, Precision::TenSecond, true).unwrap();
    assert_ne!(modern, legacy);
}

#[test]
fn decode_rejects_garbage() {
    assert!(mgrs::decode("not an mgrs string", WGS84_A, WGS84_ES, false).is_err());
}
