//!
//! Datum shift engine, exercised without the file-backed datum/ellipsoid
//! tables (those libraries are covered by their own in-module tests).
//!
use approx::assert_abs_diff_eq;
use geotrans::accuracy::Accuracy;
use geotrans::datum::{Datum, DatumKind, ValidityRectangle};
use geotrans::datum_shift::{self, EllipsoidParams};

fn wgs84_ellps() -> EllipsoidParams {
    EllipsoidParams {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
        es: 0.006_694_379_990_14,
        b: 6_356_752.314_245,
    }
}

fn clarke_1866_ellps() -> EllipsoidParams {
    let a = 6_378_206.4;
    let f = 1.0 / 294.978_698_2;
    EllipsoidParams {
        a,
        f,
        es: 2.0 * f - f * f,
        b: a * (1.0 - f),
    }
}

fn wgs84_datum() -> Datum {
    Datum {
        index: 0,
        code: "WGE".into(),
        ellipsoid_code: "WE".into(),
        name: "World Geodetic System 1984".into(),
        dx: 0.0,
        dy: 0.0,
        dz: 0.0,
        validity: ValidityRectangle::whole_globe(),
        user_defined: false,
        kind: DatumKind::Wgs84,
    }
}

/// NAD27 CONUS mean shift values (Molodensky 3-parameter), as published by
/// the teacher's reference tables for the North American 1927 datum.
fn nad27_datum() -> Datum {
    Datum {
        index: 3,
        code: "NAS-C".into(),
        ellipsoid_code: "CC".into(),
        name: "North American 1927".into(),
        dx: -8.0,
        dy: 160.0,
        dz: 176.0,
        validity: ValidityRectangle::whole_globe(),
        user_defined: false,
        kind: DatumKind::ThreeParam {
            sigma_x: 25.0,
            sigma_y: 25.0,
            sigma_z: 25.0,
        },
    }
}

/// A 7-parameter datum sharing WGS84's ellipsoid but offset by a nontrivial
/// Bursa-Wolf transform, so the 3-step path is exercised on both halves.
fn seven_param_datum() -> Datum {
    Datum {
        index: 10,
        code: "TST7".into(),
        ellipsoid_code: "WE".into(),
        name: "Synthetic 7-parameter test frame".into(),
        dx: 100.0,
        dy: -50.0,
        dz: 25.0,
        validity: ValidityRectangle::whole_globe(),
        user_defined: true,
        kind: DatumKind::SevenParam {
            rx: 1.0 / geotrans::constants::ARCSEC_PER_RADIAN,
            ry: -0.5 / geotrans::constants::ARCSEC_PER_RADIAN,
            rz: 0.2 / geotrans::constants::ARCSEC_PER_RADIAN,
            scale: 2.0e-6,
        },
    }
}

/// Washington Monument, roughly: shifting NAD27 -> WGS84 -> NAD27 should
/// recover the original coordinate within Molodensky's own precision.
#[test]
fn nad27_round_trip_near_washington_dc() {
    let nad27 = nad27_datum();
    let wgs84 = wgs84_datum();
    let lon = (-77.035_f64).to_radians();
    let lat = 38.889_f64.to_radians();
    let h = 10.0;

    let (lon1, lat1, h1) = datum_shift::shift_geodetic(&nad27, &wgs84, clarke_1866_ellps(), wgs84_ellps(), wgs84_ellps(), lon, lat, h).unwrap();

    // NAD27 sits a few hundred meters from WGS84 in this region; the shift
    // should move the point measurably but not wildly.
    assert!((lon1 - lon).abs() * 6_378_137.0 < 500.0);
    assert!((lat1 - lat).abs() * 6_378_137.0 < 500.0);

    let (lon2, lat2, h2) = datum_shift::shift_geodetic(&wgs84, &nad27, wgs84_ellps(), clarke_1866_ellps(), wgs84_ellps(), lon1, lat1, h1).unwrap();

    assert_abs_diff_eq!(lon, lon2, epsilon = 1e-8);
    assert_abs_diff_eq!(lat, lat2, epsilon = 1e-8);
    assert_abs_diff_eq!(h, h2, epsilon = 0.1);
}

/// Shifting through a 7-parameter datum forces the 3-step geocentric path
/// on both halves (Molodensky doesn't apply to Bursa-Wolf transforms).
#[test]
fn seven_parameter_round_trip_uses_three_step_both_ways() {
    let wgs84 = wgs84_datum();
    let seven = seven_param_datum();
    // WGS84's own half is a no-op regardless of eligibility; only the
    // 7-parameter side is forced through the geocentric 3-step path.
    assert!(datum_shift::both_sides_use_three_step(&seven, &seven, 0.5));

    let lon = 10f64.to_radians();
    let lat = 45f64.to_radians();
    let h = 100.0;

    let (lon1, lat1, h1) = datum_shift::shift_geodetic(&wgs84, &seven, wgs84_ellps(), wgs84_ellps(), wgs84_ellps(), lon, lat, h).unwrap();
    let (lon2, lat2, h2) = datum_shift::shift_geodetic(&seven, &wgs84, wgs84_ellps(), wgs84_ellps(), wgs84_ellps(), lon1, lat1, h1).unwrap();

    assert_abs_diff_eq!(lon, lon2, epsilon = 1e-9);
    assert_abs_diff_eq!(lat, lat2, epsilon = 1e-9);
    assert_abs_diff_eq!(h, h2, epsilon = 1e-3);
}

/// Accuracy degrades crossing a 3-parameter datum but not a 7-parameter one
/// sharing the same ellipsoid and carrying no published sigma.
#[test]
fn accuracy_propagation_reflects_datum_kind() {
    let wgs84 = wgs84_datum();
    let nad27 = nad27_datum();
    let seven = seven_param_datum();

    let incoming = Accuracy::new(3.0, 3.0, 3.0);
    let lon = (-77f64).to_radians();
    let lat = 39f64.to_radians();

    let through_nad27 = datum_shift::propagate(&wgs84, &nad27, lon, lat, incoming, None);
    let through_seven = datum_shift::propagate(&wgs84, &seven, lon, lat, incoming, None);

    assert!(through_nad27.ce90 > incoming.ce90);
    assert_eq!(through_seven, incoming);
}
