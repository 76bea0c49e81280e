//!
//! Accuracy propagation across a small multi-stage pipeline: precision
//! rounding injected into an incoming accuracy, then degraded again by a
//! datum shift, combined the way `service::ConversionService::convert`
//! actually chains the two (spec 4.3/4.8).
//!
use geotrans::accuracy::Accuracy;
use geotrans::constants::deg_to_rad;
use geotrans::datum::{Datum, DatumKind, ValidityRectangle};
use geotrans::datum_shift;
use geotrans::precision::Precision;

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

/// Coarsening the input string precision never improves accuracy.
#[test]
fn precision_injection_is_monotonic_with_coarseness() {
    let levels = [
        Precision::TenThousandthSecond,
        Precision::ThousandthSecond,
        Precision::HundredthSecond,
        Precision::TenthSecond,
        Precision::Second,
        Precision::TenSecond,
        Precision::Minute,
        Precision::TenMinute,
        Precision::Degree,
    ];
    let base = Accuracy::new(1.0, 1.0, 1.0);
    let mut previous = base.with_precision(levels[0]);
    for &level in &levels[1..] {
        let current = base.with_precision(level);
        assert!(current.ce90 >= previous.ce90);
        assert!(current.le90 >= previous.le90);
        previous = current;
    }
}

/// Precision injection on top of an already-unknown accuracy stays unknown.
#[test]
fn precision_injection_does_not_clear_unknown() {
    let result = Accuracy::UNKNOWN.with_precision(Precision::Second);
    assert_eq!(result, Accuracy::UNKNOWN);
}

/// A four-digit MGRS string (10 m precision) feeding into a NAD27 shift
/// should come out worse than the string precision alone, since the
/// 3-parameter datum's own published sigma adds to it.
#[test]
fn string_precision_then_datum_shift_compounds() {
    let wgs84 = wgs84_datum();
    let nad27 = nad27_datum();
    let lon = deg_to_rad(-77.035);
    let lat = deg_to_rad(38.889);

    let incoming = Accuracy::new(0.0, 0.0, 0.0);
    let precision_only = incoming.with_precision(Precision::TenSecond);
    let shifted = datum_shift::propagate(&wgs84, &nad27, lon, lat, incoming, Some(Precision::TenSecond));

    assert!(shifted.ce90 > precision_only.ce90);
    assert!(shifted.le90 > precision_only.le90);
}

/// Shifting between two frames that share the same datum code still runs
/// the precision correction (the original's equivalent function applies it
/// unconditionally), but otherwise leaves the incoming accuracy untouched.
#[test]
fn same_datum_code_only_applies_precision() {
    let wgs84 = wgs84_datum();
    let incoming = Accuracy::new(2.0, 2.0, 2.0);

    let untouched = datum_shift::propagate(&wgs84, &wgs84, 0.1, 0.2, incoming, None);
    assert_eq!(untouched, incoming);

    let with_precision = datum_shift::propagate(&wgs84, &wgs84, 0.1, 0.2, incoming, Some(Precision::Second));
    assert_eq!(with_precision, incoming.with_precision(Precision::Second));
}
