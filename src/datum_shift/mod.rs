//!
//! Datum shift engine
//!
//! Converts geodetic or geocentric coordinates between two datums using
//! WGS84 as a canonical pivot (spec 4.3). Each half of the pivot (source to
//! WGS84, WGS84 to target) independently picks Molodensky or the 3-step
//! geocentric round-trip, the same per-half eligibility rule spec 4.3
//! describes for the mixed case — this also covers the "both same type"
//! cases without a separate code path.
//!
pub mod geocentric;
pub mod molodensky;
pub mod wgs72;

use crate::accuracy::Accuracy;
use crate::constants::{CE90_SCALE, LE90_SCALE, MOLODENSKY_MAX, SE90_SCALE};
use crate::datum::{Datum, DatumKind};
use crate::errors::Result;
use crate::precision::Precision;

/// Ellipsoid parameters needed by the shift engine.
#[derive(Debug, Clone, Copy)]
pub struct EllipsoidParams {
    pub a: f64,
    pub f: f64,
    pub es: f64,
    pub b: f64,
}

fn molodensky_eligible(lat: f64) -> bool {
    lat.abs() <= MOLODENSKY_MAX
}

/// Linearized Bursa-Wolf, source-to-WGS84 sign convention (spec 4.3).
fn bursa_wolf_forward(x: f64, y: f64, z: f64, dx: f64, dy: f64, dz: f64, rx: f64, ry: f64, rz: f64, s: f64) -> (f64, f64, f64) {
    (
        x + dx + rz * y - ry * z + s * x,
        y + dy - rz * x + rx * z + s * y,
        z + dz + ry * x - rx * y + s * z,
    )
}

/// Inverse linearized Bursa-Wolf: negated translation/rotation, `1-s`.
fn bursa_wolf_inverse(x: f64, y: f64, z: f64, dx: f64, dy: f64, dz: f64, rx: f64, ry: f64, rz: f64, s: f64) -> (f64, f64, f64) {
    (
        x - dx + rz * y - ry * z - s * x,
        y - dy - rz * x + rx * z - s * y,
        z - dz + ry * x - rx * y - s * z,
    )
}

/// Geocentric shift of `(x,y,z)`, expressed in `datum`'s own ellipsoid,
/// towards WGS84, dispatched on the source datum's type (spec 4.3).
pub fn geocentric_shift_to_wgs84(
    datum: &Datum,
    ellps: EllipsoidParams,
    wgs84: EllipsoidParams,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(f64, f64, f64)> {
    match datum.kind {
        DatumKind::Wgs84 => Ok((x, y, z)),
        DatumKind::Wgs72 => {
            let (lon, lat, h) = geocentric::geocentric_to_geodetic(x, y, z, ellps.a, ellps.b, ellps.es)?;
            let (lon2, lat2, h2) = wgs72::wgs72_to_wgs84(lon, lat, h);
            geocentric::geodetic_to_geocentric(lon2, lat2, h2, wgs84.a, wgs84.es)
        }
        DatumKind::ThreeParam { .. } => Ok((x + datum.dx, y + datum.dy, z + datum.dz)),
        DatumKind::SevenParam { rx, ry, rz, scale } => {
            Ok(bursa_wolf_forward(x, y, z, datum.dx, datum.dy, datum.dz, rx, ry, rz, scale))
        }
    }
}

/// The inverse of [`geocentric_shift_to_wgs84`]: shift `(x,y,z)` expressed
/// in WGS84 geocentric coordinates towards `datum`'s own frame.
pub fn geocentric_shift_from_wgs84(
    datum: &Datum,
    wgs84: EllipsoidParams,
    ellps: EllipsoidParams,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(f64, f64, f64)> {
    match datum.kind {
        DatumKind::Wgs84 => Ok((x, y, z)),
        DatumKind::Wgs72 => {
            let (lon, lat, h) = geocentric::geocentric_to_geodetic(x, y, z, wgs84.a, wgs84.b, wgs84.es)?;
            let (lon2, lat2, h2) = wgs72::wgs84_to_wgs72(lon, lat, h);
            geocentric::geodetic_to_geocentric(lon2, lat2, h2, ellps.a, ellps.es)
        }
        DatumKind::ThreeParam { .. } => Ok((x - datum.dx, y - datum.dy, z - datum.dz)),
        DatumKind::SevenParam { rx, ry, rz, scale } => {
            Ok(bursa_wolf_inverse(x, y, z, datum.dx, datum.dy, datum.dz, rx, ry, rz, scale))
        }
    }
}

fn is_seven_param(datum: &Datum) -> bool {
    matches!(datum.kind, DatumKind::SevenParam { .. })
}

/// One half-step of the WGS84 pivot: `datum`'s frame -> WGS84 geodetic.
fn shift_to_wgs84(
    datum: &Datum,
    ellps: EllipsoidParams,
    wgs84: EllipsoidParams,
    lon: f64,
    lat: f64,
    h: f64,
) -> Result<(f64, f64, f64)> {
    match datum.kind {
        DatumKind::Wgs84 => Ok((lon, lat, h)),
        DatumKind::Wgs72 => Ok(wgs72::wgs72_to_wgs84(lon, lat, h)),
        DatumKind::ThreeParam { .. } if molodensky_eligible(lat) => Ok(molodensky::shift(
            lon,
            lat,
            h,
            ellps.a,
            ellps.f,
            ellps.es,
            wgs84.a - ellps.a,
            wgs84.f - ellps.f,
            datum.dx,
            datum.dy,
            datum.dz,
        )),
        _ => {
            let (x, y, z) = geocentric::geodetic_to_geocentric(lon, lat, h, ellps.a, ellps.es)?;
            let (x2, y2, z2) = geocentric_shift_to_wgs84(datum, ellps, wgs84, x, y, z)?;
            geocentric::geocentric_to_geodetic(x2, y2, z2, wgs84.a, wgs84.b, wgs84.es)
        }
    }
}

/// One half-step of the WGS84 pivot: WGS84 geodetic -> `datum`'s frame.
fn shift_from_wgs84(
    datum: &Datum,
    wgs84: EllipsoidParams,
    ellps: EllipsoidParams,
    lon: f64,
    lat: f64,
    h: f64,
) -> Result<(f64, f64, f64)> {
    match datum.kind {
        DatumKind::Wgs84 => Ok((lon, lat, h)),
        DatumKind::Wgs72 => Ok(wgs72::wgs84_to_wgs72(lon, lat, h)),
        DatumKind::ThreeParam { .. } if molodensky_eligible(lat) => Ok(molodensky::shift(
            lon,
            lat,
            h,
            wgs84.a,
            wgs84.f,
            wgs84.es,
            ellps.a - wgs84.a,
            ellps.f - wgs84.f,
            -datum.dx,
            -datum.dy,
            -datum.dz,
        )),
        _ => {
            let (x, y, z) = geocentric::geodetic_to_geocentric(lon, lat, h, wgs84.a, wgs84.es)?;
            let (x2, y2, z2) = geocentric_shift_from_wgs84(datum, wgs84, ellps, x, y, z)?;
            geocentric::geocentric_to_geodetic(x2, y2, z2, ellps.a, ellps.b, ellps.es)
        }
    }
}

/// Shift a geodetic coordinate from `src_datum`'s frame to `tgt_datum`'s
/// frame through the WGS84 pivot (spec 4.3's dispatch table, expressed as
/// two independently-eligible half-steps — see `datum_shift/mod.rs` docs).
#[allow(clippy::too_many_arguments)]
pub fn shift_geodetic(
    src_datum: &Datum,
    tgt_datum: &Datum,
    src_ellps: EllipsoidParams,
    tgt_ellps: EllipsoidParams,
    wgs84: EllipsoidParams,
    lon: f64,
    lat: f64,
    h: f64,
) -> Result<(f64, f64, f64)> {
    if src_datum.code == tgt_datum.code {
        return Ok((lon, lat, h));
    }
    let (lon1, lat1, h1) = shift_to_wgs84(src_datum, src_ellps, wgs84, lon, lat, h)?;
    shift_from_wgs84(tgt_datum, wgs84, tgt_ellps, lon1, lat1, h1)
}

/// `true` if this pair would use the 3-step method on both halves.
pub fn both_sides_use_three_step(src_datum: &Datum, tgt_datum: &Datum, lat: f64) -> bool {
    let src_3step = is_seven_param(src_datum) || !molodensky_eligible(lat);
    let tgt_3step = is_seven_param(tgt_datum) || !molodensky_eligible(lat);
    src_3step && tgt_3step
}

/// Error propagation contributed by one half of the pivot (spec 4.3): zero
/// for WGS84/WGS72/7-parameter datums, a function of `(lon, lat)` for
/// 3-parameter datums. Any negative input sigma contaminates the whole
/// triple.
pub fn error_contribution(datum: &Datum, lon: f64, lat: f64) -> Accuracy {
    match datum.kind {
        DatumKind::ThreeParam {
            sigma_x,
            sigma_y,
            sigma_z,
        } => {
            if sigma_x < 0.0 || sigma_y < 0.0 || sigma_z < 0.0 {
                return Accuracy::UNKNOWN;
            }
            let (sin_lat, cos_lat) = lat.sin_cos();
            let (sin_lon, cos_lon) = lon.sin_cos();

            let sigma_dphi = norm3(
                sigma_x * sin_lat * cos_lon,
                sigma_y * sin_lat * sin_lon,
                sigma_z * cos_lat,
            );
            let sigma_dlam = norm2(sigma_x * sin_lon, sigma_y * cos_lon);
            let sigma_dh = norm3(
                sigma_x * cos_lat * cos_lon,
                sigma_y * cos_lat * sin_lon,
                sigma_z * sin_lat,
            );

            Accuracy::new(
                CE90_SCALE * (sigma_dphi + sigma_dlam) / 2.0,
                LE90_SCALE * sigma_dh,
                SE90_SCALE * (sigma_x + sigma_y + sigma_z) / 3.0,
            )
        }
        _ => Accuracy::new(0.0, 0.0, 0.0),
    }
}

fn norm2(a: f64, b: f64) -> f64 {
    (a * a + b * b).sqrt()
}

fn norm3(a: f64, b: f64, c: f64) -> f64 {
    (a * a + b * b + c * c).sqrt()
}

/// Combine source-side and target-side error contributions with an
/// incoming accuracy, per spec 4.3: one three-way root-sum-square floored
/// once, then the source coordinate's string-precision sigma injected
/// (`precision`, `None` when the source coordinate carries none).
pub fn propagate(
    src_datum: &Datum,
    tgt_datum: &Datum,
    lon: f64,
    lat: f64,
    incoming: Accuracy,
    precision: Option<Precision>,
) -> Accuracy {
    let combined = if src_datum.code == tgt_datum.code {
        incoming
    } else {
        let src = error_contribution(src_datum, lon, lat);
        let tgt = error_contribution(tgt_datum, lon, lat);
        incoming.combine3(src, tgt)
    };
    match precision {
        Some(p) => combined.with_precision(p),
        None => combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn wgs84() -> EllipsoidParams {
        EllipsoidParams {
            a: 6378137.0,
            f: 1.0 / 298.257223563,
            es: 0.00669437999014,
            b: 6356752.314245,
        }
    }

    fn nad27_ellps() -> EllipsoidParams {
        // Clarke 1866
        let a = 6378206.4;
        let f = 1.0 / 294.9786982;
        EllipsoidParams {
            a,
            f,
            es: 2.0 * f - f * f,
            b: a * (1.0 - f),
        }
    }

    fn three_param_datum() -> Datum {
        use crate::datum::ValidityRectangle;
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

    fn wgs84_datum() -> Datum {
        use crate::datum::ValidityRectangle;
        Datum {
            index: 0,
            code: "WGE".into(),
            ellipsoid_code: "WE".into(),
            name: "WGS84".into(),
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            validity: ValidityRectangle::whole_globe(),
            user_defined: false,
            kind: DatumKind::Wgs84,
        }
    }

    #[test]
    fn pivot_round_trip_is_near_identity() {
        let src = three_param_datum();
        let tgt = wgs84_datum();
        let lon = -77f64.to_radians();
        let lat = 39f64.to_radians();
        let h = 0.0;

        let (lon1, lat1, h1) =
            shift_geodetic(&src, &tgt, nad27_ellps(), wgs84(), wgs84(), lon, lat, h).unwrap();
        let (lon2, lat2, h2) =
            shift_geodetic(&tgt, &src, wgs84(), nad27_ellps(), wgs84(), lon1, lat1, h1).unwrap();

        assert_abs_diff_eq!(lon, lon2, epsilon = 2e-9);
        assert_abs_diff_eq!(lat, lat2, epsilon = 2e-9);
        assert_abs_diff_eq!(h, h2, epsilon = 0.05);
    }

    #[test]
    fn same_datum_is_identity() {
        let d = wgs84_datum();
        let r = shift_geodetic(&d, &d, wgs84(), wgs84(), wgs84(), 0.1, 0.2, 5.0).unwrap();
        assert_eq!(r, (0.1, 0.2, 5.0));
    }

    #[test]
    fn three_param_error_zero_sigma_is_zero_not_unknown() {
        let mut d = three_param_datum();
        d.kind = DatumKind::ThreeParam {
            sigma_x: -1.0,
            sigma_y: 1.0,
            sigma_z: 1.0,
        };
        assert_eq!(error_contribution(&d, 0.0, 0.0), Accuracy::UNKNOWN);
    }

    #[test]
    fn seven_param_and_wgs_contribute_nothing() {
        let d = wgs84_datum();
        assert_eq!(error_contribution(&d, 0.1, 0.2), Accuracy::new(0.0, 0.0, 0.0));
    }
}
