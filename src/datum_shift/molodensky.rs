//!
//! Differential (standard) Molodensky datum shift
//!
//! Computes one half-step of the canonical WGS84 pivot directly in
//! geodetic coordinates, avoiding the geocentric round-trip (spec 4.3).
//!
use crate::math::{adjlon_signed_or_wrapped, meridional_radius, prime_vertical_radius, second_eccentricity_sq, w_factor};

/// Apply the differential Molodensky shift.
///
/// `a_s, f_s, es_s` are the *source* ellipsoid; `da = a_t - a_s`,
/// `df = f_t - f_s`; `(dx, dy, dz)` is the translation applied from the
/// source frame towards the target frame.
#[allow(clippy::too_many_arguments)]
pub fn shift(
    lon: f64,
    lat: f64,
    h: f64,
    a_s: f64,
    f_s: f64,
    es_s: f64,
    da: f64,
    df: f64,
    dx: f64,
    dy: f64,
    dz: f64,
) -> (f64, f64, f64) {
    let centered_lon = if lon > std::f64::consts::PI {
        lon - std::f64::consts::TAU
    } else {
        lon
    };

    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = centered_lon.sin_cos();

    let w = w_factor(sin_lat, es_s);
    let m = meridional_radius(a_s, es_s, w);
    let n = prime_vertical_radius(a_s, w);
    let es2 = second_eccentricity_sq(es_s);

    let dphi_num = cos_lat * dz - sin_lat * cos_lon * dx - sin_lat * sin_lon * dy
        + (es_s * sin_lat * cos_lat / w) * da
        + sin_lat * cos_lat * (2.0 * n + es2 * m * sin_lat * sin_lat) * (1.0 - f_s) * df;
    let dphi = dphi_num / (m + h);

    let dlam = (-sin_lon * dx + cos_lon * dy) / ((n + h) * cos_lat);

    let dh = cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz - w * da
        + (a_s * (1.0 - f_s) / w) * sin_lat * sin_lat * df;

    let new_lat = lat + dphi;
    let new_lon = adjlon_signed_or_wrapped(lon + dlam);
    let new_h = h + dh;

    (new_lon, new_lat, new_h)
}
