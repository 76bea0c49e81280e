//!
//! Geodetic <-> geocentric conversion
//!
//! Iterative algorithm after Wenzel (Hannover, 1985), same shape as the
//! teacher's `geocent.rs` / `datum_transform::utils`, generalized to the
//! two-datum signature the shift engine needs.
//!
use crate::constants::FRAC_PI_2;
use crate::errors::{Error, Result};

const GENAU: f64 = 1.0e-12;
const MAXITER: usize = 30;
const FRAC_PI_2_EPS: f64 = 1.001 * FRAC_PI_2;

pub fn geodetic_to_geocentric(lon: f64, lat: f64, h: f64, a: f64, es: f64) -> Result<(f64, f64, f64)> {
    let mut lat = lat;
    if lat < -FRAC_PI_2 && lat > -FRAC_PI_2_EPS {
        lat = -FRAC_PI_2;
    } else if lat > FRAC_PI_2 && lat < FRAC_PI_2_EPS {
        lat = FRAC_PI_2;
    } else if !(-FRAC_PI_2..=FRAC_PI_2).contains(&lat) {
        return Err(Error::Latitude);
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let rn = a / (1.0 - es * sin_lat * sin_lat).sqrt();
    Ok((
        (rn + h) * cos_lat * lon.cos(),
        (rn + h) * cos_lat * lon.sin(),
        ((rn * (1.0 - es)) + h) * sin_lat,
    ))
}

pub fn geocentric_to_geodetic(
    x: f64,
    y: f64,
    z: f64,
    a: f64,
    b: f64,
    es: f64,
) -> Result<(f64, f64, f64)> {
    let d2 = x * x + y * y;
    let p = d2.sqrt();
    let rr = (d2 + z * z).sqrt();

    let lon = if p / a < GENAU {
        if rr / a < GENAU {
            return Ok((0.0, FRAC_PI_2, -b));
        }
        0.0
    } else {
        y.atan2(x)
    };

    let ct = z / rr;
    let st = p / rr;
    let mut rx = 1.0 / (1.0 - es * (2.0 - es) * st * st).sqrt();
    let mut cphi0 = st * (1.0 - es) * rx;
    let mut sphi0 = ct * rx;

    let mut cphi = cphi0;
    let mut sphi = sphi0;
    let mut height = 0.0;

    for _ in 0..MAXITER {
        let rn = a / (1.0 - es * sphi0 * sphi0).sqrt();
        height = p * cphi0 + z * sphi0 - rn * (1.0 - es * sphi0 * sphi0);

        let rk = es * rn / (rn + height);
        rx = 1.0 / (1.0 - rk * (2.0 - rk) * st * st).sqrt();
        cphi = st * (1.0 - rk) * rx;
        sphi = ct * rx;
        let sdphi = sphi * cphi0 - cphi * sphi0;
        cphi0 = cphi;
        sphi0 = sphi;
        if sdphi * sdphi < GENAU * GENAU {
            break;
        }
    }

    let lat = sphi.atan2(cphi);
    Ok((lon, lat, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const WGS84_A: f64 = 6378137.0;
    const WGS84_F: f64 = 1.0 / 298.257223563;

    #[test]
    fn roundtrip_geodetic_geocentric() {
        let es = 2.0 * WGS84_F - WGS84_F * WGS84_F;
        let b = WGS84_A * (1.0 - WGS84_F);
        let lon = 0.3;
        let lat = 0.6;
        let h = 120.0;
        let (x, y, z) = geodetic_to_geocentric(lon, lat, h, WGS84_A, es).unwrap();
        let (lon2, lat2, h2) = geocentric_to_geodetic(x, y, z, WGS84_A, b, es).unwrap();
        assert_abs_diff_eq!(lon, lon2, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, lat2, epsilon = 1e-9);
        assert_abs_diff_eq!(h, h2, epsilon = 1e-3);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(geodetic_to_geocentric(0.0, 2.0, 0.0, WGS84_A, 0.006).is_err());
    }
}
