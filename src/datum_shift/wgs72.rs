//!
//! Closed-form WGS72 <-> WGS84 shift (spec 4.3)
//!
use crate::constants::{ARCSEC_PER_RADIAN, FRAC_PI_2, PI, TAU, WGS72_Q};
use crate::math::adjlon;

pub const WGS72_A: f64 = 6_378_135.0;
pub const WGS72_F: f64 = 1.0 / 298.26;
pub const WGS84_A: f64 = 6_378_137.0;
pub const WGS84_F: f64 = 1.0 / 298.257223563;

const DA: f64 = WGS84_A - WGS72_A;
const DF: f64 = WGS84_F - WGS72_F;

/// `sign = 1` for WGS72->WGS84 (forward, `+4.5`/`+1.4`), `sign = -1` for
/// WGS84->WGS72 (inverse): negating the whole triple is equivalent to using
/// `-4.5`/`-1.4` and swapping the sign of `da`/`df`, since every term in the
/// closed form is linear in those four quantities.
fn shift(lon: f64, lat: f64, h: f64, sign: f64) -> (f64, f64, f64) {
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let sin2lat = (2.0 * lat).sin();

    let dphi_arcsec = (4.5 * cos_lat) / (WGS72_A * WGS72_Q) + (DF * sin2lat) / WGS72_Q;
    let dphi = sign * (dphi_arcsec / ARCSEC_PER_RADIAN);

    let dlam = sign * (0.554 / ARCSEC_PER_RADIAN);

    let dh = sign * (4.5 * sin_lat + WGS72_A * DF * sin_lat * sin_lat - DA + 1.4);

    let mut new_lat = lat + dphi;
    let mut new_lon = lon + dlam;

    if new_lat > FRAC_PI_2 {
        new_lat = PI - new_lat;
        new_lon += PI;
    } else if new_lat < -FRAC_PI_2 {
        new_lat = -PI - new_lat;
        new_lon += PI;
    }
    if new_lon > TAU {
        new_lon -= TAU;
    }
    new_lon = adjlon(new_lon);

    (new_lon, new_lat, h + dh)
}

pub fn wgs72_to_wgs84(lon: f64, lat: f64, h: f64) -> (f64, f64, f64) {
    shift(lon, lat, h, 1.0)
}

pub fn wgs84_to_wgs72(lon: f64, lat: f64, h: f64) -> (f64, f64, f64) {
    shift(lon, lat, h, -1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn roundtrip_is_sub_meter() {
        let lon = 0.3;
        let lat = 0.5;
        let h = 100.0;
        let (lon1, lat1, h1) = wgs72_to_wgs84(lon, lat, h);
        let (lon2, lat2, h2) = wgs84_to_wgs72(lon1, lat1, h1);
        assert_abs_diff_eq!(lon, lon2, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, lat2, epsilon = 1e-9);
        assert_abs_diff_eq!(h, h2, epsilon = 1e-6);
    }
}
