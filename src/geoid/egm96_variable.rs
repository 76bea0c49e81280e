//!
//! EGM96 variable grid, Hermite-blended natural spline
//!
//! Around 53 hard-coded inset rectangles (islands, coastlines) the 15'
//! EGM96 grid is used directly, subsampled at a 30' stride. Outside those
//! insets, between +-60 degrees latitude a 1 degree stride is used, and
//! poleward of that a 2 degree stride. All three strides subsample the
//! same underlying 1441x721 buffer rather than a separate file.
//!
use super::egm96_bilinear::{self, Egm96Grid};
use crate::constants::rad_to_deg;
use crate::errors::{Error, Result};

struct InsetRectangle {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

#[rustfmt::skip]
const INSET_AREAS: &[InsetRectangle] = &[
    InsetRectangle { min_lat: 74.5, max_lat: 75.5, min_lon: 273.5, max_lon: 280.0 },
    InsetRectangle { min_lat: 66.5, max_lat: 67.5, min_lon: 293.5, max_lon: 295.0 },
    InsetRectangle { min_lat: 62.5, max_lat: 64.0, min_lon: 133.0, max_lon: 136.5 },
    InsetRectangle { min_lat: 60.5, max_lat: 61.5, min_lon: 208.5, max_lon: 210.0 },
    InsetRectangle { min_lat: 60.5, max_lat: 61.0, min_lon: 219.0, max_lon: 220.5 },
    InsetRectangle { min_lat: 51.0, max_lat: 53.0, min_lon: 172.0, max_lon: 174.5 },
    InsetRectangle { min_lat: 52.0, max_lat: 53.0, min_lon: 192.5, max_lon: 194.0 },
    InsetRectangle { min_lat: 51.0, max_lat: 52.0, min_lon: 188.5, max_lon: 191.0 },
    InsetRectangle { min_lat: 50.0, max_lat: 52.0, min_lon: 178.0, max_lon: 182.5 },
    InsetRectangle { min_lat: 43.0, max_lat: 46.0, min_lon: 148.0, max_lon: 153.5 },
    InsetRectangle { min_lat: 43.0, max_lat: 45.0, min_lon: 84.0, max_lon: 89.5 },
    InsetRectangle { min_lat: 40.0, max_lat: 41.0, min_lon: 70.5, max_lon: 72.0 },
    InsetRectangle { min_lat: 36.5, max_lat: 37.0, min_lon: 78.5, max_lon: 79.0 },
    InsetRectangle { min_lat: 36.0, max_lat: 37.0, min_lon: 348.0, max_lon: 349.5 },
    InsetRectangle { min_lat: 35.0, max_lat: 36.0, min_lon: 171.0, max_lon: 172.5 },
    InsetRectangle { min_lat: 34.0, max_lat: 35.0, min_lon: 140.5, max_lon: 142.0 },
    InsetRectangle { min_lat: 29.5, max_lat: 31.0, min_lon: 78.5, max_lon: 81.0 },
    InsetRectangle { min_lat: 28.5, max_lat: 30.0, min_lon: 81.5, max_lon: 83.0 },
    InsetRectangle { min_lat: 26.5, max_lat: 30.0, min_lon: 142.0, max_lon: 143.5 },
    InsetRectangle { min_lat: 26.0, max_lat: 29.0, min_lon: 91.5, max_lon: 96.0 },
    InsetRectangle { min_lat: 27.5, max_lat: 29.0, min_lon: 84.0, max_lon: 86.5 },
    InsetRectangle { min_lat: 28.0, max_lat: 29.0, min_lon: 342.5, max_lon: 344.0 },
    InsetRectangle { min_lat: 26.5, max_lat: 28.0, min_lon: 88.5, max_lon: 90.0 },
    InsetRectangle { min_lat: 25.0, max_lat: 26.0, min_lon: 189.0, max_lon: 190.5 },
    InsetRectangle { min_lat: 23.0, max_lat: 24.0, min_lon: 195.0, max_lon: 196.5 },
    InsetRectangle { min_lat: 21.0, max_lat: 21.5, min_lon: 204.0, max_lon: 204.5 },
    InsetRectangle { min_lat: 20.0, max_lat: 21.0, min_lon: 283.5, max_lon: 288.0 },
    InsetRectangle { min_lat: 18.5, max_lat: 20.5, min_lon: 204.0, max_lon: 205.5 },
    InsetRectangle { min_lat: 18.0, max_lat: 20.0, min_lon: 291.0, max_lon: 296.5 },
    InsetRectangle { min_lat: 17.0, max_lat: 18.0, min_lon: 298.0, max_lon: 299.5 },
    InsetRectangle { min_lat: 15.0, max_lat: 16.0, min_lon: 122.0, max_lon: 123.5 },
    InsetRectangle { min_lat: 12.0, max_lat: 14.0, min_lon: 144.5, max_lon: 147.0 },
    InsetRectangle { min_lat: 11.0, max_lat: 12.0, min_lon: 141.5, max_lon: 144.0 },
    InsetRectangle { min_lat: 9.5, max_lat: 11.5, min_lon: 125.0, max_lon: 127.5 },
    InsetRectangle { min_lat: 10.0, max_lat: 11.0, min_lon: 286.0, max_lon: 287.5 },
    InsetRectangle { min_lat: 6.0, max_lat: 9.5, min_lon: 287.0, max_lon: 289.5 },
    InsetRectangle { min_lat: 5.0, max_lat: 7.0, min_lon: 124.0, max_lon: 128.5 },
    InsetRectangle { min_lat: -1.0, max_lat: 1.0, min_lon: 125.0, max_lon: 128.5 },
    InsetRectangle { min_lat: -3.0, max_lat: -1.5, min_lon: 281.0, max_lon: 282.5 },
    InsetRectangle { min_lat: -7.0, max_lat: -5.0, min_lon: 150.5, max_lon: 155.0 },
    InsetRectangle { min_lat: -8.0, max_lat: -7.0, min_lon: 107.0, max_lon: 108.5 },
    InsetRectangle { min_lat: -9.0, max_lat: -7.0, min_lon: 147.0, max_lon: 149.5 },
    InsetRectangle { min_lat: -11.0, max_lat: -10.0, min_lon: 161.5, max_lon: 163.0 },
    InsetRectangle { min_lat: -14.5, max_lat: -13.5, min_lon: 166.0, max_lon: 167.5 },
    InsetRectangle { min_lat: -18.5, max_lat: -17.0, min_lon: 186.5, max_lon: 188.0 },
    InsetRectangle { min_lat: -20.5, max_lat: -20.0, min_lon: 168.0, max_lon: 169.5 },
    InsetRectangle { min_lat: -23.0, max_lat: -20.0, min_lon: 184.5, max_lon: 187.0 },
    InsetRectangle { min_lat: -27.0, max_lat: -24.0, min_lon: 288.0, max_lon: 290.5 },
    InsetRectangle { min_lat: -53.0, max_lat: -52.0, min_lon: 312.0, max_lon: 313.5 },
    InsetRectangle { min_lat: -56.0, max_lat: -55.0, min_lon: 333.0, max_lon: 334.5 },
    InsetRectangle { min_lat: -61.5, max_lat: -60.0, min_lon: 312.5, max_lon: 317.0 },
    InsetRectangle { min_lat: -61.5, max_lat: -60.5, min_lon: 300.5, max_lon: 303.0 },
    InsetRectangle { min_lat: -73.0, max_lat: -72.0, min_lon: 24.5, max_lon: 26.0 },
];

fn scale_factor_deg(lon_dd: f64, lat_dd: f64) -> f64 {
    let inset = INSET_AREAS
        .iter()
        .any(|r| lat_dd >= r.min_lat && lat_dd < r.max_lat && lon_dd >= r.min_lon && lon_dd < r.max_lon);
    if inset {
        0.5
    } else if (-60.0..60.0).contains(&lat_dd) {
        1.0
    } else {
        2.0
    }
}

/// Geoid separation (meters) at `(lon, lat)` radians, selecting the
/// inset/latitude-band stride and applying the four-point Hermite spline.
pub fn height(grid: &Egm96Grid, lon: f64, lat: f64) -> Result<f64> {
    let mut lon_dd = rad_to_deg(lon);
    if lon_dd < 0.0 {
        lon_dd += 360.0;
    }
    let lat_dd = rad_to_deg(lat);
    let scale = scale_factor_deg(lon_dd, lat_dd);
    let skip = (scale / egm96_bilinear::SCALE_FACTOR_DEG).round() as i64;

    natural_spline_interpolate(grid.buffer(), egm96_bilinear::COLS, egm96_bilinear::ROWS, egm96_bilinear::SCALE_FACTOR_DEG, skip, lon, lat)
}

/// Hermite-blended 4-point natural spline over a (possibly strided) view
/// of `buffer`. `skip` posts are skipped between each interpolation
/// corner; `skip == 1` reduces this to the EGM84 10-degree case, which
/// has no real grid to subsample (its own buffer already has the target
/// resolution).
pub(super) fn natural_spline_interpolate(buffer: &[f32], num_cols: usize, num_rows: usize, scale_factor_deg: f64, skip: i64, lon: f64, lat: f64) -> Result<f64> {
    if !(-std::f64::consts::FRAC_PI_2..=std::f64::consts::FRAC_PI_2).contains(&lat) {
        return Err(Error::Latitude);
    }
    if !(-std::f64::consts::PI..=2.0 * std::f64::consts::PI).contains(&lon) {
        return Err(Error::Longitude);
    }

    let lat_dd = rad_to_deg(lat);
    let mut lon_dd = rad_to_deg(lon);
    if lon_dd < 0.0 {
        lon_dd += 360.0;
    }

    let virtual_cols = ((num_cols as i64 - 1) / skip + 1) as usize;
    let virtual_rows = ((num_rows as i64 - 1) / skip + 1) as usize;
    let virtual_scale = scale_factor_deg * skip as f64;

    let offset_x = lon_dd / virtual_scale;
    let offset_y = (90.0 - lat_dd) / virtual_scale;

    let mut post_x = offset_x as i64;
    if (post_x + 1) as usize == virtual_cols {
        post_x -= 1;
    }
    let mut post_y = (offset_y + 1.0e-11) as i64;
    if (post_y + 1) as usize == virtual_rows {
        post_y -= 1;
    }

    let max_index = (num_rows * num_cols) as i64 - 1;
    let at = |index: i64| -> f64 { buffer[index.clamp(0, max_index) as usize] as f64 };

    let base = post_y * skip * num_cols as i64 + post_x * skip;
    let height_nw = at(base);
    let height_ne = at(base + skip);
    let height_sw = at(base + skip * num_cols as i64);
    let height_se = at(base + skip * num_cols as i64 + skip);

    let west_lon = post_x as f64 * virtual_scale;
    let south_lat = 90.0 - (post_y as f64 * virtual_scale) - virtual_scale;

    let dx = (lon_dd - west_lon) / virtual_scale;
    let dy = (lat_dd - south_lat) / virtual_scale;
    let dx2 = dx * dx;
    let dy2 = dy * dy;
    let one_minus_x = 1.0 - dx;
    let one_minus_y = 1.0 - dy;
    let one_minus_x2 = one_minus_x * one_minus_x;
    let one_minus_y2 = one_minus_y * one_minus_y;

    let w_sw = one_minus_x2 * one_minus_y2 * (3.0 - 2.0 * one_minus_x) * (3.0 - 2.0 * one_minus_y);
    let w_se = dx2 * one_minus_y2 * (3.0 - 2.0 * dx) * (3.0 - 2.0 * one_minus_y);
    let w_ne = dx2 * dy2 * (3.0 - 2.0 * dx) * (3.0 - 2.0 * dy);
    let w_nw = one_minus_x2 * dy2 * (3.0 - 2.0 * one_minus_x) * (3.0 - 2.0 * dy);

    Ok(height_sw * w_sw + height_se * w_se + height_ne * w_ne + height_nw * w_nw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::deg_to_rad;

    #[test]
    fn equatorial_point_uses_one_degree_stride() {
        assert_eq!(scale_factor_deg(10.0, 0.0), 1.0);
    }

    #[test]
    fn polar_point_uses_two_degree_stride() {
        assert_eq!(scale_factor_deg(10.0, 70.0), 2.0);
    }

    #[test]
    fn inset_rectangle_overrides_latitude_band() {
        assert_eq!(scale_factor_deg(84.0, 75.0), 0.5);
    }

    #[test]
    fn uniform_grid_yields_constant_height() {
        let grid = Egm96Grid::from_heights(vec![3.0f32; egm96_bilinear::COLS * egm96_bilinear::ROWS]);
        let h = height(&grid, deg_to_rad(20.0), deg_to_rad(10.0)).unwrap();
        assert!((h - 3.0).abs() < 1e-4);
    }
}
