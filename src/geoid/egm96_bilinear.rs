//!
//! EGM96 15'x15' geoid grid, bilinear interpolation
//!
//! `egm96.grd` is a six-float header `(minLat, maxLat, minLon, maxLon,
//! dLat, dLon)` followed by a row-major, north-to-south 1441x721 grid of
//! big-endian single-precision separations.
//!
use crate::constants::rad_to_deg;
use crate::errors::{Error, Result};
use std::io::Read;

pub const COLS: usize = 1441;
pub const ROWS: usize = 721;
pub const SCALE_FACTOR_DEG: f64 = 0.25;

#[derive(Debug)]
pub struct Egm96Grid {
    heights: Vec<f32>,
}

impl Egm96Grid {
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut header = [0u8; 24];
        reader
            .read_exact(&mut header)
            .map_err(|_| Error::GeoidFileOpenError("egm96.grd".into()))?;
        let h: Vec<f32> = header.chunks_exact(4).map(|c| f32::from_be_bytes(c.try_into().unwrap())).collect();
        let expected = [-90.0, 90.0, 0.0, 360.0, SCALE_FACTOR_DEG as f32, SCALE_FACTOR_DEG as f32];
        if h.as_slice() != expected.as_slice() {
            return Err(Error::GeoidFileParseError("egm96.grd".into()));
        }

        let mut heights = vec![0.0f32; COLS * ROWS];
        let mut buf = vec![0u8; COLS * ROWS * 4];
        reader
            .read_exact(&mut buf)
            .map_err(|_| Error::GeoidFileParseError("egm96.grd".into()))?;
        for (dst, src) in heights.iter_mut().zip(buf.chunks_exact(4)) {
            *dst = f32::from_be_bytes(src.try_into().unwrap());
        }
        Ok(Self { heights })
    }

    pub(super) fn buffer(&self) -> &[f32] {
        &self.heights
    }

    #[cfg(test)]
    pub(super) fn from_heights(heights: Vec<f32>) -> Self {
        assert_eq!(heights.len(), COLS * ROWS);
        Self { heights }
    }

    /// Geoid separation (meters) at `(lon, lat)` radians.
    pub fn height(&self, lon: f64, lat: f64) -> Result<f64> {
        bilinear_interpolate(&self.heights, COLS, ROWS, SCALE_FACTOR_DEG, lon, lat)
    }
}

/// Shared bilinear grid lookup, also used by EGM84's two grids. Mirrors
/// the original's post-finding and weighting exactly: posts are clamped
/// to the buffer's edges rather than wrapping, and the northwest corner
/// of cell `(post_x, post_y)` is `index = post_y * num_cols + post_x`.
pub(super) fn bilinear_interpolate(buffer: &[f32], num_cols: usize, num_rows: usize, scale_factor_deg: f64, lon: f64, lat: f64) -> Result<f64> {
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

    let offset_x = lon_dd / scale_factor_deg;
    let offset_y = (90.0 - lat_dd) / scale_factor_deg;

    let mut post_x = offset_x as usize;
    if post_x + 1 == num_cols {
        post_x -= 1;
    }
    let mut post_y = (offset_y + 1.0e-11) as usize;
    if post_y + 1 == num_rows {
        post_y -= 1;
    }

    let max_index = num_rows * num_cols - 1;
    let at = |index: usize| -> f64 { buffer[index.min(max_index)] as f64 };

    let nw_index = post_y * num_cols + post_x;
    let height_nw = at(nw_index);
    let height_ne = at(nw_index + 1);
    let sw_index = (post_y + 1) * num_cols + post_x;
    let height_sw = at(sw_index);
    let height_se = at(sw_index + 1);

    let west_lon = post_x as f64 * scale_factor_deg;
    let south_lat = 90.0 - (post_y as f64 * scale_factor_deg) - scale_factor_deg;

    let delta_x = (lon_dd - west_lon) / scale_factor_deg;
    let delta_y = (lat_dd - south_lat) / scale_factor_deg;
    let one_minus_x = 1.0 - delta_x;
    let one_minus_y = 1.0 - delta_y;

    Ok(height_sw * one_minus_x * one_minus_y + height_se * delta_x * one_minus_y + height_ne * delta_x * delta_y + height_nw * one_minus_x * delta_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::deg_to_rad;

    fn sample_grid() -> Egm96Grid {
        Egm96Grid {
            heights: vec![1.0f32; COLS * ROWS],
        }
    }

    #[test]
    fn uniform_grid_yields_constant_height() {
        let grid = sample_grid();
        let h = grid.height(deg_to_rad(10.0), deg_to_rad(45.0)).unwrap();
        assert!((h - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let grid = sample_grid();
        assert!(grid.height(0.0, 2.0).is_err());
    }
}
