//!
//! EGM84 grids: 10x10 degree (bilinear or natural spline) and 30'x30'
//! (bilinear, double-precision samples)
//!
//! `egm84.grd` has no header: 37x19 single-precision separations,
//! row-major, north-to-south. `wwgrid.bin` likewise has no header:
//! 721x361 double-precision separations.
//!
use super::egm96_bilinear::bilinear_interpolate;
use super::egm96_variable::natural_spline_interpolate;
use crate::errors::{Error, Result};
use std::io::Read;

pub const TEN_DEG_COLS: usize = 37;
pub const TEN_DEG_ROWS: usize = 19;
pub const TEN_DEG_SCALE_DEG: f64 = 10.0;

pub const THIRTY_MIN_COLS: usize = 721;
pub const THIRTY_MIN_ROWS: usize = 361;
pub const THIRTY_MIN_SCALE_DEG: f64 = 0.5;

#[derive(Debug)]
pub struct Egm84TenDegGrid {
    heights: Vec<f32>,
}

impl Egm84TenDegGrid {
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = vec![0u8; TEN_DEG_COLS * TEN_DEG_ROWS * 4];
        reader
            .read_exact(&mut buf)
            .map_err(|_| Error::GeoidFileParseError("egm84.grd".into()))?;
        let heights = buf.chunks_exact(4).map(|c| f32::from_be_bytes(c.try_into().unwrap())).collect();
        Ok(Self { heights })
    }

    pub fn height_bilinear(&self, lon: f64, lat: f64) -> Result<f64> {
        bilinear_interpolate(&self.heights, TEN_DEG_COLS, TEN_DEG_ROWS, TEN_DEG_SCALE_DEG, lon, lat)
    }

    pub fn height_natural_spline(&self, lon: f64, lat: f64) -> Result<f64> {
        natural_spline_interpolate(&self.heights, TEN_DEG_COLS, TEN_DEG_ROWS, TEN_DEG_SCALE_DEG, 1, lon, lat)
    }

    #[cfg(test)]
    pub(super) fn from_heights(heights: Vec<f32>) -> Self {
        assert_eq!(heights.len(), TEN_DEG_COLS * TEN_DEG_ROWS);
        Self { heights }
    }
}

#[derive(Debug)]
pub struct Egm84ThirtyMinGrid {
    heights: Vec<f64>,
}

impl Egm84ThirtyMinGrid {
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = vec![0u8; THIRTY_MIN_COLS * THIRTY_MIN_ROWS * 8];
        reader
            .read_exact(&mut buf)
            .map_err(|_| Error::GeoidFileParseError("wwgrid.bin".into()))?;
        let heights = buf.chunks_exact(8).map(|c| f64::from_be_bytes(c.try_into().unwrap())).collect();
        Ok(Self { heights })
    }

    pub fn height(&self, lon: f64, lat: f64) -> Result<f64> {
        bilinear_interpolate_f64(&self.heights, THIRTY_MIN_COLS, THIRTY_MIN_ROWS, THIRTY_MIN_SCALE_DEG, lon, lat)
    }
}

/// Same algorithm as [`bilinear_interpolate`], specialized to `f64`
/// samples (the 30' grid ships double-precision posts).
fn bilinear_interpolate_f64(buffer: &[f64], num_cols: usize, num_rows: usize, scale_factor_deg: f64, lon: f64, lat: f64) -> Result<f64> {
    use crate::constants::rad_to_deg;

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
    let at = |index: usize| -> f64 { buffer[index.min(max_index)] };

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

    #[test]
    fn uniform_ten_deg_grid_bilinear() {
        let grid = Egm84TenDegGrid::from_heights(vec![5.0f32; TEN_DEG_COLS * TEN_DEG_ROWS]);
        let h = grid.height_bilinear(deg_to_rad(20.0), deg_to_rad(10.0)).unwrap();
        assert!((h - 5.0).abs() < 1e-4);
    }

    #[test]
    fn uniform_ten_deg_grid_spline() {
        let grid = Egm84TenDegGrid::from_heights(vec![5.0f32; TEN_DEG_COLS * TEN_DEG_ROWS]);
        let h = grid.height_natural_spline(deg_to_rad(20.0), deg_to_rad(10.0)).unwrap();
        assert!((h - 5.0).abs() < 1e-4);
    }

    #[test]
    fn uniform_thirty_min_grid() {
        let grid = Egm84ThirtyMinGrid {
            heights: vec![7.0f64; THIRTY_MIN_COLS * THIRTY_MIN_ROWS],
        };
        let h = grid.height(deg_to_rad(20.0), deg_to_rad(10.0)).unwrap();
        assert!((h - 7.0).abs() < 1e-9);
    }
}
