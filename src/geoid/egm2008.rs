//!
//! EGM2008 2.5'x2.5' geoid grid, bicubic spline interpolation
//!
//! The reformatted grid file has no six-float header like EGM96's; it
//! opens with `(nPad, nOrigRows, nOrigCols)` as big-endian `i32`s and
//! `(dLat, dLon)` as big-endian `f64` degrees, followed by a grid padded
//! by `nPad` cells on every side (rows AND columns), stored north-to-
//! south, west-to-east. Two residency strategies are provided: the full
//! worldwide grid held in memory, or a bounded area-of-interest window
//! that reloads from disk as the query point wanders outside it.
//!
use super::spline;
use crate::constants::{deg_to_rad, FRAC_PI_2, TAU};
use crate::errors::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

const BYTES_IN_HEADER: usize = 3 * 4 + 2 * 8;
const MAX_WINDOW: usize = 20;

/// EGM2008's recommended interpolation window (6x6 posts).
pub const DEFAULT_WINDOW: usize = 6;

const NOMINAL_AOI_COLS: i64 = 50;
const NOMINAL_AOI_ROWS: i64 = 50;
const AOI_RATIO_FLOOR: f64 = 0.05;

const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

#[derive(Debug, Clone, Copy)]
pub struct GridHeader {
    pub n_pad: i64,
    pub n_orig_rows: i64,
    pub n_orig_cols: i64,
    pub n_grid_rows: i64,
    pub n_grid_cols: i64,
    pub base_latitude: f64,
    pub base_longitude: f64,
    pub d_lat: f64,
    pub d_lon: f64,
}

impl GridHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; BYTES_IN_HEADER];
        reader.read_exact(&mut buf).map_err(|_| Error::GeoidFileOpenError("egm2008 grid".into()))?;

        let n_pad = i32::from_be_bytes(buf[0..4].try_into().unwrap()) as i64;
        let n_orig_rows = i32::from_be_bytes(buf[4..8].try_into().unwrap()) as i64;
        let n_orig_cols = i32::from_be_bytes(buf[8..12].try_into().unwrap()) as i64;
        let d_lat = deg_to_rad(f64::from_be_bytes(buf[12..20].try_into().unwrap()));
        let d_lon = deg_to_rad(f64::from_be_bytes(buf[20..28].try_into().unwrap()));

        let n_grid_rows = n_orig_rows + 2 * n_pad;
        let n_grid_cols = n_orig_cols + 2 * n_pad + 1;
        let base_latitude = -FRAC_PI_2 - d_lat * n_pad as f64;
        let base_longitude = -d_lon * n_pad as f64;

        Ok(Self {
            n_pad,
            n_orig_rows,
            n_orig_cols,
            n_grid_rows,
            n_grid_cols,
            base_latitude,
            base_longitude,
            d_lat,
            d_lon,
        })
    }

    /// File byte offset of the first post in the south-referenced row
    /// `south_index` (row 0 is the southern edge of the padded grid).
    fn file_row_offset(&self, south_index: i64) -> i64 {
        self.n_grid_rows - south_index - 1
    }

    /// Geodetic coordinates of grid intersection `(i, j)`, where `i`/`j`
    /// are south/west-referenced indices into the padded worldwide grid.
    /// Handles the southern pad, the NGA-supplied region, and the
    /// northern pad, each of which wraps longitude by half a circumference.
    fn load_grid_coords(&self, i: i64, j: i64) -> Result<(f64, f64)> {
        if !(0..self.n_grid_rows).contains(&i) {
            return Err(Error::Latitude);
        }

        let mut j = j % self.n_grid_cols;
        if j < 0 {
            j += self.n_grid_cols;
        }

        let limit1 = self.n_pad;
        let limit2 = self.n_grid_rows - self.n_pad - 1;

        if i < limit1 {
            let latitude = -FRAC_PI_2 - self.d_lat * (i - limit1) as f64;
            let mut k = j + self.n_orig_cols / 2;
            if k >= self.n_grid_cols {
                k -= self.n_orig_cols;
            }
            let longitude = self.base_longitude + self.d_lon * k as f64;
            return Ok((latitude, longitude));
        }

        if i > limit2 {
            let latitude = FRAC_PI_2 - self.d_lat * (i - limit2) as f64;
            let mut k = j + self.n_orig_cols / 2;
            if k >= self.n_grid_cols {
                k -= self.n_orig_cols;
            }
            let longitude = self.base_longitude + self.d_lon * k as f64;
            return Ok((latitude, longitude));
        }

        let latitude = self.base_latitude + self.d_lat * i as f64;
        let longitude = self.base_longitude + self.d_lon * j as f64;
        Ok((latitude, longitude))
    }

    /// Worldwide grid indices of the intersection immediately southwest
    /// of `(lat, lon)`.
    fn sw_grid_indices(&self, latitude: f64, longitude: f64) -> Result<(i64, i64)> {
        let max_latitude = self.base_latitude + (self.n_grid_rows - 1) as f64 * self.d_lat;
        if latitude < self.base_latitude || latitude > max_latitude {
            return Err(Error::Latitude);
        }

        let mut longitude = longitude;
        while longitude < 0.0 {
            longitude += TAU;
        }
        while longitude > TAU {
            longitude -= TAU;
        }

        let i = self.n_pad + ((latitude + FRAC_PI_2) / self.d_lat) as i64;
        let j = self.n_pad + (longitude / self.d_lon) as i64;
        Ok((i, j))
    }
}

fn normalize_longitude(mut longitude: f64) -> f64 {
    while longitude < 0.0 {
        longitude += TAU;
    }
    while longitude > TAU {
        longitude -= TAU;
    }
    longitude
}

/// A window of geoid separations covering rows `[row_min, row_min +
/// rows)` and columns `[col_min, col_min + cols)` of the worldwide
/// grid, stored north-to-south like the source file.
struct Window<'a> {
    buffer: &'a [f32],
    rows: i64,
    cols: i64,
    row_min: i64,
    col_min: i64,
}

impl<'a> Window<'a> {
    fn get(&self, global_i: i64, global_j: i64) -> Result<f64> {
        let local_row = self.rows - 1 - (global_i - self.row_min);
        let local_col = global_j - self.col_min;
        if local_row < 0 || local_row >= self.rows || local_col < 0 || local_col >= self.cols {
            return Err(Error::GeoidFileParseError("egm2008 grid".into()));
        }
        let index = (local_row * self.cols + local_col) as usize;
        self.buffer.get(index).map(|v| *v as f64).ok_or_else(|| Error::GeoidFileParseError("egm2008 grid".into()))
    }
}

/// Shared bicubic-spline / bilinear-fallback interpolator. `window` must
/// cover every post the chosen `w_size` touches; callers are responsible
/// for keeping it resident (the full grid trivially does; the AOI grid
/// reloads it on demand before calling this).
fn geoid_height(header: &GridHeader, window: &Window, w_size: usize, latitude: f64, longitude: f64) -> Result<f64> {
    if !(-FRAC_PI_2..=FRAC_PI_2).contains(&latitude) {
        return Err(Error::Latitude);
    }
    let longitude = normalize_longitude(longitude);
    let w_size = w_size.min(MAX_WINDOW);

    if w_size < 3 {
        return geoid_height_bilinear(header, window, latitude, longitude);
    }

    let lat_index = header.n_pad as f64 + (latitude + FRAC_PI_2) / header.d_lat;
    let lon_index = header.n_pad as f64 + longitude / header.d_lon;

    let odd_size = w_size % 2 != 0;
    let (i0, j0) = if odd_size { ((lat_index + 0.5) as i64, (lon_index + 0.5) as i64) } else { (lat_index as i64, lon_index as i64) };

    let half = (w_size / 2) as i64;
    let (i_min, j_min) = if odd_size { (i0 - half, j0 - half) } else { (i0 - half + 1, j0 - half + 1) };

    let mut lat_support = [0.0f64; MAX_WINDOW];

    let col_temp = lon_index - j_min as f64;
    for (row, lat_slot) in lat_support.iter_mut().enumerate().take(w_size) {
        let i_index = i_min + row as i64;
        let mut lon_support = [0.0f64; MAX_WINDOW];
        for (col, slot) in lon_support.iter_mut().enumerate().take(w_size) {
            let j_index = j_min + col as i64;
            *slot = window.get(i_index, j_index)?;
        }
        let moments = spline::moments(&lon_support[..w_size])?;
        *lat_slot = spline::evaluate(col_temp, &lon_support[..w_size], &moments);
    }

    let row_temp = lat_index - i_min as f64;
    let moments = spline::moments(&lat_support[..w_size])?;
    Ok(spline::evaluate(row_temp, &lat_support[..w_size], &moments))
}

fn geoid_height_bilinear(header: &GridHeader, window: &Window, latitude: f64, longitude: f64) -> Result<f64> {
    let (i1, j1) = header.sw_grid_indices(latitude, longitude)?;
    let (i2, j2) = (i1, j1 + 1);
    let (i3, j3) = (i1 + 1, j2);
    let (i4, j4) = (i3, j1);

    let n1 = window.get(i1, j1)?;
    let n2 = window.get(i2, j2)?;
    let n3 = window.get(i3, j3)?;
    let n4 = window.get(i4, j4)?;

    let a0 = n1;
    let a1 = n2 - n1;
    let a2 = n4 - n1;
    let a3 = n1 + n3 - n2 - n4;

    let lat1 = header.base_latitude + header.d_lat * i1 as f64;
    let lon1 = header.base_longitude + header.d_lon * j1 as f64;

    let x = (longitude - lon1) / header.d_lon;
    let y = (latitude - lat1) / header.d_lat;

    Ok(a0 + a1 * x + a2 * y + a3 * x * y)
}

/// Entire worldwide grid resident in memory.
#[derive(Debug)]
pub struct Egm2008FullGrid {
    header: GridHeader,
    heights: Vec<f32>,
}

impl Egm2008FullGrid {
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let header = GridHeader::read_from(&mut reader)?;
        let count = (header.n_grid_rows * header.n_grid_cols) as usize;
        let mut buf = vec![0u8; count * 4];
        reader.read_exact(&mut buf).map_err(|_| Error::GeoidFileParseError("egm2008 grid".into()))?;
        let heights = buf.chunks_exact(4).map(|c| f32::from_be_bytes(c.try_into().unwrap())).collect();
        Ok(Self { header, heights })
    }

    pub fn geoid_height(&self, lon: f64, lat: f64, w_size: usize) -> Result<f64> {
        let window = Window {
            buffer: &self.heights,
            rows: self.header.n_grid_rows,
            cols: self.header.n_grid_cols,
            row_min: 0,
            col_min: 0,
        };
        geoid_height(&self.header, &window, w_size, lat, lon)
    }
}

/// A bounded window into the worldwide grid, reloaded from disk as the
/// query point moves outside its current extent. `path` is kept so the
/// window can be refreshed without reopening the caller's original
/// reader.
pub struct Egm2008AoiGrid<R> {
    header: GridHeader,
    reader: R,
    heights: Vec<f32>,
    rows: i64,
    cols: i64,
    row_min: i64,
    row_max: i64,
    col_min: i64,
    col_max: i64,
}

impl<R: Read + Seek> Egm2008AoiGrid<R> {
    pub fn open(mut reader: R) -> Result<Self> {
        let header = GridHeader::read_from(&mut reader)?;
        Ok(Self {
            header,
            reader,
            heights: Vec::new(),
            rows: 0,
            cols: 0,
            row_min: 0,
            row_max: -1,
            col_min: 0,
            col_max: -1,
        })
    }

    pub fn geoid_height(&mut self, lon: f64, lat: f64, w_size: usize) -> Result<f64> {
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&lat) {
            return Err(Error::Latitude);
        }
        let lon = normalize_longitude(lon);
        let w_size = w_size.min(MAX_WINDOW);

        let lat_index = self.header.n_pad as f64 + (lat + FRAC_PI_2) / self.header.d_lat;
        let lon_index = self.header.n_pad as f64 + lon / self.header.d_lon;

        let odd_size = w_size % 2 != 0;
        let (i0, j0) = if odd_size { ((lat_index + 0.5) as i64, (lon_index + 0.5) as i64) } else { (lat_index as i64, lon_index as i64) };
        let half = (w_size / 2) as i64;
        let (i_min, j_min) = if odd_size { (i0 - half, j0 - half) } else { (i0 - half + 1, j0 - half + 1) };
        let i_max = i_min + w_size as i64 - 1;
        let j_max = j_min + w_size as i64 - 1;

        if self.heights.is_empty() || i_min < self.row_min || i_max > self.row_max || j_min < self.col_min || j_max > self.col_max {
            self.reload_around(i0, j0)?;
        }

        let window = Window {
            buffer: &self.heights,
            rows: self.rows,
            cols: self.cols,
            row_min: self.row_min,
            col_min: self.col_min,
        };
        geoid_height(&self.header, &window, w_size, lat, lon)
    }

    /// Recompute the resident window's extent around grid intersection
    /// `(i0, j0)` and reload it from disk. Column count shrinks toward
    /// the poles so the window covers a roughly constant ground
    /// distance (about 125nm on a side at the equator).
    fn reload_around(&mut self, i0: i64, j0: i64) -> Result<()> {
        let (latitude, _) = self.header.load_grid_coords(i0, j0)?;

        let e_squared = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);
        let sin_lat = latitude.sin();
        let n_radius = WGS84_SEMI_MAJOR_AXIS / (1.0 - e_squared * sin_lat * sin_lat).sqrt();

        let ew_delta0 = WGS84_SEMI_MAJOR_AXIS * self.header.d_lon;
        let ew_delta = n_radius * self.header.d_lon * latitude.cos();
        let ratio = (ew_delta / ew_delta0).max(AOI_RATIO_FLOOR);

        let mut n_aoi_cols = (NOMINAL_AOI_COLS as f64 / ratio) as i64;
        n_aoi_cols = 2 * (n_aoi_cols / 2);
        let n_aoi_rows = 2 * (NOMINAL_AOI_ROWS / 2);

        let mut row_min = i0 - ((n_aoi_rows - 2) / 2) + 1;
        let mut row_max = row_min + n_aoi_rows - 1;
        let mut col_min = j0 - ((n_aoi_cols - 2) / 2) + 1;
        let mut col_max = col_min + n_aoi_cols - 1;

        if row_min < 0 {
            row_min = 0;
            row_max = row_min + n_aoi_rows - 1;
        }
        if row_max >= self.header.n_grid_rows {
            row_max = self.header.n_grid_rows - 1;
            row_min = row_max - n_aoi_rows + 1;
        }
        if col_min < 0 {
            col_min = 0;
            col_max = col_min + n_aoi_cols - 1;
        }
        if col_max >= self.header.n_grid_cols {
            col_max = self.header.n_grid_cols - 1;
            col_min = col_max - n_aoi_cols + 1;
        }

        let mut heights = vec![0.0f32; (n_aoi_rows * n_aoi_cols) as usize];
        let mut index0 = 0usize;
        let mut row = row_max;
        while row >= row_min {
            let byte_offset = BYTES_IN_HEADER as i64 + 4 * (col_min + self.header.file_row_offset(row) * self.header.n_grid_cols);
            self.reader.seek(SeekFrom::Start(byte_offset as u64)).map_err(|_| Error::GeoidFileOpenError("egm2008 grid".into()))?;

            let mut buf = vec![0u8; n_aoi_cols as usize * 4];
            self.reader.read_exact(&mut buf).map_err(|_| Error::GeoidFileParseError("egm2008 grid".into()))?;
            for (dst, src) in heights[index0..index0 + n_aoi_cols as usize].iter_mut().zip(buf.chunks_exact(4)) {
                *dst = f32::from_be_bytes(src.try_into().unwrap());
            }

            index0 += n_aoi_cols as usize;
            row -= 1;
        }

        self.heights = heights;
        self.rows = n_aoi_rows;
        self.cols = n_aoi_cols;
        self.row_min = row_min;
        self.row_max = row_max;
        self.col_min = col_min;
        self.col_max = col_max;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(n_pad: i64, n_orig_rows: i64, n_orig_cols: i64, d_lat_deg: f64, d_lon_deg: f64) -> GridHeader {
        let d_lat = deg_to_rad(d_lat_deg);
        let d_lon = deg_to_rad(d_lon_deg);
        GridHeader {
            n_pad,
            n_orig_rows,
            n_orig_cols,
            n_grid_rows: n_orig_rows + 2 * n_pad,
            n_grid_cols: n_orig_cols + 2 * n_pad + 1,
            base_latitude: -FRAC_PI_2 - d_lat * n_pad as f64,
            base_longitude: -d_lon * n_pad as f64,
            d_lat,
            d_lon,
        }
    }

    #[test]
    fn uniform_full_grid_bicubic() {
        let h = header(3, 72, 144, 2.5, 2.5);
        let heights = vec![9.0f32; (h.n_grid_rows * h.n_grid_cols) as usize];
        let grid = Egm2008FullGrid { header: h, heights };
        let height = grid.geoid_height(deg_to_rad(20.0), deg_to_rad(10.0), DEFAULT_WINDOW).unwrap();
        assert!((height - 9.0).abs() < 1e-3);
    }

    #[test]
    fn uniform_full_grid_bilinear_fallback() {
        let h = header(3, 72, 144, 2.5, 2.5);
        let heights = vec![4.0f32; (h.n_grid_rows * h.n_grid_cols) as usize];
        let grid = Egm2008FullGrid { header: h, heights };
        let height = grid.geoid_height(deg_to_rad(20.0), deg_to_rad(10.0), 1).unwrap();
        assert!((height - 4.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let h = header(3, 72, 144, 2.5, 2.5);
        let heights = vec![4.0f32; (h.n_grid_rows * h.n_grid_cols) as usize];
        let grid = Egm2008FullGrid { header: h, heights };
        assert!(grid.geoid_height(0.0, 2.0, DEFAULT_WINDOW).is_err());
    }

    #[test]
    fn aoi_grid_reloads_and_matches_full_grid() {
        let h = header(3, 72, 144, 2.5, 2.5);
        let count = (h.n_grid_rows * h.n_grid_cols) as usize;
        let heights = vec![6.0f32; count];

        let mut bytes = Vec::with_capacity(BYTES_IN_HEADER + count * 4);
        bytes.extend_from_slice(&(h.n_pad as i32).to_be_bytes());
        bytes.extend_from_slice(&(h.n_orig_rows as i32).to_be_bytes());
        bytes.extend_from_slice(&(h.n_orig_cols as i32).to_be_bytes());
        bytes.extend_from_slice(&(2.5f64).to_be_bytes());
        bytes.extend_from_slice(&(2.5f64).to_be_bytes());
        for v in &heights {
            bytes.extend_from_slice(&v.to_be_bytes());
        }

        let mut aoi = Egm2008AoiGrid::open(Cursor::new(bytes)).unwrap();
        let height = aoi.geoid_height(deg_to_rad(20.0), deg_to_rad(10.0), DEFAULT_WINDOW).unwrap();
        assert!((height - 6.0).abs() < 1e-3);
    }
}
