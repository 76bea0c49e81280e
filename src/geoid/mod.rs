//!
//! Geoid separation library
//!
//! Converts WGS84 ellipsoid heights to and from heights above the geoid
//! (orthometric heights) using one of several gravity-model grids. Every
//! grid is loaded best-effort at first use: a process can run with
//! whichever grid files are present in `MSPCCS_DATA`, so long as at
//! least one loads (mirroring the teacher-adjacent source's
//! "succeed if one model is available" semantics for this library).
//!
mod egm2008;
mod egm84;
mod egm96_bilinear;
mod egm96_variable;
mod spline;

use crate::errors::{Error, Result};
use crate::log::trace;
use lazy_static::lazy_static;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

pub use egm2008::DEFAULT_WINDOW as EGM2008_DEFAULT_WINDOW;

/// Which gravity-model grid to interpolate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoidModel {
    Egm96Bilinear,
    Egm96Variable,
    Egm84TenDegBilinear,
    Egm84TenDegSpline,
    Egm84ThirtyMin,
    Egm2008,
}

fn data_dir() -> PathBuf {
    env::var("MSPCCS_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("../../data/"))
}

/// The EGM2008 interpolator's residency strategy, chosen once at load
/// time from `EGM2008_GRID_USAGE`: `FULL` reads the entire worldwide
/// grid up front, anything else (including unset) uses a reloading
/// area-of-interest window sized to roughly 125nm on a side.
enum Egm2008Model {
    Full(egm2008::Egm2008FullGrid),
    Aoi(egm2008::Egm2008AoiGrid<File>),
}

impl Egm2008Model {
    fn geoid_height(&mut self, lon: f64, lat: f64, w_size: usize) -> Result<f64> {
        match self {
            Egm2008Model::Full(grid) => grid.geoid_height(lon, lat, w_size),
            Egm2008Model::Aoi(grid) => grid.geoid_height(lon, lat, w_size),
        }
    }
}

struct Table {
    egm96: Option<egm96_bilinear::Egm96Grid>,
    egm84_ten_deg: Option<egm84::Egm84TenDegGrid>,
    egm84_thirty_min: Option<egm84::Egm84ThirtyMinGrid>,
    egm2008: Option<Egm2008Model>,
}

impl Table {
    fn load() -> Result<Self> {
        let dir = data_dir();
        trace!("loading geoid grids from {}", dir.display());

        let egm96 = File::open(dir.join("egm96.grd")).ok().and_then(|f| egm96_bilinear::Egm96Grid::read_from(f).ok());
        let egm84_ten_deg = File::open(dir.join("egm84.grd")).ok().and_then(|f| egm84::Egm84TenDegGrid::read_from(f).ok());
        let egm84_thirty_min = File::open(dir.join("wwgrid.bin")).ok().and_then(|f| egm84::Egm84ThirtyMinGrid::read_from(f).ok());
        let egm2008 = Self::load_egm2008(&dir);

        if egm96.is_none() && egm84_ten_deg.is_none() && egm84_thirty_min.is_none() && egm2008.is_none() {
            return Err(Error::GeoidFileOpenError("no geoid grid files available".into()));
        }

        Ok(Self {
            egm96,
            egm84_ten_deg,
            egm84_thirty_min,
            egm2008,
        })
    }

    fn load_egm2008(dir: &PathBuf) -> Option<Egm2008Model> {
        let path = dir.join("egm2008.grd");
        match env::var("EGM2008_GRID_USAGE").as_deref() {
            Ok("FULL") => File::open(&path).ok().and_then(|f| egm2008::Egm2008FullGrid::read_from(f).ok()).map(Egm2008Model::Full),
            _ => File::open(&path).ok().and_then(|f| egm2008::Egm2008AoiGrid::open(f).ok()).map(Egm2008Model::Aoi),
        }
    }
}

lazy_static! {
    static ref TABLE: Mutex<Option<Table>> = Mutex::new(None);
}

/// Handle to the process-wide geoid library.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoidLibrary;

impl GeoidLibrary {
    pub fn instance() -> Self {
        GeoidLibrary
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut Table) -> Result<R>) -> Result<R> {
        let mut guard = TABLE.lock().unwrap();
        if guard.is_none() {
            *guard = Some(Table::load()?);
        }
        f(guard.as_mut().unwrap())
    }

    /// Geoid separation N (meters) at `(lon, lat)` radians, using `model`.
    pub fn separation(&self, model: GeoidModel, lon: f64, lat: f64) -> Result<f64> {
        self.with_table(|t| match model {
            GeoidModel::Egm96Bilinear => t.egm96.as_ref().ok_or(Error::GeoidFileOpenError("egm96.grd".into()))?.height(lon, lat),
            GeoidModel::Egm96Variable => {
                let grid = t.egm96.as_ref().ok_or(Error::GeoidFileOpenError("egm96.grd".into()))?;
                egm96_variable::height(grid, lon, lat)
            }
            GeoidModel::Egm84TenDegBilinear => t.egm84_ten_deg.as_ref().ok_or(Error::GeoidFileOpenError("egm84.grd".into()))?.height_bilinear(lon, lat),
            GeoidModel::Egm84TenDegSpline => t.egm84_ten_deg.as_ref().ok_or(Error::GeoidFileOpenError("egm84.grd".into()))?.height_natural_spline(lon, lat),
            GeoidModel::Egm84ThirtyMin => t.egm84_thirty_min.as_ref().ok_or(Error::GeoidFileOpenError("wwgrid.bin".into()))?.height(lon, lat),
            GeoidModel::Egm2008 => t
                .egm2008
                .as_mut()
                .ok_or(Error::GeoidFileOpenError("egm2008.grd".into()))?
                .geoid_height(lon, lat, egm2008::DEFAULT_WINDOW),
        })
    }

    /// `ellipsoidHeight - N`: WGS84 ellipsoid height to height above the
    /// geoid. The GeoidLibrary's own naming convention ("geoid height")
    /// refers to this orthometric height, not to `N` itself.
    pub fn ellipsoid_to_geoid_height(&self, model: GeoidModel, lon: f64, lat: f64, ellipsoid_height: f64) -> Result<f64> {
        Ok(ellipsoid_height - self.separation(model, lon, lat)?)
    }

    /// `geoidHeight + N`: height above the geoid back to WGS84 ellipsoid
    /// height.
    pub fn geoid_height_to_ellipsoid(&self, model: GeoidModel, lon: f64, lat: f64, geoid_height: f64) -> Result<f64> {
        Ok(geoid_height + self.separation(model, lon, lat)?)
    }

    /// `true` once at least one grid successfully loaded.
    pub fn is_available(&self) -> bool {
        self.with_table(|_| Ok(())).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_fails_cleanly_without_data_dir() {
        std::env::set_var("MSPCCS_DATA", "/nonexistent/geotrans-test-data/");
        let table = Table::load();
        assert!(table.is_err());
    }
}
