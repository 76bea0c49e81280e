//!
//! Map projection modules
//!
//! Each projection module is opaque: it knows nothing about grid zones,
//! datums or geoids, only how to go from geodetic (lon, lat) in radians
//! on a given ellipsoid to projected (easting, northing) in meters, and
//! back. The grid layer (`crate::grid`) owns zone/hemisphere selection
//! and false-origin bookkeeping and drives these modules.
//!
pub mod polar_stereographic;
pub mod transverse_mercator;

use crate::errors::Result;

/// Fixed parameters of a single projection instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSet {
    /// Semi-major axis, meters.
    pub a: f64,
    /// First eccentricity squared.
    pub es: f64,
    /// Central meridian / longitude of origin, radians.
    pub central_meridian: f64,
    /// Latitude of origin, radians.
    pub origin_latitude: f64,
    /// Scale factor at the central meridian / pole.
    pub scale_factor: f64,
    /// False easting, meters.
    pub false_easting: f64,
    /// False northing, meters.
    pub false_northing: f64,
}

/// Common interface every opaque projection module implements.
pub trait Projection {
    /// Geodetic (lon, lat) in radians -> projected (easting, northing) in meters.
    fn convert_from_geodetic(&self, lon: f64, lat: f64) -> Result<(f64, f64)>;

    /// Projected (easting, northing) in meters -> geodetic (lon, lat) in radians.
    fn convert_to_geodetic(&self, easting: f64, northing: f64) -> Result<(f64, f64)>;

    /// The parameters this instance was built with.
    fn parameters(&self) -> &ParamSet;
}
