//!
//! Ellipsoidal polar Stereographic projection
//!
//! Backs UPS: the pole (north or south) is taken from the sign of the
//! origin latitude, and the scale factor / false easting / false
//! northing are supplied by the caller rather than hard-coded, so the
//! same module serves both UPS hemispheres.
//!
use super::{ParamSet, Projection as ProjectionTrait};
use crate::errors::{Error, Result};
use crate::math::tsfn;

const EPS_10: f64 = 1.0e-10;
const FRAC_PI_2: f64 = std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pole {
    North,
    South,
}

#[derive(Debug)]
pub struct PolarStereographic {
    params: ParamSet,
    pole: Pole,
    e: f64,
    akm1: f64,
}

impl PolarStereographic {
    pub fn new(params: ParamSet) -> Result<Self> {
        if params.a <= 0.0 {
            return Err(Error::SemiMajorAxis);
        }
        let pole = if params.origin_latitude < 0.0 { Pole::South } else { Pole::North };
        let e = params.es.sqrt();
        // Standard parallel at the pole itself, per Snyder eq. 21-33/21-34.
        let akm1 = 2.0 * params.scale_factor / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt();
        Ok(Self { params, pole, e, akm1 })
    }
}

impl ProjectionTrait for PolarStereographic {
    fn convert_from_geodetic(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let lam = lon - self.params.central_meridian;
        let (sinlam, coslam) = lam.sin_cos();
        let sinphi = lat.sin();

        let (x, y) = if (lat.abs() - FRAC_PI_2).abs() < 1e-15 {
            (0.0, 0.0)
        } else {
            match self.pole {
                Pole::South => {
                    let r = self.akm1 * tsfn(-lat, -sinphi, self.e);
                    (r, r * coslam)
                }
                Pole::North => {
                    let r = self.akm1 * tsfn(lat, sinphi, self.e);
                    (r, -r * coslam)
                }
            }
        };

        Ok((
            x * sinlam + self.params.false_easting,
            y + self.params.false_northing,
        ))
    }

    fn convert_to_geodetic(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        let x = easting - self.params.false_easting;
        let y = northing - self.params.false_northing;
        let rho = x.hypot(y);

        let tp = -rho / self.akm1;
        let halfpi = -FRAC_PI_2;
        let halfe = -0.5 * self.e;
        let (xx, yy) = match self.pole {
            Pole::North => (x, -y),
            Pole::South => (x, y),
        };

        let mut phi_l = FRAC_PI_2 - 2.0 * tp.atan();
        const NITER: usize = 8;
        let mut lam = 0.0;
        let mut lat = 0.0;
        let mut i = NITER;
        while i > 0 {
            let sinphi = self.e * phi_l.sin();
            lat = 2.0 * (tp * ((1.0 + sinphi) / (1.0 - sinphi)).powf(halfe)).atan() - halfpi;
            if (phi_l - lat).abs() < EPS_10 {
                if self.pole == Pole::South {
                    lat = -lat;
                }
                lam = if xx == 0.0 && yy == 0.0 { 0.0 } else { xx.atan2(yy) };
                break;
            }
            phi_l = lat;
            i -= 1;
        }

        if i == 0 {
            Err(Error::CoordTransOutsideProjectionDomain)
        } else {
            Ok((lam + self.params.central_meridian, lat))
        }
    }

    fn parameters(&self) -> &ParamSet {
        &self.params
    }
}
