//!
//! Ellipsoidal Transverse Mercator (Evenden/Snyder series form)
//!
//! Backs the UTM grid: central meridian, origin latitude, scale factor
//! and false easting/northing are all supplied by the caller rather than
//! fixed here, since UPS-adjacent UTM zones and the rare non-standard
//! zone override all reuse this same module with different parameters.
//!
use super::{ParamSet, Projection as ProjectionTrait};
use crate::errors::{Error, Result};
use crate::math::{enfn, inv_mlfn, mlfn, Enfn};

const EPS_10: f64 = 1.0e-10;
const FRAC_PI_2: f64 = std::f64::consts::FRAC_PI_2;

const FC1: f64 = 1.;
const FC2: f64 = 0.5;
const FC3: f64 = 0.16666666666666666666;
const FC4: f64 = 0.08333333333333333333;
const FC5: f64 = 0.05;
const FC6: f64 = 0.03333333333333333333;
const FC7: f64 = 0.02380952380952380952;
const FC8: f64 = 0.01785714285714285714;

#[derive(Debug)]
pub struct TransverseMercator {
    params: ParamSet,
    esp: f64,
    en: Enfn,
    ml0: f64,
}

impl TransverseMercator {
    pub fn new(params: ParamSet) -> Result<Self> {
        if params.a <= 0.0 {
            return Err(Error::SemiMajorAxis);
        }
        let en = enfn(params.es);
        let ml0 = mlfn(
            params.origin_latitude,
            params.origin_latitude.sin(),
            params.origin_latitude.cos(),
            en,
        );
        Ok(Self {
            params,
            esp: params.es / (1.0 - params.es),
            en,
            ml0,
        })
    }
}

impl ProjectionTrait for TransverseMercator {
    fn convert_from_geodetic(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let lam = lon - self.params.central_meridian;
        if lam < -FRAC_PI_2 || lam > FRAC_PI_2 {
            return Err(Error::LongitudeOutsideProjectionDomain);
        }

        let (sinphi, cosphi) = lat.sin_cos();
        let mut t = if cosphi.abs() > EPS_10 { sinphi / cosphi } else { 0.0 };
        t *= t;
        let mut al = cosphi * lam;
        let als = al * al;
        al /= (1.0 - self.params.es * sinphi * sinphi).sqrt();
        let n = self.esp * cosphi * cosphi;

        let k0 = self.params.scale_factor;
        let x = k0
            * al
            * (FC1
                + FC3
                    * als
                    * (1. - t + n
                        + FC5
                            * als
                            * (5. + t * (t - 18.) + n * (14. - 58. * t)
                                + FC7 * als * (61. + t * (t * (179. - t) - 479.)))));
        let y = k0
            * (mlfn(lat, sinphi, cosphi, self.en) - self.ml0
                + sinphi * al * lam * FC2
                    * (1.
                        + FC4
                            * als
                            * (5. - t + n * (9. + 4. * n)
                                + FC6
                                    * als
                                    * (61. + t * (t - 58.) + n * (270. - 330. * t)
                                        + FC8 * als * (1385. + t * (t * (543. - t) - 3111.))))));

        Ok((
            x * self.params.a + self.params.false_easting,
            y * self.params.a + self.params.false_northing,
        ))
    }

    fn convert_to_geodetic(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        let x = (easting - self.params.false_easting) / self.params.a;
        let y = (northing - self.params.false_northing) / self.params.a;

        let phi = inv_mlfn(self.ml0 + y / self.params.scale_factor, self.params.es, self.en)?;
        if phi.abs() >= FRAC_PI_2 {
            let lat = if y < 0.0 { -FRAC_PI_2 } else { FRAC_PI_2 };
            return Ok((self.params.central_meridian, lat));
        }

        let (sinphi, cosphi) = phi.sin_cos();
        let mut t = if cosphi.abs() > EPS_10 { sinphi / cosphi } else { 0.0 };
        let n = self.esp * cosphi * cosphi;
        let mut con = 1.0 - self.params.es * sinphi * sinphi;
        let d = x * con.sqrt() / self.params.scale_factor;
        con *= t;
        t *= t;
        let ds = d * d;

        let lam = d
            * (FC1
                - ds * FC3
                    * (1. + 2. * t + n
                        - ds * FC5
                            * (5. + t * (28. + 24. * t + 8. * n) + 6. * n
                                - ds * FC7 * (61. + t * (662. + t * (1320. + 720. * t))))))
            / cosphi;
        let lat = phi
            - (con * ds / (1.0 - self.params.es))
                * FC2
                * (1.
                    - ds * FC4
                        * (5. + t * (3. - 9. * n) + n * (1. - 4. * n)
                            - ds * FC6
                                * (61. + t * (90. - 252. * n + 45. * t) + 46. * n
                                    - ds * FC8 * (1385. + t * (3633. + t * (4095. + 1575. * t))))));

        Ok((lam + self.params.central_meridian, lat))
    }

    fn parameters(&self) -> &ParamSet {
        &self.params
    }
}
