//!
//! Small numeric helpers shared by the datum shift and projection modules
//!
use crate::constants::{PI, TAU};
use crate::errors::{Error, Result};

/// Normalize a longitude into (-pi, pi], folding any full revolutions.
pub(crate) fn adjlon(mut lon: f64) -> f64 {
    if lon.abs() > PI {
        lon += PI;
        lon -= TAU * (lon / TAU).floor();
        lon -= PI;
    }
    lon
}

/// Normalize a longitude into (-pi, 2*pi], as used by the Molodensky
/// target-longitude convention in spec 4.3.
pub(crate) fn adjlon_signed_or_wrapped(mut lon: f64) -> f64 {
    while lon > TAU {
        lon -= TAU;
    }
    while lon <= -PI {
        lon += TAU;
    }
    lon
}

/// `W = sqrt(1 - e^2 sin^2(phi))`
#[inline]
pub(crate) fn w_factor(sin_phi: f64, es: f64) -> f64 {
    (1.0 - es * sin_phi * sin_phi).sqrt()
}

/// Meridional radius of curvature `M = a(1-e^2) / W^3`
#[inline]
pub(crate) fn meridional_radius(a: f64, es: f64, w: f64) -> f64 {
    a * (1.0 - es) / (w * w * w)
}

/// Prime-vertical radius of curvature `N = a / W`
#[inline]
pub(crate) fn prime_vertical_radius(a: f64, w: f64) -> f64 {
    a / w
}

/// Second eccentricity squared `e'^2 = e^2 / (1 - e^2)`
#[inline]
pub(crate) fn second_eccentricity_sq(es: f64) -> f64 {
    es / (1.0 - es)
}

/// Isometric colatitude function used by the polar aspect of the
/// stereographic projection (Snyder eq. 15-9).
#[inline]
pub(crate) fn tsfn(phi: f64, sin_phi: f64, e: f64) -> f64 {
    (0.5 * (crate::constants::FRAC_PI_2 - phi)).tan() / ((1.0 - sin_phi * e) / (1.0 + sin_phi * e)).powf(0.5 * e)
}

/// Coefficients of the meridional-arc series (Snyder eq. 3-21).
pub(crate) type Enfn = (f64, f64, f64, f64, f64);

/// Series coefficients for the ellipsoidal meridional distance and its
/// inverse, accurate to below 1e-5 m for typical major-axis values.
pub(crate) fn enfn(es: f64) -> Enfn {
    const C00: f64 = 1.;
    const C02: f64 = 0.25;
    const C04: f64 = 0.046875;
    const C06: f64 = 0.01953125;
    const C08: f64 = 0.01068115234375;
    const C22: f64 = 0.75;
    const C44: f64 = 0.46875;
    const C46: f64 = 0.013_020_833_333_333_334;
    const C48: f64 = 0.007_120_768_229_166_667;
    const C66: f64 = 0.364_583_333_333_333_3;
    const C68: f64 = 0.005_696_614_583_333_334;
    const C88: f64 = 0.3076171875;

    let t = es * es;
    (
        C00 - es * (C02 + es * (C04 + es * (C06 + es * C08))),
        es * (C22 - es * (C04 + es * (C06 + es * C08))),
        t * (C44 - es * (C46 + es * C48)),
        t * es * (C66 - es * C68),
        t * t * es * C88,
    )
}

/// Meridional distance from the equator to latitude `phi`.
pub(crate) fn mlfn(phi: f64, mut sin_phi: f64, mut cos_phi: f64, en: Enfn) -> f64 {
    cos_phi *= sin_phi;
    sin_phi *= sin_phi;
    en.0 * phi - cos_phi * (en.1 + sin_phi * (en.2 + sin_phi * (en.3 + sin_phi * en.4)))
}

/// Inverse of [`mlfn`]: recovers latitude from meridional distance.
pub(crate) fn inv_mlfn(arg: f64, es: f64, en: Enfn) -> Result<f64> {
    const MAX_ITER: usize = 10;
    const EPS: f64 = 1e-11;
    let k = 1. / (1. - es);
    let mut phi = arg;
    let mut i = MAX_ITER;
    while i > 0 {
        let s = phi.sin();
        let mut t = 1. - es * s * s;
        t = (mlfn(phi, s, phi.cos(), en) - arg) * (t * t.sqrt()) * k;
        phi -= t;
        if t.abs() < EPS {
            break;
        }
        i -= 1;
    }
    if i > 0 {
        Ok(phi)
    } else {
        Err(Error::ProjectionConvergence)
    }
}
