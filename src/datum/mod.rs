//!
//! Datum library
//!
//! Same lifecycle shape as [`crate::ellipsoid::EllipsoidLibrary`]: a
//! process-wide table, lazily built from `WGS84`, `WGS72`, then every
//! 7-parameter entry (kept contiguous so `define_seven_param` can splice
//! after the last one), then every 3-parameter entry appended (spec 4.2).
//!
mod io;

use crate::constants::{deg_to_rad, ARCSEC_PER_RADIAN, PI, TAU};
use crate::ellipsoid::EllipsoidLibrary;
use crate::errors::{Error, Result};
use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidityRectangle {
    pub west_lon: f64,
    pub east_lon: f64,
    pub south_lat: f64,
    pub north_lat: f64,
}

impl ValidityRectangle {
    pub fn whole_globe() -> Self {
        Self {
            west_lon: -PI,
            east_lon: PI,
            south_lat: -std::f64::consts::FRAC_PI_2,
            north_lat: std::f64::consts::FRAC_PI_2,
        }
    }

    /// Test whether `(lon, lat)` falls inside this rectangle, resolving the
    /// antimeridian/prime-meridian ambiguity per spec 4.2: if west/east are
    /// both already in `[-pi,pi]` and `west > east`, the rectangle crosses
    /// the antimeridian and is promoted to `[0, 2pi)`; if both are in
    /// `[0, 2pi)` and `west > east` it crosses the prime meridian and is
    /// demoted to `[-pi, pi)`. The query longitude is shifted into whatever
    /// convention the (possibly-promoted) rectangle ends up using. The
    /// membership test itself is OR-of-out-of-range, resolving the
    /// ambiguous `&&`/`&` guard noted in spec 9.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let (mut west, mut east) = (self.west_lon, self.east_lon);
        let mut lon = lon;

        let both_signed = (-PI..=PI).contains(&west) && (-PI..=PI).contains(&east);
        let both_unsigned = (0.0..=TAU).contains(&west) && (0.0..=TAU).contains(&east);

        if both_signed && west > east {
            // crosses the antimeridian: promote to [0, 2pi)
            if west < 0.0 {
                west += TAU;
            }
            if east < 0.0 {
                east += TAU;
            }
            if lon < 0.0 {
                lon += TAU;
            }
        } else if both_unsigned && west > east {
            // crosses the prime meridian: demote to [-pi, pi)
            if west > PI {
                west -= TAU;
            }
            if east > PI {
                east -= TAU;
            }
            if lon > PI {
                lon -= TAU;
            }
        }

        if lat < self.south_lat || lat > self.north_lat {
            return false;
        }
        !(lon < west || lon > east)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatumKind {
    Wgs84,
    Wgs72,
    ThreeParam {
        sigma_x: f64,
        sigma_y: f64,
        sigma_z: f64,
    },
    SevenParam {
        rx: f64,
        ry: f64,
        rz: f64,
        scale: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub index: usize,
    pub code: String,
    pub ellipsoid_code: String,
    pub name: String,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub validity: ValidityRectangle,
    pub user_defined: bool,
    pub kind: DatumKind,
}

impl Datum {
    fn validate_rotation(r: f64) -> Result<()> {
        let arcsec = r * ARCSEC_PER_RADIAN;
        if !(-60.0..=60.0).contains(&arcsec) {
            return Err(Error::DatumRotation);
        }
        Ok(())
    }

    fn validate_scale(s: f64) -> Result<()> {
        if !(-1.0e-3..=1.0e-3).contains(&s) {
            return Err(Error::ScaleFactor);
        }
        Ok(())
    }

    fn validate_sigma(s: f64) -> Result<()> {
        if s != -1.0 && s <= 0.0 {
            return Err(Error::DatumSigma);
        }
        Ok(())
    }
}

fn data_dir() -> PathBuf {
    env::var("MSPCCS_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("../../data/"))
}

struct Table {
    seven_path: PathBuf,
    three_path: PathBuf,
    datums: Vec<Datum>,
    seven_param_count: usize,
}

impl Table {
    fn load() -> Result<Self> {
        let seven_path = data_dir().join("7_param.dat");
        let three_path = data_dir().join("3_param.dat");

        let mut datums = Vec::new();
        datums.push(Datum {
            index: 0,
            code: "WGE".to_string(),
            ellipsoid_code: "WE".to_string(),
            name: "World Geodetic System 1984".to_string(),
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            validity: ValidityRectangle::whole_globe(),
            user_defined: false,
            kind: DatumKind::Wgs84,
        });
        datums.push(Datum {
            index: 1,
            code: "WGC".to_string(),
            ellipsoid_code: "WD".to_string(),
            name: "World Geodetic System 1972".to_string(),
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            validity: ValidityRectangle::whole_globe(),
            user_defined: false,
            kind: DatumKind::Wgs72,
        });

        let seven = io::read_seven_param(&seven_path)?;
        let seven_param_count = seven.len();
        datums.extend(seven);

        let three = io::read_three_param(&three_path)?;
        datums.extend(three);

        for (i, d) in datums.iter_mut().enumerate() {
            d.index = i;
        }

        Ok(Self {
            seven_path,
            three_path,
            datums,
            seven_param_count,
        })
    }

    fn normalize_code(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }

    fn index_of(&self, code: &str) -> Result<usize> {
        let code = Self::normalize_code(code);
        self.datums
            .iter()
            .position(|d| Self::normalize_code(&d.code) == code)
            .ok_or_else(|| Error::InvalidDatumCode(code))
    }

    fn renumber(&mut self) {
        for (i, d) in self.datums.iter_mut().enumerate() {
            d.index = i;
        }
    }

    fn flush_seven(&self) -> Result<()> {
        let entries: Vec<Datum> = self.datums[2..2 + self.seven_param_count].to_vec();
        io::write_seven_param(&self.seven_path, &entries)
    }

    fn flush_three(&self) -> Result<()> {
        let entries: Vec<Datum> = self.datums[2 + self.seven_param_count..].to_vec();
        io::write_three_param(&self.three_path, &entries)
    }
}

lazy_static! {
    static ref TABLE: Mutex<Option<Table>> = Mutex::new(None);
}

/// Handle to the process-wide datum library. Holds the ellipsoid library
/// handle explicitly, resolving the `setEllipsoidLibraryImplementation`
/// indirection noted in spec 9.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatumLibrary {
    ellipsoids: EllipsoidLibrary,
}

impl DatumLibrary {
    pub fn instance() -> Self {
        Self {
            ellipsoids: EllipsoidLibrary::instance(),
        }
    }

    pub fn ellipsoid_library(&self) -> EllipsoidLibrary {
        self.ellipsoids
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut Table) -> Result<R>) -> Result<R> {
        let mut guard = TABLE.lock().unwrap();
        if guard.is_none() {
            *guard = Some(Table::load()?);
        }
        f(guard.as_mut().unwrap())
    }

    pub fn count(&self) -> Result<usize> {
        self.with_table(|t| Ok(t.datums.len()))
    }

    pub fn index_of(&self, code: &str) -> Result<usize> {
        self.with_table(|t| t.index_of(code))
    }

    pub fn get(&self, index: usize) -> Result<Datum> {
        self.with_table(|t| t.datums.get(index).cloned().ok_or(Error::InvalidIndex(index)))
    }

    pub fn valid_datum(&self, index: usize, lon: f64, lat: f64) -> Result<bool> {
        self.with_table(|t| {
            let d = t.datums.get(index).ok_or(Error::InvalidIndex(index))?;
            Ok(d.validity.contains(lon, lat))
        })
    }

    /// Splice after the last 7-parameter entry, keeping 7-parameter datums
    /// contiguous (spec 4.2).
    #[allow(clippy::too_many_arguments)]
    pub fn define_seven_param(
        &self,
        code: &str,
        name: &str,
        ellipsoid_code: &str,
        dx: f64,
        dy: f64,
        dz: f64,
        rx: f64,
        ry: f64,
        rz: f64,
        scale: f64,
    ) -> Result<usize> {
        Datum::validate_rotation(rx)?;
        Datum::validate_rotation(ry)?;
        Datum::validate_rotation(rz)?;
        Datum::validate_scale(scale)?;
        self.with_table(|t| {
            if t.index_of(code).is_ok() {
                return Err(Error::InvalidDatumCode(format!("'{code}' already defined")));
            }
            let insert_at = 2 + t.seven_param_count;
            t.datums.insert(
                insert_at,
                Datum {
                    index: insert_at,
                    code: code.to_string(),
                    ellipsoid_code: ellipsoid_code.to_string(),
                    name: name.to_string(),
                    dx,
                    dy,
                    dz,
                    validity: ValidityRectangle::whole_globe(),
                    user_defined: true,
                    kind: DatumKind::SevenParam { rx, ry, rz, scale },
                },
            );
            t.seven_param_count += 1;
            t.renumber();
            t.flush_seven()?;
            Ok(insert_at)
        })
    }

    /// Append a 3-parameter entry after every existing one (spec 4.2).
    #[allow(clippy::too_many_arguments)]
    pub fn define_three_param(
        &self,
        code: &str,
        name: &str,
        ellipsoid_code: &str,
        dx: f64,
        sigma_x: f64,
        dy: f64,
        sigma_y: f64,
        dz: f64,
        sigma_z: f64,
        validity: ValidityRectangle,
    ) -> Result<usize> {
        Datum::validate_sigma(sigma_x)?;
        Datum::validate_sigma(sigma_y)?;
        Datum::validate_sigma(sigma_z)?;
        self.with_table(|t| {
            if t.index_of(code).is_ok() {
                return Err(Error::InvalidDatumCode(format!("'{code}' already defined")));
            }
            let index = t.datums.len();
            t.datums.push(Datum {
                index,
                code: code.to_string(),
                ellipsoid_code: ellipsoid_code.to_string(),
                name: name.to_string(),
                dx,
                dy,
                dz,
                validity,
                user_defined: true,
                kind: DatumKind::ThreeParam {
                    sigma_x,
                    sigma_y,
                    sigma_z,
                },
            });
            t.flush_three()?;
            Ok(index)
        })
    }

    pub fn remove(&self, code: &str) -> Result<()> {
        self.with_table(|t| {
            let idx = t.index_of(code)?;
            if !t.datums[idx].user_defined {
                return Err(Error::NotUserDefined);
            }
            let is_seven = idx < 2 + t.seven_param_count;
            t.datums.remove(idx);
            if is_seven {
                t.seven_param_count -= 1;
            }
            t.renumber();
            if is_seven {
                t.flush_seven()
            } else {
                t.flush_three()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_plain_case() {
        let r = ValidityRectangle {
            west_lon: deg_to_rad(-10.0),
            east_lon: deg_to_rad(10.0),
            south_lat: deg_to_rad(-10.0),
            north_lat: deg_to_rad(10.0),
        };
        assert!(r.contains(0.0, 0.0));
        assert!(!r.contains(deg_to_rad(20.0), 0.0));
    }

    #[test]
    fn rectangle_crossing_antimeridian() {
        let r = ValidityRectangle {
            west_lon: deg_to_rad(170.0),
            east_lon: deg_to_rad(-170.0),
            south_lat: deg_to_rad(-10.0),
            north_lat: deg_to_rad(10.0),
        };
        assert!(r.contains(deg_to_rad(180.0), 0.0));
        assert!(r.contains(deg_to_rad(-179.0), 0.0));
        assert!(!r.contains(0.0, 0.0));
    }

    #[test]
    fn rotation_out_of_range_rejected() {
        let too_big = 100.0 / ARCSEC_PER_RADIAN;
        assert_eq!(Datum::validate_rotation(too_big), Err(Error::DatumRotation));
    }

    #[test]
    fn sigma_unknown_sentinel_allowed() {
        assert!(Datum::validate_sigma(-1.0).is_ok());
        assert!(Datum::validate_sigma(0.0).is_err());
    }
}
