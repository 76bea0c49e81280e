//!
//! Ellipsoid library
//!
//! Process-wide, lazily-initialized singleton over a read-only-by-default
//! table loaded from `ellips.dat`, with mutators that rewrite the file
//! (spec 4.1). The global table lives behind a single [`Mutex`]; every
//! reader and every mutator takes it, so callers always see a consistent
//! snapshot, following the same discipline as the teacher's nadgrid
//! catalog (`lazy_static! { static ref CATALOG: Mutex<..> }`).
//!
mod io;

use crate::errors::{Error, Result};
use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

/// Immutable-by-convention ellipsoid record (spec 3).
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    pub index: usize,
    pub code: String,
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub f: f64,
    pub es: f64,
    pub user_defined: bool,
}

impl Ellipsoid {
    fn validate(a: f64, f: f64) -> Result<()> {
        if !(a > 0.0) {
            return Err(Error::SemiMajorAxis);
        }
        let inv_f = 1.0 / f;
        if !(250.0..=350.0).contains(&inv_f) {
            return Err(Error::EllipsoidFlattening);
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
    path: PathBuf,
    ellipsoids: Vec<Ellipsoid>,
}

impl Table {
    fn load() -> Result<Self> {
        let path = data_dir().join("ellips.dat");
        let ellipsoids = io::read(&path)?;
        Ok(Self { path, ellipsoids })
    }

    fn normalize_code(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }

    fn index_of(&self, code: &str) -> Result<usize> {
        let code = Self::normalize_code(code);
        self.ellipsoids
            .iter()
            .position(|e| Self::normalize_code(&e.code) == code)
            .ok_or_else(|| Error::InvalidEllipsoidCode(code))
    }
}

lazy_static! {
    static ref TABLE: Mutex<Option<Table>> = Mutex::new(None);
}

/// Handle to the process-wide ellipsoid library. Cheap to clone: every
/// [`crate::service::ConversionService`] holds one, but all of them read
/// and write through the same global table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EllipsoidLibrary;

impl EllipsoidLibrary {
    pub fn instance() -> Self {
        EllipsoidLibrary
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut Table) -> Result<R>) -> Result<R> {
        let mut guard = TABLE.lock().unwrap();
        if guard.is_none() {
            *guard = Some(Table::load()?);
        }
        f(guard.as_mut().unwrap())
    }

    pub fn count(&self) -> Result<usize> {
        self.with_table(|t| Ok(t.ellipsoids.len()))
    }

    pub fn index_of(&self, code: &str) -> Result<usize> {
        self.with_table(|t| t.index_of(code))
    }

    pub fn code_of(&self, index: usize) -> Result<String> {
        self.with_table(|t| {
            t.ellipsoids
                .get(index)
                .map(|e| e.code.clone())
                .ok_or(Error::InvalidIndex(index))
        })
    }

    pub fn name_of(&self, index: usize) -> Result<String> {
        self.with_table(|t| {
            t.ellipsoids
                .get(index)
                .map(|e| e.name.clone())
                .ok_or(Error::InvalidIndex(index))
        })
    }

    /// `(a, f)` for the entry at `index`.
    pub fn parameters(&self, index: usize) -> Result<(f64, f64)> {
        self.with_table(|t| {
            t.ellipsoids
                .get(index)
                .map(|e| (e.a, e.f))
                .ok_or(Error::InvalidIndex(index))
        })
    }

    pub fn eccentricity_sq(&self, index: usize) -> Result<f64> {
        self.with_table(|t| {
            t.ellipsoids
                .get(index)
                .map(|e| e.es)
                .ok_or(Error::InvalidIndex(index))
        })
    }

    pub fn user_defined(&self, index: usize) -> Result<bool> {
        self.with_table(|t| {
            t.ellipsoids
                .get(index)
                .map(|e| e.user_defined)
                .ok_or(Error::InvalidIndex(index))
        })
    }

    pub fn get(&self, index: usize) -> Result<Ellipsoid> {
        self.with_table(|t| t.ellipsoids.get(index).cloned().ok_or(Error::InvalidIndex(index)))
    }

    /// Define a new user ellipsoid, appended and flushed to `ellips.dat`.
    pub fn define(&self, code: &str, name: &str, a: f64, f: f64) -> Result<usize> {
        Ellipsoid::validate(a, f)?;
        self.with_table(|t| {
            if t.index_of(code).is_ok() {
                return Err(Error::InvalidEllipsoidCode(format!(
                    "'{code}' already defined"
                )));
            }
            let index = t.ellipsoids.len();
            let es = 2.0 * f - f * f;
            let b = a * (1.0 - f);
            t.ellipsoids.push(Ellipsoid {
                index,
                code: code.to_string(),
                name: name.to_string(),
                a,
                b,
                f,
                es,
                user_defined: true,
            });
            io::write(&t.path, &t.ellipsoids)?;
            Ok(index)
        })
    }

    /// Remove a user-defined ellipsoid, subject to `ellipse_in_use`
    /// validation performed by the caller (the datum library, which knows
    /// which ellipsoid codes are referenced).
    pub fn remove(&self, code: &str) -> Result<()> {
        self.with_table(|t| {
            let idx = t.index_of(code)?;
            if !t.ellipsoids[idx].user_defined {
                return Err(Error::NotUserDefined);
            }
            t.ellipsoids.remove(idx);
            for (i, e) in t.ellipsoids.iter_mut().enumerate() {
                e.index = i;
            }
            io::write(&t.path, &t.ellipsoids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsoid_relations_hold() {
        // b = a(1-f) and es = 2f - f^2, per the invariants in spec 3.
        let a = 6378137.0;
        let f = 1.0 / 298.257223563;
        let b = a * (1.0 - f);
        let es = 2.0 * f - f * f;
        assert!((b - a * (1.0 - f)).abs() < 1e-9 * a);
        assert!((es - (2.0 * f - f * f)).abs() < 1e-15);
    }

    #[test]
    fn rejects_invalid_flattening() {
        assert_eq!(
            Ellipsoid::validate(6378137.0, 1.0 / 10.0),
            Err(Error::EllipsoidFlattening)
        );
    }

    #[test]
    fn rejects_nonpositive_axis() {
        assert_eq!(
            Ellipsoid::validate(-1.0, 1.0 / 298.0),
            Err(Error::SemiMajorAxis)
        );
    }
}
