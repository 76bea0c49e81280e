//!
//! `ellips.dat` fixed-width reader/writer
//!
//! Each line: `Name(30 chars) Code(2 chars) a(m) b(m) 1/f`. A leading `*` on
//! the name marks a user-defined entry (spec 6).
//!
use crate::errors::{Error, Result};
use std::fs;
use std::path::Path;

use super::Ellipsoid;

pub(super) fn read(path: &Path) -> Result<Vec<Ellipsoid>> {
    let text = fs::read_to_string(path)
        .map_err(|_| Error::EllipsoidFileOpenError(path.display().to_string()))?;
    parse(&text, path)
}

fn parse(text: &str, path: &Path) -> Result<Vec<Ellipsoid>> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if line.len() < 32 {
            return Err(Error::EllipsoidFileParseError(path.display().to_string()));
        }
        let raw_name = &line[0..30];
        let code = line[30..32].trim().to_string();
        let rest = &line[32..];

        let (user_defined, name) = match raw_name.trim_start().strip_prefix('*') {
            Some(stripped) => (true, stripped.trim().to_string()),
            None => (false, raw_name.trim().to_string()),
        };

        let mut fields = rest.split_whitespace();
        let a: f64 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::EllipsoidFileParseError(path.display().to_string()))?;
        let b: f64 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::EllipsoidFileParseError(path.display().to_string()))?;
        let inv_f: f64 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::EllipsoidFileParseError(path.display().to_string()))?;

        let f = 1.0 / inv_f;
        let es = 2.0 * f - f * f;

        out.push(Ellipsoid {
            index: i,
            code,
            name,
            a,
            b,
            f,
            es,
            user_defined,
        });
    }
    Ok(out)
}

pub(super) fn write(path: &Path, ellipsoids: &[Ellipsoid]) -> Result<()> {
    let mut text = String::new();
    for e in ellipsoids {
        let name_field = if e.user_defined {
            format!("*{}", e.name)
        } else {
            e.name.clone()
        };
        text.push_str(&format!(
            "{:<30}{:<2} {:.3} {:.3} {:.9}\n",
            name_field,
            e.code,
            e.a,
            e.b,
            1.0 / e.f
        ));
    }
    fs::write(path, text).map_err(|_| Error::EllipsoidFileOpenError(path.display().to_string()))
}
