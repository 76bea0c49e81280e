//!
//! `3_param.dat` / `7_param.dat` readers and writers
//!
//! Both are whitespace-separated text with a quoted name field; a leading
//! `*` on the code marks a user-defined entry (spec 6).
//!
use crate::constants::{deg_to_rad, ARCSEC_PER_RADIAN};
use crate::errors::{Error, Result};
use std::fs;
use std::path::Path;

use super::{Datum, DatumKind, ValidityRectangle};

/// Split a line into whitespace-separated tokens, treating a `"..."` run as
/// a single token (used for the datum name field).
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut s = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                s.push(c);
            }
            tokens.push(s);
        } else {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                s.push(c);
                chars.next();
            }
            tokens.push(s);
        }
    }
    tokens
}

fn parse_f64(tok: Option<&String>, path: &Path) -> Result<f64> {
    tok.and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::DatumFileParseError(path.display().to_string()))
}

pub(super) fn read_seven_param(path: &Path) -> Result<Vec<Datum>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Ok(Vec::new()),
    };
    let mut out = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let toks = tokenize(line);
        if toks.len() < 10 {
            return Err(Error::DatumFileParseError(path.display().to_string()));
        }
        let (user_defined, code) = match toks[0].strip_prefix('*') {
            Some(c) => (true, c.to_string()),
            None => (false, toks[0].clone()),
        };
        let name = toks[1].clone();
        let ellipsoid_code = toks[2].clone();
        let dx = parse_f64(toks.get(3), path)?;
        let dy = parse_f64(toks.get(4), path)?;
        let dz = parse_f64(toks.get(5), path)?;
        let rx = parse_f64(toks.get(6), path)? / ARCSEC_PER_RADIAN;
        let ry = parse_f64(toks.get(7), path)? / ARCSEC_PER_RADIAN;
        let rz = parse_f64(toks.get(8), path)? / ARCSEC_PER_RADIAN;
        let scale = parse_f64(toks.get(9), path)?;
        out.push(Datum {
            index: 0,
            code,
            ellipsoid_code,
            name,
            dx,
            dy,
            dz,
            validity: ValidityRectangle::whole_globe(),
            user_defined,
            kind: DatumKind::SevenParam { rx, ry, rz, scale },
        });
    }
    Ok(out)
}

pub(super) fn read_three_param(path: &Path) -> Result<Vec<Datum>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Ok(Vec::new()),
    };
    let mut out = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let toks = tokenize(line);
        if toks.len() < 13 {
            return Err(Error::DatumFileParseError(path.display().to_string()));
        }
        let (user_defined, code) = match toks[0].strip_prefix('*') {
            Some(c) => (true, c.to_string()),
            None => (false, toks[0].clone()),
        };
        let name = toks[1].clone();
        let ellipsoid_code = toks[2].clone();
        let dx = parse_f64(toks.get(3), path)?;
        let sigma_x = parse_f64(toks.get(4), path)?;
        let dy = parse_f64(toks.get(5), path)?;
        let sigma_y = parse_f64(toks.get(6), path)?;
        let dz = parse_f64(toks.get(7), path)?;
        let sigma_z = parse_f64(toks.get(8), path)?;
        let south_lat = deg_to_rad(parse_f64(toks.get(9), path)?);
        let north_lat = deg_to_rad(parse_f64(toks.get(10), path)?);
        let west_lon = deg_to_rad(parse_f64(toks.get(11), path)?);
        let east_lon = deg_to_rad(parse_f64(toks.get(12), path)?);
        out.push(Datum {
            index: 0,
            code,
            ellipsoid_code,
            name,
            dx,
            dy,
            dz,
            validity: ValidityRectangle {
                west_lon,
                east_lon,
                south_lat,
                north_lat,
            },
            user_defined,
            kind: DatumKind::ThreeParam {
                sigma_x,
                sigma_y,
                sigma_z,
            },
        });
    }
    Ok(out)
}

pub(super) fn write_seven_param(path: &Path, datums: &[Datum]) -> Result<()> {
    let mut text = String::new();
    for d in datums {
        let (rx, ry, rz, scale) = match d.kind {
            DatumKind::SevenParam { rx, ry, rz, scale } => (rx, ry, rz, scale),
            _ => continue,
        };
        let code = if d.user_defined {
            format!("*{}", d.code)
        } else {
            d.code.clone()
        };
        text.push_str(&format!(
            "{} \"{}\" {} {} {} {} {} {} {} {}\n",
            code,
            d.name,
            d.ellipsoid_code,
            d.dx,
            d.dy,
            d.dz,
            rx * ARCSEC_PER_RADIAN,
            ry * ARCSEC_PER_RADIAN,
            rz * ARCSEC_PER_RADIAN,
            scale
        ));
    }
    fs::write(path, text).map_err(|_| Error::DatumFileOpenError(path.display().to_string()))
}

pub(super) fn write_three_param(path: &Path, datums: &[Datum]) -> Result<()> {
    use crate::constants::rad_to_deg;
    let mut text = String::new();
    for d in datums {
        let (sigma_x, sigma_y, sigma_z) = match d.kind {
            DatumKind::ThreeParam {
                sigma_x,
                sigma_y,
                sigma_z,
            } => (sigma_x, sigma_y, sigma_z),
            _ => continue,
        };
        let code = if d.user_defined {
            format!("*{}", d.code)
        } else {
            d.code.clone()
        };
        text.push_str(&format!(
            "{} \"{}\" {} {} {} {} {} {} {} {} {} {} {}\n",
            code,
            d.name,
            d.ellipsoid_code,
            d.dx,
            sigma_x,
            d.dy,
            sigma_y,
            d.dz,
            sigma_z,
            rad_to_deg(d.validity.south_lat),
            rad_to_deg(d.validity.north_lat),
            rad_to_deg(d.validity.west_lon),
            rad_to_deg(d.validity.east_lon),
        ));
    }
    fs::write(path, text).map_err(|_| Error::DatumFileOpenError(path.display().to_string()))
}
