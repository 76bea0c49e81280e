//!
//! Coordinate tuple sum type
//!
//! Every variant carries the same two optional side channels: a non-fatal
//! warning attached by a stage that noticed something worth flagging (band
//! crossing, distortion near the edge of a projection, location outside a
//! datum's validity rectangle) and a fatal error recorded on the tuple
//! itself so that batch operations can report a per-tuple failure without
//! aborting the collection (spec 3, 7).
//!
use crate::precision::Precision;

#[derive(Debug, Clone, PartialEq)]
pub enum Hemisphere {
    North,
    South,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geodetic {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    pub easting: f64,
    pub northing: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utm {
    pub zone: u8,
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ups {
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringCoord {
    pub value: String,
    pub precision: Precision,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateKind {
    Geodetic(Geodetic),
    Cartesian(Cartesian),
    MapProjection(MapProjection),
    Utm(Utm),
    Ups(Ups),
    MgrsOrUsng(StringCoord),
    Bng(StringCoord),
    Georef(StringCoord),
    Gars(StringCoord),
}

/// A coordinate tuple: a tagged variant plus the warning/error side channels
/// every stage of the conversion service reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTuple {
    pub kind: CoordinateKind,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl CoordinateTuple {
    pub fn new(kind: CoordinateKind) -> Self {
        Self {
            kind,
            warning: None,
            error: None,
        }
    }

    pub fn geodetic(lon: f64, lat: f64, height: f64) -> Self {
        Self::new(CoordinateKind::Geodetic(Geodetic { lon, lat, height }))
    }

    pub fn cartesian(x: f64, y: f64, z: f64) -> Self {
        Self::new(CoordinateKind::Cartesian(Cartesian { x, y, z }))
    }

    pub fn as_geodetic(&self) -> Option<&Geodetic> {
        match &self.kind {
            CoordinateKind::Geodetic(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_cartesian(&self) -> Option<&Cartesian> {
        match &self.kind {
            CoordinateKind::Cartesian(c) => Some(c),
            _ => None,
        }
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        // A tuple carries a single warning slot; the first one attached
        // wins, mirroring the C++ source's single WarningMessages buffer.
        if self.warning.is_none() {
            self.warning = Some(message.into());
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
