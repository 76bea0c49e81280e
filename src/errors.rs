//!
//! Crate errors
//!

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("semi-major axis must be positive")]
    SemiMajorAxis,
    #[error("inverse flattening must lie in [250, 350]")]
    EllipsoidFlattening,
    #[error("unrecognized ellipsoid code '{0}'")]
    InvalidEllipsoidCode(String),
    #[error("ellipsoid '{0}' is still referenced by a datum")]
    EllipseInUse(String),
    #[error("entry is not user-defined")]
    NotUserDefined,
    #[error("unrecognized datum code '{0}'")]
    InvalidDatumCode(String),
    #[error("index {0} out of range")]
    InvalidIndex(usize),
    #[error("latitude out of range")]
    Latitude,
    #[error("longitude out of range")]
    Longitude,
    #[error("coordinate outside datum validity rectangle")]
    DatumDomain,
    #[error("rotation angle out of range [-60\", +60\"]")]
    DatumRotation,
    #[error("scale factor out of range [-1e-3, +1e-3]")]
    ScaleFactor,
    #[error("standard error must be positive or -1")]
    DatumSigma,
    #[error("unknown datum type")]
    DatumType,
    #[error("could not open datum file '{0}'")]
    DatumFileOpenError(String),
    #[error("could not parse datum file '{0}'")]
    DatumFileParseError(String),
    #[error("could not open ellipsoid file '{0}'")]
    EllipsoidFileOpenError(String),
    #[error("could not parse ellipsoid file '{0}'")]
    EllipsoidFileParseError(String),
    #[error("could not open geoid file '{0}'")]
    GeoidFileOpenError(String),
    #[error("could not parse geoid file '{0}'")]
    GeoidFileParseError(String),
    #[error("invalid MGRS string '{0}'")]
    MgrsString(String),
    #[error("invalid USNG string '{0}'")]
    UsngString(String),
    #[error("invalid UTM zone {0}")]
    Zone(i32),
    #[error("requested zone override is not within +/-1 of the natural zone")]
    ZoneOverride,
    #[error("invalid hemisphere")]
    Hemisphere,
    #[error("easting out of range")]
    Easting,
    #[error("northing out of range")]
    Northing,
    #[error("invalid precision")]
    Precision,
    #[error("ellipsoid library unavailable")]
    Ellipse,
    #[error("longitude too far from the central meridian for this projection")]
    LongitudeOutsideProjectionDomain,
    #[error("point falls outside the domain of this projection")]
    CoordTransOutsideProjectionDomain,
    #[error("projection series failed to converge")]
    ProjectionConvergence,
    #[error("endpoint has no projection module configured for this coordinate type")]
    NoProjectionConfigured,
}

pub type Result<T> = std::result::Result<T, Error>;
