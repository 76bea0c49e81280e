//!
//! Conversion service
//!
//! Orchestrates a source endpoint and a target endpoint, each bound to a
//! datum and (optionally) a coordinate-system projection, and converts
//! [`CoordinateTuple`]s between them through WGS84 geodetic as the common
//! intermediate (spec 4.8). Mirrors the teacher's `Proj` (a struct holding
//! projection + datum state with a single `transform` entry point), split
//! into two endpoints because this service moves between two independent
//! configurations rather than always pivoting through WGS84 alone.
//!
use crate::accuracy::Accuracy;
use crate::coordinate::{CoordinateKind, CoordinateTuple, Geodetic, Hemisphere as CoordHemisphere, MapProjection, StringCoord, Ups as UpsCoord, Utm as UtmCoord};
use crate::datum::{Datum, DatumLibrary};
use crate::datum_shift::{self, EllipsoidParams};
use crate::ellipsoid::{Ellipsoid, EllipsoidLibrary};
use crate::errors::{Error, Result};
use crate::grid::{mgrs, ups, utm};
use crate::log::trace;
use crate::projection::Projection;
use std::sync::Arc;

fn ellipsoid_params(e: &Ellipsoid) -> EllipsoidParams {
    EllipsoidParams {
        a: e.a,
        f: e.f,
        es: e.es,
        b: e.b,
    }
}

fn utm_hemisphere(h: CoordHemisphere) -> utm::Hemisphere {
    match h {
        CoordHemisphere::North => utm::Hemisphere::North,
        CoordHemisphere::South => utm::Hemisphere::South,
    }
}

fn utm_hemisphere_back(h: utm::Hemisphere) -> CoordHemisphere {
    match h {
        utm::Hemisphere::North => CoordHemisphere::North,
        utm::Hemisphere::South => CoordHemisphere::South,
    }
}

fn ups_hemisphere(h: CoordHemisphere) -> ups::Hemisphere {
    match h {
        CoordHemisphere::North => ups::Hemisphere::North,
        CoordHemisphere::South => ups::Hemisphere::South,
    }
}

fn ups_hemisphere_back(h: ups::Hemisphere) -> CoordHemisphere {
    match h {
        ups::Hemisphere::North => CoordHemisphere::North,
        ups::Hemisphere::South => CoordHemisphere::South,
    }
}

/// The string precision carried by the source coordinate, if it's one of
/// the string-based kinds; `None` for the numeric kinds, which have no
/// rounding error of their own to inject (spec 4.3's "precision of the
/// source coordinate").
fn source_precision(coord: &CoordinateTuple) -> Option<crate::precision::Precision> {
    match &coord.kind {
        CoordinateKind::MgrsOrUsng(s) | CoordinateKind::Bng(s) | CoordinateKind::Georef(s) | CoordinateKind::Gars(s) => Some(s.precision),
        _ => None,
    }
}

/// One side of a conversion: which datum/ellipsoid to resolve through, and
/// (if this endpoint ever handles a bare [`CoordinateKind::MapProjection`])
/// the projection module driving it. UTM/UPS/MGRS carry their own zone and
/// pole bookkeeping and don't need one.
#[derive(Clone)]
pub struct Endpoint {
    datum: Datum,
    ellipsoid: Ellipsoid,
    zone_override: Option<i32>,
    legacy_mgrs_offset: bool,
    projection: Option<Arc<dyn Projection + Send + Sync>>,
}

impl Endpoint {
    fn new(datum: Datum, ellipsoid: Ellipsoid) -> Self {
        let legacy_mgrs_offset = mgrs::uses_legacy_offset(&ellipsoid.code);
        Self {
            datum,
            ellipsoid,
            zone_override: None,
            legacy_mgrs_offset,
            projection: None,
        }
    }

    pub fn datum_code(&self) -> &str {
        &self.datum.code
    }

    pub fn datum_index(&self) -> usize {
        self.datum.index
    }

    /// Pin the UTM zone this endpoint uses, overriding natural selection.
    pub fn set_zone_override(&mut self, zone: Option<i32>) {
        self.zone_override = zone;
    }

    /// Install the projection module this endpoint uses for bare
    /// [`CoordinateKind::MapProjection`] tuples, e.g.
    /// `endpoint.set_projection(Arc::new(TransverseMercator::new(params)?))`.
    pub fn set_projection(&mut self, module: Arc<dyn Projection + Send + Sync>) {
        self.projection = Some(module);
    }

    fn ellps(&self) -> EllipsoidParams {
        ellipsoid_params(&self.ellipsoid)
    }
}

/// Converts coordinates between a source and a target endpoint, pivoting
/// through WGS84 geodetic (spec 4.3, 4.8).
pub struct ConversionService {
    ellipsoids: EllipsoidLibrary,
    datums: DatumLibrary,
    wgs84_ellps: EllipsoidParams,
    source: Endpoint,
    target: Endpoint,
}

impl ConversionService {
    /// Build a service with both endpoints pinned to the given datum codes.
    pub fn new(source_datum_code: &str, target_datum_code: &str) -> Result<Self> {
        let ellipsoids = EllipsoidLibrary::instance();
        let datums = DatumLibrary::instance();
        let wgs84 = datums.get(datums.index_of("WGE")?)?;
        let wgs84_ellps = ellipsoid_params(&ellipsoids.get(ellipsoids.index_of(&wgs84.ellipsoid_code)?)?);

        let source = Self::build_endpoint(&datums, &ellipsoids, source_datum_code)?;
        let target = Self::build_endpoint(&datums, &ellipsoids, target_datum_code)?;

        Ok(Self {
            ellipsoids,
            datums,
            wgs84_ellps,
            source,
            target,
        })
    }

    fn build_endpoint(datums: &DatumLibrary, ellipsoids: &EllipsoidLibrary, datum_code: &str) -> Result<Endpoint> {
        trace!("binding endpoint to datum {}", datum_code);
        let datum = datums.get(datums.index_of(datum_code)?)?;
        let ellipsoid = ellipsoids.get(ellipsoids.index_of(&datum.ellipsoid_code)?)?;
        Ok(Endpoint::new(datum, ellipsoid))
    }

    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    pub fn source_mut(&mut self) -> &mut Endpoint {
        &mut self.source
    }

    pub fn target_mut(&mut self) -> &mut Endpoint {
        &mut self.target
    }

    /// Reconfigure the source endpoint's datum, rebuilding its ellipsoid
    /// binding. Any previously-installed projection module is dropped,
    /// mirroring the C++ library's behavior of rebuilding projection state
    /// on every datum/coordinate-system reconfiguration.
    pub fn set_source_datum(&mut self, datum_code: &str) -> Result<()> {
        self.source = Self::build_endpoint(&self.datums, &self.ellipsoids, datum_code)?;
        Ok(())
    }

    pub fn set_target_datum(&mut self, datum_code: &str) -> Result<()> {
        self.target = Self::build_endpoint(&self.datums, &self.ellipsoids, datum_code)?;
        Ok(())
    }

    fn to_geodetic(endpoint: &Endpoint, coord: &CoordinateTuple) -> Result<(Geodetic, Option<String>)> {
        let ellps = endpoint.ellps();
        let (a, es) = (ellps.a, ellps.es);

        match &coord.kind {
            CoordinateKind::Geodetic(g) => Ok((g.clone(), None)),
            CoordinateKind::Cartesian(c) => {
                let (lon, lat, h) = datum_shift::geocentric::geocentric_to_geodetic(c.x, c.y, c.z, a, ellps.b, es)?;
                Ok((Geodetic { lon, lat, height: h }, None))
            }
            CoordinateKind::MapProjection(m) => {
                let proj = endpoint.projection.as_ref().ok_or(Error::NoProjectionConfigured)?;
                let (lon, lat) = proj.convert_to_geodetic(m.easting, m.northing)?;
                Ok((Geodetic { lon, lat, height: 0.0 }, None))
            }
            CoordinateKind::Utm(u) => {
                let (lon, lat) = utm::convert_to_geodetic(u.zone as i32, utm_hemisphere(u.hemisphere.clone()), u.easting, u.northing, a, es)?;
                Ok((Geodetic { lon, lat, height: 0.0 }, None))
            }
            CoordinateKind::Ups(u) => {
                let (lon, lat) = ups::convert_to_geodetic(ups_hemisphere(u.hemisphere.clone()), u.easting, u.northing, a, es)?;
                Ok((Geodetic { lon, lat, height: 0.0 }, None))
            }
            CoordinateKind::MgrsOrUsng(s) => {
                let (lon, lat, _precision) = mgrs::decode(&s.value, a, es, endpoint.legacy_mgrs_offset)?;
                Ok((Geodetic { lon, lat, height: 0.0 }, None))
            }
            CoordinateKind::Bng(_) | CoordinateKind::Georef(_) | CoordinateKind::Gars(_) => Err(Error::NoProjectionConfigured),
        }
    }

    fn from_geodetic(endpoint: &Endpoint, target_kind: &CoordinateKind, g: &Geodetic) -> Result<(CoordinateKind, Option<String>)> {
        let ellps = endpoint.ellps();
        let (a, es) = (ellps.a, ellps.es);

        match target_kind {
            CoordinateKind::Geodetic(_) => Ok((CoordinateKind::Geodetic(g.clone()), None)),
            CoordinateKind::Cartesian(_) => {
                let (x, y, z) = datum_shift::geocentric::geodetic_to_geocentric(g.lon, g.lat, g.height, a, es)?;
                Ok((CoordinateKind::Cartesian(crate::coordinate::Cartesian { x, y, z }), None))
            }
            CoordinateKind::MapProjection(_) => {
                let proj = endpoint.projection.as_ref().ok_or(Error::NoProjectionConfigured)?;
                let (easting, northing) = proj.convert_from_geodetic(g.lon, g.lat)?;
                Ok((CoordinateKind::MapProjection(MapProjection { easting, northing }), None))
            }
            CoordinateKind::Utm(_) => {
                let (zone, hemisphere, easting, northing) = utm::convert_from_geodetic(g.lon, g.lat, a, es, endpoint.zone_override)?;
                Ok((
                    CoordinateKind::Utm(UtmCoord {
                        zone: zone as u8,
                        hemisphere: utm_hemisphere_back(hemisphere),
                        easting,
                        northing,
                    }),
                    None,
                ))
            }
            CoordinateKind::Ups(_) => {
                let (hemisphere, easting, northing) = ups::convert_from_geodetic(g.lon, g.lat, a, es)?;
                Ok((
                    CoordinateKind::Ups(UpsCoord {
                        hemisphere: ups_hemisphere_back(hemisphere),
                        easting,
                        northing,
                    }),
                    None,
                ))
            }
            CoordinateKind::MgrsOrUsng(s) => {
                let value = mgrs::encode(g.lon, g.lat, a, es, s.precision, endpoint.legacy_mgrs_offset)?;
                Ok((
                    CoordinateKind::MgrsOrUsng(StringCoord {
                        value,
                        precision: s.precision,
                    }),
                    None,
                ))
            }
            CoordinateKind::Bng(_) | CoordinateKind::Georef(_) | CoordinateKind::Gars(_) => Err(Error::NoProjectionConfigured),
        }
    }

    /// Convert `src_coord` (in the source endpoint's frame) into the target
    /// endpoint's frame, propagating `src_accuracy` through the datum shift
    /// (spec 4.8). `target_kind_hint` picks which target representation to
    /// produce (the spec's `coordinateType` on the target endpoint state);
    /// only its variant tag and, for string forms, its requested precision
    /// are used.
    pub fn convert_source_to_target(&self, src_coord: &CoordinateTuple, src_accuracy: Accuracy, target_kind_hint: &CoordinateKind) -> (CoordinateTuple, Accuracy) {
        match self.convert(&self.source, &self.target, src_coord, src_accuracy, target_kind_hint) {
            Ok(result) => result,
            Err(e) => {
                let mut tuple = CoordinateTuple::new(target_kind_hint.clone());
                tuple.set_error(e.to_string());
                (tuple, Accuracy::UNKNOWN)
            }
        }
    }

    /// The reverse direction: target endpoint's frame to source endpoint's
    /// frame. Implemented as the same pipeline with source/target swapped.
    pub fn convert_target_to_source(&self, tgt_coord: &CoordinateTuple, tgt_accuracy: Accuracy, source_kind_hint: &CoordinateKind) -> (CoordinateTuple, Accuracy) {
        match self.convert(&self.target, &self.source, tgt_coord, tgt_accuracy, source_kind_hint) {
            Ok(result) => result,
            Err(e) => {
                let mut tuple = CoordinateTuple::new(source_kind_hint.clone());
                tuple.set_error(e.to_string());
                (tuple, Accuracy::UNKNOWN)
            }
        }
    }

    fn convert(&self, from: &Endpoint, to: &Endpoint, coord: &CoordinateTuple, incoming: Accuracy, to_kind_hint: &CoordinateKind) -> Result<(CoordinateTuple, Accuracy)> {
        if coord.is_err() {
            return Ok((coord.clone(), incoming));
        }

        let (geodetic, warn1) = Self::to_geodetic(from, coord)?;

        let (shifted_lon, shifted_lat, shifted_h) = datum_shift::shift_geodetic(
            &from.datum,
            &to.datum,
            from.ellps(),
            to.ellps(),
            self.wgs84_ellps,
            geodetic.lon,
            geodetic.lat,
            geodetic.height,
        )?;
        let shifted = Geodetic {
            lon: shifted_lon,
            lat: shifted_lat,
            height: shifted_h,
        };

        let (result_kind, warn2) = Self::from_geodetic(to, to_kind_hint, &shifted)?;

        let accuracy = datum_shift::propagate(&from.datum, &to.datum, geodetic.lon, geodetic.lat, incoming, source_precision(coord));

        let mut tuple = CoordinateTuple::new(result_kind);
        if !from.datum.validity.contains(geodetic.lon, geodetic.lat) {
            tuple.push_warning("source point falls outside the source datum's validity rectangle");
        } else if !to.datum.validity.contains(shifted.lon, shifted.lat) {
            tuple.push_warning("target point falls outside the target datum's validity rectangle");
        }
        if let Some(w) = warn1 {
            tuple.push_warning(w);
        }
        if let Some(w) = warn2 {
            tuple.push_warning(w);
        }

        Ok((tuple, accuracy))
    }

    /// Batch variant: each tuple is converted independently, with a failing
    /// tuple's error recorded on its own result rather than aborting the
    /// whole collection (spec 4.8).
    pub fn convert_source_to_target_collection(&self, coords: &[(CoordinateTuple, Accuracy)], target_kind_hint: &CoordinateKind) -> Vec<(CoordinateTuple, Accuracy)> {
        coords.iter().map(|(c, a)| self.convert_source_to_target(c, *a, target_kind_hint)).collect()
    }

    pub fn convert_target_to_source_collection(&self, coords: &[(CoordinateTuple, Accuracy)], source_kind_hint: &CoordinateKind) -> Vec<(CoordinateTuple, Accuracy)> {
        coords.iter().map(|(c, a)| self.convert_target_to_source(c, *a, source_kind_hint)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{DatumKind, ValidityRectangle};
    use approx::assert_abs_diff_eq;

    // Hand-built WGS84 binding. `ConversionService::new` resolves the same
    // values through the file-backed ellipsoid/datum libraries; these tests
    // exercise `convert` itself and so build the service directly rather
    // than depend on `MSPCCS_DATA` pointing at real table files.
    fn wgs84_ellipsoid() -> Ellipsoid {
        Ellipsoid {
            index: 0,
            code: "WE".into(),
            name: "WGS 84".into(),
            a: 6_378_137.0,
            b: 6_356_752.314_245,
            f: 1.0 / 298.257_223_563,
            es: 0.006_694_379_990_14,
            user_defined: false,
        }
    }

    fn wgs84_datum() -> Datum {
        Datum {
            index: 0,
            code: "WGE".into(),
            ellipsoid_code: "WE".into(),
            name: "World Geodetic System 1984".into(),
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            validity: ValidityRectangle::whole_globe(),
            user_defined: false,
            kind: DatumKind::Wgs84,
        }
    }

    fn service_with(source: Endpoint, target: Endpoint) -> ConversionService {
        ConversionService {
            ellipsoids: EllipsoidLibrary::instance(),
            datums: DatumLibrary::instance(),
            wgs84_ellps: ellipsoid_params(&wgs84_ellipsoid()),
            source,
            target,
        }
    }

    fn wgs84_service() -> ConversionService {
        let endpoint = Endpoint::new(wgs84_datum(), wgs84_ellipsoid());
        service_with(endpoint.clone(), endpoint)
    }

    #[test]
    fn same_datum_geodetic_to_geodetic_is_identity() {
        let svc = wgs84_service();
        let coord = CoordinateTuple::geodetic(crate::constants::deg_to_rad(-77.0), crate::constants::deg_to_rad(38.9), 10.0);
        let hint = CoordinateKind::Geodetic(Geodetic { lon: 0.0, lat: 0.0, height: 0.0 });
        let (result, acc) = svc.convert_source_to_target(&coord, Accuracy::new(1.0, 1.0, 1.0), &hint);
        assert!(!result.is_err());
        let g = result.as_geodetic().unwrap();
        assert_abs_diff_eq!(g.lon, crate::constants::deg_to_rad(-77.0), epsilon = 1e-9);
        assert_abs_diff_eq!(g.lat, crate::constants::deg_to_rad(38.9), epsilon = 1e-9);
        assert_eq!(acc, Accuracy::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn geodetic_to_utm_round_trip() {
        let svc = wgs84_service();
        let lon = crate::constants::deg_to_rad(-77.0);
        let lat = crate::constants::deg_to_rad(38.9);
        let coord = CoordinateTuple::geodetic(lon, lat, 0.0);
        let utm_hint = CoordinateKind::Utm(UtmCoord {
            zone: 0,
            hemisphere: CoordHemisphere::North,
            easting: 0.0,
            northing: 0.0,
        });
        let (utm_result, _) = svc.convert_source_to_target(&coord, Accuracy::UNKNOWN, &utm_hint);
        assert!(!utm_result.is_err());

        let geo_hint = CoordinateKind::Geodetic(Geodetic { lon: 0.0, lat: 0.0, height: 0.0 });
        let (back, _) = svc.convert_target_to_source(&utm_result, Accuracy::UNKNOWN, &geo_hint);
        let g = back.as_geodetic().unwrap();
        assert_abs_diff_eq!(g.lon, lon, epsilon = 1e-7);
        assert_abs_diff_eq!(g.lat, lat, epsilon = 1e-7);
    }

    // `ConversionService::new` still goes through the real libraries, which
    // have nothing to load in a test environment with no `MSPCCS_DATA`
    // table files; whatever the underlying cause, it must surface as an
    // error rather than a panic.
    #[test]
    fn unreachable_datum_code_reports_error_not_panic() {
        let result = ConversionService::new("WGE", "NOT-A-REAL-CODE");
        assert!(result.is_err());
    }

    #[test]
    fn batch_collection_reports_per_tuple_errors() {
        let svc = wgs84_service();
        let good = CoordinateTuple::geodetic(0.1, 0.2, 0.0);
        let mut bad = CoordinateTuple::geodetic(0.1, 0.2, 0.0);
        bad.set_error("upstream failure");
        let hint = CoordinateKind::Geodetic(Geodetic { lon: 0.0, lat: 0.0, height: 0.0 });

        let results = svc.convert_source_to_target_collection(&[(good, Accuracy::UNKNOWN), (bad, Accuracy::UNKNOWN)], &hint);
        assert_eq!(results.len(), 2);
        assert!(!results[0].0.is_err());
        assert!(results[1].0.is_err());
    }
}
