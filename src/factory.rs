//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! The geometry factory.
//!
//! A [`Factory`] fixes the dimensionality, SRID and CRS of the geometries it
//! creates, and carries the configuration of the WKT and WKB codecs used to
//! read and write them.
//!
//! ```rust
//! use wkgeom::{Factory, Coord};
//!
//! let factory = Factory::builder().srid(4326).build().unwrap();
//! let line = factory.line_string(vec![Coord::xy(10.0, -20.0), Coord::xy(0.0, -0.5)]).unwrap();
//! assert_eq!(factory.generate_wkt(&line.into()), "LINESTRING (10 -20, 0 -0.5)");
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use log::trace;

use crate::crs::{
    self, Capabilities, CoordSysInput, CoordinateSystem, ProjectionDefinition, ProjectionHandle,
    ProjectionInput,
};
use crate::ewkb::{WkbGenerator, WkbGeneratorConfig, WkbParser, WkbParserConfig};
use crate::error::Result;
use crate::geometry::{
    Geometry, GeometryCollection, Line, LineString, LinearRing, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use crate::types::{Coord, Dimensions};
use crate::wkt::{WktGenerator, WktGeneratorConfig, WktParser, WktParserConfig};

/// Value returned by [`Factory::property`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Property {
    Bool(bool),
    Int(i32),
}

struct FactoryInner {
    has_z: bool,
    has_m: bool,
    srid: i32,
    buffer_resolution: i32,
    coord_sys: Option<CoordinateSystem>,
    projection: Option<ProjectionHandle>,
    wkt_generator: WktGeneratorConfig,
    wkb_generator: WkbGeneratorConfig,
    wkt_parser: WktParserConfig,
    wkb_parser: WkbParserConfig,
    hash: OnceLock<u64>,
}

/// Immutable factory configuration, shared by every geometry it creates.
///
/// Cloning is cheap. Equality and hashing consider only the SRID, the Z/M
/// flags and the projection.
#[derive(Clone)]
pub struct Factory {
    inner: Arc<FactoryInner>,
}

/// Options for building a [`Factory`].
#[derive(Clone, Debug, Default)]
pub struct FactoryBuilder {
    has_z: bool,
    has_m: bool,
    srid: Option<i32>,
    buffer_resolution: i32,
    projection: Option<ProjectionInput>,
    coord_sys: Option<CoordSysInput>,
    capabilities: Option<Capabilities>,
    wkt_generator: WktGeneratorConfig,
    wkb_generator: WkbGeneratorConfig,
    wkt_parser: WktParserConfig,
    wkb_parser: WkbParserConfig,
}

impl FactoryBuilder {
    pub fn has_z(mut self, has_z: bool) -> Self {
        self.has_z = has_z;
        self
    }

    pub fn has_m(mut self, has_m: bool) -> Self {
        self.has_m = has_m;
        self
    }

    pub fn srid(mut self, srid: i32) -> Self {
        self.srid = Some(srid);
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn buffer_resolution(mut self, resolution: i32) -> Self {
        self.buffer_resolution = resolution;
        self
    }

    /// Projection definition handed to the projection capability, in degrees.
    pub fn proj4<D: Into<ProjectionDefinition>>(self, definition: D) -> Self {
        self.projection_definition(definition, false)
    }

    pub fn projection_definition<D: Into<ProjectionDefinition>>(
        mut self,
        definition: D,
        radians: bool,
    ) -> Self {
        self.projection = Some(ProjectionInput::Definition(definition.into(), radians));
        self
    }

    /// Already resolved projection. Used as is, even without a capability.
    pub fn projection(mut self, handle: ProjectionHandle) -> Self {
        self.projection = Some(ProjectionInput::Handle(handle));
        self
    }

    pub fn coord_sys_wkt<S: Into<String>>(mut self, wkt: S) -> Self {
        self.coord_sys = Some(CoordSysInput::Wkt(wkt.into()));
        self
    }

    pub fn coord_sys(mut self, coord_sys: CoordinateSystem) -> Self {
        self.coord_sys = Some(CoordSysInput::Parsed(coord_sys));
        self
    }

    /// Projection backend and catalog. Defaults to [`Capabilities::default`].
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn wkt_generator(mut self, config: WktGeneratorConfig) -> Self {
        self.wkt_generator = config;
        self
    }

    pub fn wkb_generator(mut self, config: WkbGeneratorConfig) -> Self {
        self.wkb_generator = config;
        self
    }

    pub fn wkt_parser(mut self, config: WktParserConfig) -> Self {
        self.wkt_parser = config;
        self
    }

    pub fn wkb_parser(mut self, config: WkbParserConfig) -> Self {
        self.wkb_parser = config;
        self
    }

    /// Resolve the CRS and build the factory.
    ///
    /// Fails only on malformed explicit CRS text or projection definitions.
    pub fn build(self) -> Result<Factory> {
        let capabilities = self.capabilities.unwrap_or_default();
        let resolved = crs::resolve(
            self.projection.as_ref(),
            self.coord_sys.as_ref(),
            self.srid,
            &capabilities,
        )?;
        trace!(
            "building factory srid={} has_z={} has_m={}",
            resolved.srid,
            self.has_z,
            self.has_m
        );
        Ok(Factory::from_parts(FactoryInner {
            has_z: self.has_z,
            has_m: self.has_m,
            srid: resolved.srid,
            buffer_resolution: self.buffer_resolution.max(1),
            coord_sys: resolved.coord_sys,
            projection: resolved.projection,
            wkt_generator: self.wkt_generator,
            wkb_generator: self.wkb_generator,
            wkt_parser: self.wkt_parser,
            wkb_parser: self.wkb_parser,
            hash: OnceLock::new(),
        }))
    }
}

impl Factory {
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::default()
    }

    fn from_parts(inner: FactoryInner) -> Self {
        Factory {
            inner: Arc::new(inner),
        }
    }

    pub fn srid(&self) -> i32 {
        self.inner.srid
    }

    pub fn has_z(&self) -> bool {
        self.inner.has_z
    }

    pub fn has_m(&self) -> bool {
        self.inner.has_m
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.inner.has_z, self.inner.has_m)
    }

    pub fn buffer_resolution(&self) -> i32 {
        self.inner.buffer_resolution
    }

    pub fn coord_sys(&self) -> Option<&CoordinateSystem> {
        self.inner.coord_sys.as_ref()
    }

    pub fn projection(&self) -> Option<&ProjectionHandle> {
        self.inner.projection.as_ref()
    }

    pub fn wkt_generator_config(&self) -> &WktGeneratorConfig {
        &self.inner.wkt_generator
    }

    pub fn wkb_generator_config(&self) -> &WkbGeneratorConfig {
        &self.inner.wkb_generator
    }

    pub fn wkt_parser_config(&self) -> &WktParserConfig {
        &self.inner.wkt_parser
    }

    pub fn wkb_parser_config(&self) -> &WkbParserConfig {
        &self.inner.wkb_parser
    }

    /// Named factory properties: `has_z_coordinate`, `has_m_coordinate`,
    /// `buffer_resolution` and `is_cartesian`.
    pub fn property(&self, name: &str) -> Option<Property> {
        match name {
            "has_z_coordinate" => Some(Property::Bool(self.inner.has_z)),
            "has_m_coordinate" => Some(Property::Bool(self.inner.has_m)),
            "buffer_resolution" => Some(Property::Int(self.inner.buffer_resolution)),
            "is_cartesian" => Some(Property::Bool(true)),
            _ => None,
        }
    }

    fn hash_code(&self) -> u64 {
        *self.inner.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.inner.srid.hash(&mut hasher);
            self.inner.has_z.hash(&mut hasher);
            self.inner.has_m.hash(&mut hasher);
            self.inner.projection.hash(&mut hasher);
            hasher.finish()
        })
    }

    // --- constructors

    pub fn point(&self, x: f64, y: f64) -> Point {
        Point::new(self, Coord::xy(x, y))
    }

    /// Point from a full coordinate. Ordinates the factory lacks are dropped.
    pub fn point_from<C: Into<Coord>>(&self, coord: C) -> Point {
        Point::new(self, coord.into())
    }

    pub fn line_string<I: IntoIterator<Item = Coord>>(&self, coords: I) -> Result<LineString> {
        LineString::new(self, coords)
    }

    pub fn line_string_from_points(&self, points: &[Point]) -> Result<LineString> {
        LineString::from_points(self, points)
    }

    pub fn line<I: IntoIterator<Item = Coord>>(&self, coords: I) -> Result<Line> {
        Line::new(self, coords)
    }

    pub fn line_between(&self, start: &Point, end: &Point) -> Result<Line> {
        let inner = LineString::from_points(self, &[start.clone(), end.clone()])?;
        Line::new(self, inner.coords().iter().copied())
    }

    pub fn linear_ring<I: IntoIterator<Item = Coord>>(&self, coords: I) -> Result<LinearRing> {
        LinearRing::new(self, coords)
    }

    pub fn polygon<I: IntoIterator<Item = LinearRing>>(
        &self,
        exterior: LinearRing,
        interiors: I,
    ) -> Result<Polygon> {
        Polygon::new(self, exterior, interiors)
    }

    pub fn collection<I: IntoIterator<Item = Geometry>>(
        &self,
        geometries: I,
    ) -> Result<GeometryCollection> {
        GeometryCollection::new(self, geometries)
    }

    pub fn multi_point<I: IntoIterator<Item = Point>>(&self, points: I) -> Result<MultiPoint> {
        MultiPoint::new(self, points)
    }

    pub fn multi_line_string<I: IntoIterator<Item = LineString>>(
        &self,
        lines: I,
    ) -> Result<MultiLineString> {
        MultiLineString::new(self, lines)
    }

    pub fn multi_polygon<I: IntoIterator<Item = Polygon>>(
        &self,
        polygons: I,
    ) -> Result<MultiPolygon> {
        MultiPolygon::new(self, polygons)
    }

    // --- codecs

    pub fn wkt_generator(&self) -> WktGenerator {
        WktGenerator::new(self.inner.wkt_generator.clone())
    }

    pub fn wkb_generator(&self) -> WkbGenerator {
        WkbGenerator::new(self.inner.wkb_generator.clone())
    }

    pub fn wkt_parser(&self) -> WktParser {
        WktParser::new(self.clone(), self.inner.wkt_parser.clone())
    }

    pub fn wkb_parser(&self) -> WkbParser {
        WkbParser::new(self.clone(), self.inner.wkb_parser.clone())
    }

    pub fn parse_wkt(&self, text: &str) -> Result<Geometry> {
        self.wkt_parser().parse(text)
    }

    pub fn parse_wkb(&self, bytes: &[u8]) -> Result<Geometry> {
        self.wkb_parser().parse(bytes)
    }

    pub fn parse_wkb_hex(&self, hex: &str) -> Result<Geometry> {
        self.wkb_parser().parse_hex(hex)
    }

    pub fn generate_wkt(&self, geometry: &Geometry) -> String {
        self.wkt_generator().generate(geometry)
    }

    pub fn generate_wkb(&self, geometry: &Geometry) -> Vec<u8> {
        self.wkb_generator().generate(geometry)
    }
}

impl Default for Factory {
    /// 2D factory with SRID 0 and baseline codec configuration.
    fn default() -> Self {
        Factory::from_parts(FactoryInner {
            has_z: false,
            has_m: false,
            srid: 0,
            buffer_resolution: 1,
            coord_sys: None,
            projection: None,
            wkt_generator: WktGeneratorConfig::default(),
            wkb_generator: WkbGeneratorConfig::default(),
            wkt_parser: WktParserConfig::default(),
            wkb_parser: WkbParserConfig::default(),
            hash: OnceLock::new(),
        })
    }
}

impl PartialEq for Factory {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.srid == other.inner.srid
                && self.inner.has_z == other.inner.has_z
                && self.inner.has_m == other.inner.has_m
                && self.inner.projection == other.inner.projection)
    }
}

impl Eq for Factory {}

impl Hash for Factory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Factory")
            .field("srid", &self.inner.srid)
            .field("has_z", &self.inner.has_z)
            .field("has_m", &self.inner.has_m)
            .field(
                "projection",
                &self.inner.projection.as_ref().map(|p| p.canonical_str()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::WGS84_WKT;
    use crate::error::Error;
    use crate::srs::{MemoryCatalog, SrsCatalog, SrsEntry};
    use crate::wkt::{ConvertCase, WktTagFormat};
    use assert_matches::assert_matches;
    use std::collections::HashSet;

    fn hash_of(f: &Factory) -> u64 {
        let mut h = DefaultHasher::new();
        f.hash(&mut h);
        h.finish()
    }

    #[test]
    fn equality_ignores_codecs_and_crs_text() {
        let f1 = Factory::builder().srid(4326).build().unwrap();
        let f2 = Factory::builder()
            .srid(4326)
            .coord_sys_wkt(WGS84_WKT)
            .wkt_generator(WktGeneratorConfig {
                convert_case: ConvertCase::Lower,
                tag_format: WktTagFormat::Wkt12,
                emit_ewkt_srid: true,
            })
            .build()
            .unwrap();
        assert_eq!(f1, f2);
        assert_eq!(hash_of(&f1), hash_of(&f2));
        let set: HashSet<Factory> = vec![f1.clone(), f2].into_iter().collect();
        assert_eq!(set.len(), 1);

        let f3 = Factory::builder().srid(4326).has_m(true).build().unwrap();
        assert_ne!(f1, f3);
    }

    #[test]
    fn hash_is_stable() {
        let f = Factory::builder().srid(3857).has_z(true).build().unwrap();
        let first = hash_of(&f);
        assert_eq!(first, hash_of(&f));
        assert_eq!(first, hash_of(&f.clone()));
    }

    #[test]
    fn buffer_resolution_clamp() {
        let f = Factory::builder().buffer_resolution(0).build().unwrap();
        assert_eq!(f.buffer_resolution(), 1);
        let f = Factory::builder().buffer_resolution(-7).build().unwrap();
        assert_eq!(f.buffer_resolution(), 1);
        let f = Factory::builder().buffer_resolution(8).build().unwrap();
        assert_eq!(f.property("buffer_resolution"), Some(Property::Int(8)));
    }

    #[test]
    fn properties() {
        let f = Factory::builder().has_z(true).build().unwrap();
        assert_eq!(f.property("has_z_coordinate"), Some(Property::Bool(true)));
        assert_eq!(f.property("has_m_coordinate"), Some(Property::Bool(false)));
        assert_eq!(f.property("is_cartesian"), Some(Property::Bool(true)));
        assert_eq!(f.property("is_geographic"), None);
    }

    #[test]
    fn srid_from_coord_sys() {
        let f = Factory::builder().coord_sys_wkt(WGS84_WKT).build().unwrap();
        assert_eq!(f.srid(), 4326);
        assert_eq!(f.coord_sys().unwrap().name(), Some("WGS 84"));
    }

    #[test]
    fn malformed_coord_sys_is_configuration_error() {
        let res = Factory::builder().coord_sys_wkt("GEOGCS[").build();
        assert_matches!(res, Err(Error::Configuration(_)));
    }

    fn catalog() -> Capabilities {
        let mut catalog = MemoryCatalog::new();
        let definition = "+proj=longlat +datum=WGS84 +no_defs";
        let projection = ProjectionHandle::new(None, definition.into(), false);
        catalog.insert(
            4326,
            SrsEntry {
                identifier: "EPSG:4326".into(),
                name: "WGS 84".into(),
                description: None,
                coord_sys: Some(CoordinateSystem::from_wkt(WGS84_WKT).unwrap()),
                projection: Some(projection),
            },
        );
        Capabilities::none().with_catalog(Arc::new(catalog))
    }

    #[test]
    fn catalog_fallback() {
        let caps = catalog();
        let f = Factory::builder().srid(4326).capabilities(caps.clone()).build().unwrap();
        let entry = caps.catalog.as_ref().unwrap().get(4326).unwrap();
        assert_eq!(f.coord_sys(), entry.coord_sys.as_ref());
        assert_eq!(f.projection(), entry.projection.as_ref());

        let f = Factory::builder().srid(999).capabilities(caps).build().unwrap();
        assert!(f.coord_sys().is_none());
        assert!(f.projection().is_none());
        assert_eq!(f.srid(), 999);
    }

    #[test]
    fn catalog_does_not_override_explicit() {
        let own = ProjectionHandle::new(None, "+proj=merc".into(), false);
        let f = Factory::builder()
            .srid(4326)
            .projection(own.clone())
            .capabilities(catalog())
            .build()
            .unwrap();
        assert_eq!(f.projection(), Some(&own));
        assert!(f.coord_sys().is_some());
    }

    #[test]
    fn projection_degrades_without_capability() {
        let f = Factory::builder()
            .proj4("+proj=longlat +datum=WGS84")
            .capabilities(Capabilities::none())
            .build()
            .unwrap();
        assert!(f.projection().is_none());
    }

    #[cfg(feature = "proj4")]
    #[test]
    fn projection_is_part_of_equality() {
        let f1 = Factory::builder().proj4("+proj=longlat +datum=WGS84").build().unwrap();
        let f2 = Factory::builder().proj4("proj=longlat  datum=WGS84").build().unwrap();
        let f3 = Factory::builder().proj4("+proj=merc +ellps=WGS84").build().unwrap();
        assert_eq!(f1, f2);
        assert_eq!(hash_of(&f1), hash_of(&f2));
        assert_ne!(f1, f3);
        assert_matches!(
            Factory::builder().proj4("+datum=WGS84").build(),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            Factory::builder().proj4("+proj=nonsense +datum=WGS84").build(),
            Err(Error::Configuration(_))
        );
    }

    #[test]
    fn concrete_point_scenario() {
        let f = Factory::default();
        let p: Geometry = f.point(1.0, 2.0).into();
        assert_eq!(f.generate_wkt(&p), "POINT (1 2)");
        let wkb = f.generate_wkb(&p);
        assert_eq!(wkb.len(), 21);
        assert_eq!(&wkb[..5], &[1, 1, 0, 0, 0]);
        assert_eq!(&wkb[5..13], &1.0f64.to_le_bytes());
        assert_eq!(&wkb[13..], &2.0f64.to_le_bytes());
        assert_eq!(f.parse_wkt("POINT (1 2)").unwrap(), p);
        assert_eq!(f.parse_wkb(&wkb).unwrap(), p);
    }
}
