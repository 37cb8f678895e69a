//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Read and write geometries in Well-Known Binary.
//!
//! Two type-code dialects are supported:
//!
//! - `ewkb` (PostGIS): Z, M and SRID are flags in the high bits of the type code
//! - `wkb12` (ISO): Z adds 1000, M adds 2000, ZM adds 3000 to the base code
//!
//! The SRID flag `0x20000000` followed by a 4 byte SRID is accepted in both
//! dialects.

use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::geometry::{Geometry, LineString, LinearRing, Point, Polygon};
use crate::types::{Coord, Dimensions, GeometryType, MAX_NESTING};

const FORMAT: &str = "WKB";

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;
const EWKB_FLAGS: u32 = EWKB_Z | EWKB_M | EWKB_SRID;

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum WkbTypeFormat {
    #[default]
    Ewkb,
    Wkb12,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(default)]
pub struct WkbGeneratorConfig {
    pub type_format: WkbTypeFormat,
    /// Set the SRID flag on the outermost geometry and write the factory SRID.
    pub emit_ewkb_srid: bool,
    pub little_endian: bool,
}

impl Default for WkbGeneratorConfig {
    fn default() -> Self {
        WkbGeneratorConfig {
            type_format: WkbTypeFormat::Ewkb,
            emit_ewkb_srid: false,
            little_endian: true,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(default)]
pub struct WkbParserConfig {
    /// Accept the PostGIS Z and M flags.
    pub support_ewkb: bool,
    /// Accept ISO type codes above 1000.
    pub support_wkb12: bool,
    pub ignore_extra_bytes: bool,
}

impl Default for WkbParserConfig {
    fn default() -> Self {
        WkbParserConfig {
            support_ewkb: true,
            support_wkb12: true,
            ignore_extra_bytes: false,
        }
    }
}

// --- Generator

#[derive(Clone, Debug, Default)]
pub struct WkbGenerator {
    config: WkbGeneratorConfig,
}

impl WkbGenerator {
    pub fn new(config: WkbGeneratorConfig) -> Self {
        WkbGenerator { config }
    }

    pub fn config(&self) -> &WkbGeneratorConfig {
        &self.config
    }

    pub fn generate(&self, geometry: &Geometry) -> Vec<u8> {
        let mut buf = Vec::new();
        let srid = if self.config.emit_ewkb_srid {
            Some(geometry.srid())
        } else {
            None
        };
        let dims = geometry.factory().dimensions();
        if self.config.little_endian {
            self.write_geometry::<LittleEndian>(&mut buf, geometry, dims, srid);
        } else {
            self.write_geometry::<BigEndian>(&mut buf, geometry, dims, srid);
        }
        buf
    }

    /// Upper case hex string of [`generate`](Self::generate).
    pub fn generate_hex(&self, geometry: &Geometry) -> String {
        self.generate(geometry)
            .iter()
            .fold(String::new(), |s, &b| s + &format!("{:02X}", b))
    }

    fn type_code(&self, ty: GeometryType, dims: Dimensions, srid: bool) -> u32 {
        let base = ty.wkb_code();
        let mut code = match self.config.type_format {
            WkbTypeFormat::Ewkb => {
                let mut code = base;
                if dims.has_z {
                    code |= EWKB_Z;
                }
                if dims.has_m {
                    code |= EWKB_M;
                }
                code
            }
            WkbTypeFormat::Wkb12 => {
                base + if dims.has_z { 1000 } else { 0 } + if dims.has_m { 2000 } else { 0 }
            }
        };
        if srid {
            code |= EWKB_SRID;
        }
        code
    }

    fn write_header<B: ByteOrder>(
        &self,
        buf: &mut Vec<u8>,
        ty: GeometryType,
        dims: Dimensions,
        srid: Option<i32>,
    ) {
        buf.push(if self.config.little_endian { 0x01 } else { 0x00 });
        put_u32::<B>(buf, self.type_code(ty, dims, srid.is_some()));
        if let Some(srid) = srid {
            put_u32::<B>(buf, srid as u32);
        }
    }

    fn write_geometry<B: ByteOrder>(
        &self,
        buf: &mut Vec<u8>,
        geometry: &Geometry,
        dims: Dimensions,
        srid: Option<i32>,
    ) {
        self.write_header::<B>(buf, geometry.geometry_type(), dims, srid);
        match geometry {
            Geometry::Point(p) => put_coord::<B>(buf, &p.coord()),
            Geometry::LineString(ls) => put_coords::<B>(buf, ls.coords()),
            Geometry::Line(ls) => put_coords::<B>(buf, ls.coords()),
            Geometry::LinearRing(ls) => put_coords::<B>(buf, ls.coords()),
            Geometry::Polygon(poly) => put_polygon::<B>(buf, poly),
            Geometry::MultiPoint(mp) => {
                put_u32::<B>(buf, mp.num_geometries() as u32);
                for p in mp.points() {
                    self.write_header::<B>(buf, GeometryType::Point, dims, None);
                    put_coord::<B>(buf, &p.coord());
                }
            }
            Geometry::MultiLineString(mls) => {
                put_u32::<B>(buf, mls.num_geometries() as u32);
                for ls in mls.lines() {
                    self.write_header::<B>(buf, GeometryType::LineString, dims, None);
                    put_coords::<B>(buf, ls.coords());
                }
            }
            Geometry::MultiPolygon(mpoly) => {
                put_u32::<B>(buf, mpoly.num_geometries() as u32);
                for poly in mpoly.polygons() {
                    self.write_header::<B>(buf, GeometryType::Polygon, dims, None);
                    put_polygon::<B>(buf, poly);
                }
            }
            Geometry::GeometryCollection(gc) => {
                put_u32::<B>(buf, gc.num_geometries() as u32);
                for g in gc.geometries() {
                    self.write_geometry::<B>(buf, g, dims, None);
                }
            }
        }
    }
}

fn put_u32<B: ByteOrder>(buf: &mut Vec<u8>, v: u32) {
    let mut bytes = [0; 4];
    B::write_u32(&mut bytes, v);
    buf.extend_from_slice(&bytes);
}

fn put_f64<B: ByteOrder>(buf: &mut Vec<u8>, v: f64) {
    let mut bytes = [0; 8];
    B::write_f64(&mut bytes, v);
    buf.extend_from_slice(&bytes);
}

fn put_coord<B: ByteOrder>(buf: &mut Vec<u8>, c: &Coord) {
    put_f64::<B>(buf, c.x);
    put_f64::<B>(buf, c.y);
    if let Some(z) = c.z {
        put_f64::<B>(buf, z);
    }
    if let Some(m) = c.m {
        put_f64::<B>(buf, m);
    }
}

fn put_coords<B: ByteOrder>(buf: &mut Vec<u8>, coords: &[Coord]) {
    put_u32::<B>(buf, coords.len() as u32);
    for c in coords {
        put_coord::<B>(buf, c);
    }
}

fn put_polygon<B: ByteOrder>(buf: &mut Vec<u8>, poly: &Polygon) {
    if poly.is_empty() {
        put_u32::<B>(buf, 0);
        return;
    }
    put_u32::<B>(buf, poly.rings().count() as u32);
    for ring in poly.rings() {
        put_coords::<B>(buf, ring.coords());
    }
}

// --- Reading

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader {
            cursor: Cursor::new(bytes),
        }
    }

    fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::format(FORMAT, self.offset(), message)
    }

    fn eof(&self) -> Error {
        self.error("unexpected end of input")
    }

    fn read_u8(&mut self) -> Result<u8> {
        let offset = self.offset();
        self.cursor
            .read_u8()
            .map_err(|_| Error::format(FORMAT, offset, "unexpected end of input"))
    }

    fn read_u32(&mut self, little_endian: bool) -> Result<u32> {
        if self.remaining() < 4 {
            return Err(self.eof());
        }
        let value = if little_endian {
            self.cursor.read_u32::<LittleEndian>()
        } else {
            self.cursor.read_u32::<BigEndian>()
        };
        value.map_err(|_| self.eof())
    }

    fn read_f64(&mut self, little_endian: bool) -> Result<f64> {
        if self.remaining() < 8 {
            return Err(self.eof());
        }
        let value = if little_endian {
            self.cursor.read_f64::<LittleEndian>()
        } else {
            self.cursor.read_f64::<BigEndian>()
        };
        value.map_err(|_| self.eof())
    }
}

/// Decoded header of a WKB geometry.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WkbHeader {
    pub little_endian: bool,
    pub geometry_type: GeometryType,
    pub has_z: bool,
    pub has_m: bool,
    pub srid: Option<i32>,
}

impl WkbHeader {
    /// Decode the header of the outermost geometry without reading its body.
    pub fn peek(bytes: &[u8]) -> Result<WkbHeader> {
        WkbHeader::read(&mut Reader::new(bytes), &WkbParserConfig::default())
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.has_z, self.has_m)
    }

    fn read(reader: &mut Reader, config: &WkbParserConfig) -> Result<WkbHeader> {
        let start = reader.offset();
        let little_endian = match reader.read_u8()? {
            0 => false,
            1 => true,
            other => {
                return Err(Error::format(
                    FORMAT,
                    start,
                    format!("invalid byte order marker {}", other),
                ))
            }
        };
        let type_offset = reader.offset();
        let raw = reader.read_u32(little_endian)?;
        let type_error = |message: String| Error::format(FORMAT, type_offset, message);

        let mut has_z = raw & EWKB_Z != 0;
        let mut has_m = raw & EWKB_M != 0;
        if (has_z || has_m) && !config.support_ewkb {
            return Err(type_error(format!(
                "EWKB dimension flags are not enabled in type code {:#x}",
                raw
            )));
        }
        let mut code = raw & !EWKB_FLAGS;
        if code >= 1000 {
            if !config.support_wkb12 {
                return Err(type_error(format!("WKB 1.2 type codes are not enabled ({})", code)));
            }
            if has_z || has_m {
                return Err(type_error(format!(
                    "type code {:#x} mixes EWKB flags with WKB 1.2 ranges",
                    raw
                )));
            }
            match code / 1000 {
                1 => has_z = true,
                2 => has_m = true,
                3 => {
                    has_z = true;
                    has_m = true;
                }
                _ => return Err(type_error(format!("unknown geometry type code {}", code))),
            }
            code %= 1000;
        }
        let geometry_type = GeometryType::from_wkb_code(code)
            .ok_or_else(|| type_error(format!("unknown geometry type code {}", code)))?;
        let srid = if raw & EWKB_SRID != 0 {
            Some(reader.read_u32(little_endian)? as i32)
        } else {
            None
        };
        Ok(WkbHeader {
            little_endian,
            geometry_type,
            has_z,
            has_m,
            srid,
        })
    }
}

/// WKB parser bound to a factory. Every geometry is built through that factory.
#[derive(Clone, Debug)]
pub struct WkbParser {
    factory: Factory,
    config: WkbParserConfig,
}

impl WkbParser {
    pub fn new(factory: Factory, config: WkbParserConfig) -> Self {
        WkbParser { factory, config }
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn config(&self) -> &WkbParserConfig {
        &self.config
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Geometry> {
        let mut reader = Reader::new(bytes);
        let mut dims = None;
        let geometry = self.read_geometry(&mut reader, &mut dims, None, 0)?;
        if reader.remaining() > 0 && !self.config.ignore_extra_bytes {
            return Err(reader.error(format!(
                "{} unexpected bytes after geometry",
                reader.remaining()
            )));
        }
        Ok(geometry)
    }

    /// Parse a hex encoded WKB string, as PostGIS prints it.
    pub fn parse_hex(&self, hex: &str) -> Result<Geometry> {
        self.parse(&hex_to_vec(hex)?)
    }

    fn read_geometry(
        &self,
        reader: &mut Reader,
        dims: &mut Option<Dimensions>,
        expected: Option<GeometryType>,
        depth: usize,
    ) -> Result<Geometry> {
        let start = reader.offset();
        if depth > MAX_NESTING {
            return Err(reader.error(format!("geometry nesting deeper than {}", MAX_NESTING)));
        }
        let header = WkbHeader::read(reader, &self.config)?;
        if let Some(expected) = expected {
            if header.geometry_type != expected {
                return Err(Error::format(
                    FORMAT,
                    start,
                    format!("expected {} element, found {}", expected, header.geometry_type),
                ));
            }
        }
        self.check_dims(dims, header.dimensions(), start)?;
        if depth == 0 {
            if let Some(srid) = header.srid {
                if srid != self.factory.srid() {
                    debug!("ignoring EWKB srid {}, factory srid is {}", srid, self.factory.srid());
                }
            }
        }

        let le = header.little_endian;
        let d = header.dimensions();
        let f = &self.factory;
        let geometry: Geometry = match header.geometry_type {
            GeometryType::Point => self.read_point(reader, le, d)?.into(),
            GeometryType::Polygon => self.read_polygon(reader, le, d)?.into(),
            GeometryType::MultiPoint => {
                let n = reader.read_u32(le)?;
                let mut points = Vec::new();
                for _ in 0..n {
                    let element = Some(GeometryType::Point);
                    match self.read_geometry(reader, dims, element, depth + 1)? {
                        Geometry::Point(p) => points.push(p),
                        _ => return Err(reader.error("expected Point element")),
                    }
                }
                f.multi_point(points)?.into()
            }
            GeometryType::MultiLineString => {
                let n = reader.read_u32(le)?;
                let mut lines = Vec::new();
                for _ in 0..n {
                    let element = Some(GeometryType::LineString);
                    match self.read_geometry(reader, dims, element, depth + 1)? {
                        Geometry::LineString(ls) => lines.push(ls),
                        _ => return Err(reader.error("expected LineString element")),
                    }
                }
                f.multi_line_string(lines)?.into()
            }
            GeometryType::MultiPolygon => {
                let n = reader.read_u32(le)?;
                let mut polygons = Vec::new();
                for _ in 0..n {
                    let element = Some(GeometryType::Polygon);
                    match self.read_geometry(reader, dims, element, depth + 1)? {
                        Geometry::Polygon(poly) => polygons.push(poly),
                        _ => return Err(reader.error("expected Polygon element")),
                    }
                }
                f.multi_polygon(polygons)?.into()
            }
            GeometryType::GeometryCollection => {
                let n = reader.read_u32(le)?;
                let mut geometries = Vec::new();
                for _ in 0..n {
                    geometries.push(self.read_geometry(reader, dims, None, depth + 1)?);
                }
                f.collection(geometries)?.into()
            }
            _ => self.read_line_string(reader, le, d)?.into(),
        };
        Ok(geometry)
    }

    fn check_dims(
        &self,
        current: &mut Option<Dimensions>,
        found: Dimensions,
        offset: usize,
    ) -> Result<()> {
        match current {
            Some(dims) if *dims != found => {
                Err(Error::format(FORMAT, offset, "inconsistent Z/M dimensions"))
            }
            Some(_) => Ok(()),
            None => {
                if found.has_z && !self.factory.has_z() {
                    return Err(Error::format(
                        FORMAT,
                        offset,
                        "data has a Z coordinate but the factory does not support it",
                    ));
                }
                if found.has_m && !self.factory.has_m() {
                    return Err(Error::format(
                        FORMAT,
                        offset,
                        "data has an M coordinate but the factory does not support it",
                    ));
                }
                *current = Some(found);
                Ok(())
            }
        }
    }

    fn read_coord(&self, reader: &mut Reader, le: bool, dims: Dimensions) -> Result<Coord> {
        let x = reader.read_f64(le)?;
        let y = reader.read_f64(le)?;
        let z = if dims.has_z { Some(reader.read_f64(le)?) } else { None };
        let m = if dims.has_m { Some(reader.read_f64(le)?) } else { None };
        Ok(Coord { x, y, z, m })
    }

    fn read_coords(&self, reader: &mut Reader, le: bool, dims: Dimensions) -> Result<Vec<Coord>> {
        let n = reader.read_u32(le)?;
        let mut coords = Vec::new();
        for _ in 0..n {
            coords.push(self.read_coord(reader, le, dims)?);
        }
        Ok(coords)
    }

    fn read_point(&self, reader: &mut Reader, le: bool, dims: Dimensions) -> Result<Point> {
        let start = reader.offset();
        let coord = self.read_coord(reader, le, dims)?;
        if coord.is_nan() {
            return Err(Error::format(FORMAT, start, "empty points are not supported"));
        }
        Ok(self.factory.point_from(coord))
    }

    fn read_line_string(
        &self,
        reader: &mut Reader,
        le: bool,
        dims: Dimensions,
    ) -> Result<LineString> {
        let coords = self.read_coords(reader, le, dims)?;
        self.factory.line_string(coords)
    }

    fn read_ring(&self, reader: &mut Reader, le: bool, dims: Dimensions) -> Result<LinearRing> {
        let coords = self.read_coords(reader, le, dims)?;
        self.factory.linear_ring(coords)
    }

    fn read_polygon(&self, reader: &mut Reader, le: bool, dims: Dimensions) -> Result<Polygon> {
        let f = &self.factory;
        let n = reader.read_u32(le)?;
        if n == 0 {
            return f.polygon(f.linear_ring(Vec::new())?, Vec::new());
        }
        let exterior = self.read_ring(reader, le, dims)?;
        let mut interiors = Vec::new();
        for _ in 1..n {
            interiors.push(self.read_ring(reader, le, dims)?);
        }
        f.polygon(exterior, interiors)
    }
}

/// Decode a hex string, upper or lower case.
pub(crate) fn hex_to_vec(hexstr: &str) -> Result<Vec<u8>> {
    let digit = |offset: usize, c: u8| match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(Error::format(FORMAT, offset, format!("invalid hex digit `{}`", c as char))),
    };
    let bytes = hexstr.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(Error::format(FORMAT, bytes.len(), "odd number of hex digits"));
    }
    bytes
        .chunks(2)
        .enumerate()
        .map(|(i, chars)| Ok(digit(i * 2, chars[0])? * 16 + digit(i * 2 + 1, chars[1])?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn factory(srid: i32, has_z: bool, has_m: bool, config: WkbGeneratorConfig) -> Factory {
        Factory::builder()
            .srid(srid)
            .has_z(has_z)
            .has_m(has_m)
            .wkb_generator(config)
            .build()
            .unwrap()
    }

    fn with_srid() -> WkbGeneratorConfig {
        WkbGeneratorConfig {
            emit_ewkb_srid: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_ewkb_write() {
        let f = Factory::default();
        // 'POINT (10 -20)'
        let point: Geometry = f.point(10.0, -20.0).into();
        assert_eq!(
            f.wkb_generator().generate_hex(&point),
            "0101000000000000000000244000000000000034C0"
        );

        // 'SRID=4326;POINT (10 -20)'
        let f = factory(4326, false, false, with_srid());
        let point: Geometry = f.point(10.0, -20.0).into();
        assert_eq!(
            f.wkb_generator().generate_hex(&point),
            "0101000020E6100000000000000000244000000000000034C0"
        );

        // 'LINESTRING (10 -20, -0 -0.5)'
        let f = Factory::default();
        let line: Geometry = f
            .line_string(vec![Coord::xy(10.0, -20.0), Coord::xy(0., -0.5)])
            .unwrap()
            .into();
        assert_eq!(
            f.wkb_generator().generate_hex(&line),
            "010200000002000000000000000000244000000000000034C00000000000000000000000000000E0BF"
        );

        // 'SRID=4326;LINESTRING (10 -20, -0 -0.5)'
        let f = factory(4326, false, false, with_srid());
        let line: Geometry = f
            .line_string(vec![Coord::xy(10.0, -20.0), Coord::xy(0., -0.5)])
            .unwrap()
            .into();
        assert_eq!(
            f.wkb_generator().generate_hex(&line),
            "0102000020E610000002000000000000000000244000000000000034C00000000000000000000000000000E0BF"
        );
    }

    #[test]
    fn test_type_codes() {
        let p = Coord::xyzm(1., 2., 3., 4.);
        let f = factory(0, true, false, WkbGeneratorConfig::default());
        let wkb = f.generate_wkb(&f.point_from(p).into());
        assert_eq!(&wkb[1..5], &[0x01, 0x00, 0x00, 0x80]);
        assert_eq!(wkb.len(), 29);

        let wkb12 = WkbGeneratorConfig {
            type_format: WkbTypeFormat::Wkb12,
            ..Default::default()
        };
        let f = factory(0, true, true, wkb12.clone());
        let wkb = f.generate_wkb(&f.point_from(p).into());
        assert_eq!(LittleEndian::read_u32(&wkb[1..5]), 3001);
        let f = factory(0, false, true, wkb12);
        let wkb = f.generate_wkb(&f.multi_point(vec![f.point_from(p)]).unwrap().into());
        assert_eq!(LittleEndian::read_u32(&wkb[1..5]), 2004);
        assert_eq!(LittleEndian::read_u32(&wkb[10..14]), 2001);
    }

    #[test]
    fn test_big_endian() {
        let config = WkbGeneratorConfig {
            little_endian: false,
            ..Default::default()
        };
        let f = factory(0, false, false, config);
        let point: Geometry = f.point(10.0, -20.0).into();
        assert_eq!(
            f.wkb_generator().generate_hex(&point),
            "00000000014024000000000000C034000000000000"
        );
        assert_eq!(f.parse_wkb(&f.generate_wkb(&point)).unwrap(), point);
    }

    #[test]
    fn test_ewkb_read() {
        // SELECT 'POINT(10 -20)'::geometry
        let ewkb = hex_to_vec("0101000000000000000000244000000000000034C0").unwrap();
        assert_eq!(ewkb, &[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 36, 64, 0, 0, 0, 0, 0, 0, 52, 192]);
        let f = Factory::default();
        let point = f.parse_wkb(&ewkb).unwrap();
        assert_eq!(point, f.point(10.0, -20.0).into());

        // SELECT 'SRID=4326;LINESTRING (10 -20, -0 -0.5)'::geometry
        let f = Factory::builder().srid(4326).build().unwrap();
        let line = f
            .parse_wkb_hex("0102000020E610000002000000000000000000244000000000000034C00000000000000000000000000000E0BF")
            .unwrap();
        assert_eq!(line.srid(), 4326);
        assert_eq!(
            line,
            f.line_string(vec![Coord::xy(10.0, -20.0), Coord::xy(0., -0.5)]).unwrap().into()
        );

        // lower case hex
        let point = f.parse_wkb_hex("0101000000000000000000244000000000000034c0").unwrap();
        assert_eq!(point, f.point(10.0, -20.0).into());
    }

    #[test]
    fn test_peek_header() {
        let bytes = hex_to_vec("0101000020E6100000000000000000244000000000000034C0").unwrap();
        let header = WkbHeader::peek(&bytes).unwrap();
        assert_eq!(
            header,
            WkbHeader {
                little_endian: true,
                geometry_type: GeometryType::Point,
                has_z: false,
                has_m: false,
                srid: Some(4326),
            }
        );
        assert_matches!(WkbHeader::peek(&[1, 1, 0]), Err(Error::Format { offset: 1, .. }));
    }

    #[test]
    fn test_round_trips() {
        for &(has_z, has_m) in &[(false, false), (true, false), (false, true), (true, true)] {
            for &type_format in &[WkbTypeFormat::Ewkb, WkbTypeFormat::Wkb12] {
                for &little_endian in &[true, false] {
                    let config = WkbGeneratorConfig {
                        type_format,
                        emit_ewkb_srid: little_endian,
                        little_endian,
                    };
                    let f = factory(3857, has_z, has_m, config);
                    let c = |x: f64, y: f64| Coord::xyzm(x, y, -x, x * y);
                    let ring = |d: f64| {
                        f.linear_ring(vec![c(0., 0.), c(d, 0.), c(d, d), c(0., d), c(0., 0.)])
                            .unwrap()
                    };
                    let poly = f.polygon(ring(10.), vec![ring(1.)]).unwrap();
                    let empty_ring = f.linear_ring(Vec::new()).unwrap();
                    let empty_poly = f.polygon(empty_ring, Vec::new()).unwrap();
                    let line = f.line_string(vec![c(1., 2.), c(3., 4.), c(5., 6.)]).unwrap();
                    let samples: Vec<Geometry> = vec![
                        f.point_from(c(1., -1.)).into(),
                        line.clone().into(),
                        f.line_string(Vec::new()).unwrap().into(),
                        poly.clone().into(),
                        empty_poly.clone().into(),
                        f.multi_point(vec![f.point(1., 2.), f.point(-3., 0.5)]).unwrap().into(),
                        f.multi_line_string(vec![line.clone()]).unwrap().into(),
                        f.multi_polygon(vec![poly.clone(), empty_poly]).unwrap().into(),
                        f.collection(vec![
                            f.point(7., 8.).into(),
                            f.collection(Vec::new()).unwrap().into(),
                            poly.into(),
                        ])
                        .unwrap()
                        .into(),
                    ];
                    for geom in samples {
                        let wkb = f.generate_wkb(&geom);
                        assert_eq!(f.parse_wkb(&wkb).unwrap(), geom, "{}", geom);
                    }
                }
            }
        }
    }

    #[test]
    fn test_line_and_ring_decode_as_line_string() {
        let f = Factory::default();
        let line = f.line(vec![Coord::xy(0., 0.), Coord::xy(1., 1.)]).unwrap();
        let wkb = f.generate_wkb(&line.clone().into());
        assert_eq!(wkb[1], 2);
        assert_eq!(f.parse_wkb(&wkb).unwrap(), Geometry::LineString(line.into_line_string()));
    }

    #[test]
    fn test_missing_dims_filled() {
        let f = Factory::builder().has_z(true).has_m(true).build().unwrap();
        let point = f.parse_wkb_hex("0101000000000000000000244000000000000034C0").unwrap();
        assert_eq!(point, f.point_from(Coord::xyzm(10., -20., 0., 0.)).into());
    }

    #[test]
    fn test_read_errors() {
        let f = Factory::default();
        let point = hex_to_vec("0101000000000000000000244000000000000034C0").unwrap();
        assert_matches!(
            f.parse_wkb(&point[..15]),
            Err(Error::Format { format: "WKB", offset: 13, .. })
        );
        assert_matches!(f.parse_wkb(&[]), Err(Error::Format { offset: 0, .. }));

        let mut bad = point.clone();
        bad[0] = 7;
        assert_matches!(f.parse_wkb(&bad), Err(Error::Format { offset: 0, .. }));

        let mut bad = point.clone();
        bad[1] = 42;
        assert_matches!(f.parse_wkb(&bad), Err(Error::Format { offset: 1, .. }));

        let mut extra = point.clone();
        extra.push(0);
        assert_matches!(f.parse_wkb(&extra), Err(Error::Format { offset: 21, .. }));
        let lenient = Factory::builder()
            .wkb_parser(WkbParserConfig {
                ignore_extra_bytes: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert!(lenient.parse_wkb(&extra).is_ok());

        // POINT Z on a 2D factory
        let z = Factory::builder().has_z(true).build().unwrap();
        let wkb = z.generate_wkb(&z.point(1., 2.).into());
        assert_matches!(f.parse_wkb(&wkb), Err(Error::Format { offset: 0, .. }));

        // POINT EMPTY as PostGIS writes it
        let mut empty = vec![1, 1, 0, 0, 0];
        empty.extend_from_slice(&f64::NAN.to_le_bytes());
        empty.extend_from_slice(&f64::NAN.to_le_bytes());
        assert_matches!(f.parse_wkb(&empty), Err(Error::Format { offset: 5, .. }));

        assert_matches!(f.parse_wkb_hex("010"), Err(Error::Format { .. }));
        assert_matches!(f.parse_wkb_hex("01XY"), Err(Error::Format { offset: 2, .. }));
    }

    #[test]
    fn test_deep_nesting() {
        let f = Factory::default();
        // n collections of one element each, around POINT (1 2)
        let nested = |n: usize| {
            let mut bytes = Vec::new();
            for _ in 0..n {
                bytes.extend_from_slice(&[1, 7, 0, 0, 0, 1, 0, 0, 0]);
            }
            bytes.extend_from_slice(&[1, 1, 0, 0, 0]);
            bytes.extend_from_slice(&1f64.to_le_bytes());
            bytes.extend_from_slice(&2f64.to_le_bytes());
            bytes
        };
        assert!(f.parse_wkb(&nested(MAX_NESTING)).is_ok());
        let too_deep = (MAX_NESTING + 1) * 9;
        assert_matches!(
            f.parse_wkb(&nested(MAX_NESTING + 1)),
            Err(Error::Format { format: "WKB", offset, .. }) if offset == too_deep
        );
        assert_matches!(f.parse_wkb(&nested(100_000)), Err(Error::Format { .. }));
    }

    #[test]
    fn test_dialect_switches() {
        let z = Factory::builder().has_z(true).build().unwrap();
        let ewkb = z.generate_wkb(&z.point(1., 2.).into());
        let no_ewkb = Factory::builder()
            .has_z(true)
            .wkb_parser(WkbParserConfig {
                support_ewkb: false,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_matches!(no_ewkb.parse_wkb(&ewkb), Err(Error::Format { .. }));

        let iso = Factory::builder()
            .has_z(true)
            .wkb_generator(WkbGeneratorConfig {
                type_format: WkbTypeFormat::Wkb12,
                ..Default::default()
            })
            .build()
            .unwrap();
        let wkb12 = iso.generate_wkb(&iso.point(1., 2.).into());
        assert!(no_ewkb.parse_wkb(&wkb12).is_ok());
        let no_wkb12 = Factory::builder()
            .has_z(true)
            .wkb_parser(WkbParserConfig {
                support_wkb12: false,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_matches!(no_wkb12.parse_wkb(&wkb12), Err(Error::Format { .. }));
        assert!(no_wkb12.parse_wkb(&ewkb).is_ok());
    }

    #[test]
    fn test_foreign_srid_is_ignored() {
        let f = Factory::builder().srid(3857).build().unwrap();
        let point = f.parse_wkb_hex("0101000020E6100000000000000000244000000000000034C0").unwrap();
        assert_eq!(point.srid(), 3857);
    }
}
