//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Read and write geometries in Well-Known Text.
//!
//! Three tag dialects are produced and understood:
//!
//! - `wkt11`: `POINT (1 2 3)`, Z and M are signaled by the number of values
//! - `ewkt`: like `wkt11` but M-only data is tagged `POINTM`, optionally
//!   prefixed by `SRID=4326;`
//! - `wkt12`: `POINT Z (1 2 3)`, `POINT M (..)`, `POINT ZM (..)`

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::geometry::{Geometry, LineString, LinearRing, Polygon};
use crate::types::{Coord, Dimensions, GeometryType, MAX_NESTING};

const FORMAT: &str = "WKT";

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConvertCase {
    #[default]
    Upper,
    Lower,
    /// Keep the mixed-case keywords, e.g. `LineString`.
    #[serde(rename = "none")]
    Keep,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum WktTagFormat {
    #[default]
    Wkt11,
    Ewkt,
    Wkt12,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
pub struct WktGeneratorConfig {
    pub convert_case: ConvertCase,
    pub tag_format: WktTagFormat,
    /// Prefix the output with `SRID=<srid>;`.
    pub emit_ewkt_srid: bool,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(default)]
pub struct WktParserConfig {
    /// Accept the `SRID=n;` prefix and `POINTM` style tags.
    pub support_ewkt: bool,
    /// Accept `Z`, `M` and `ZM` tags.
    pub support_wkt12: bool,
    /// Reject anything but plain 2D WKT 1.1.
    pub strict_wkt11: bool,
    pub ignore_extra_tokens: bool,
}

impl Default for WktParserConfig {
    fn default() -> Self {
        WktParserConfig {
            support_ewkt: true,
            support_wkt12: true,
            strict_wkt11: false,
            ignore_extra_tokens: false,
        }
    }
}

// --- Generator

#[derive(Clone, Debug, Default)]
pub struct WktGenerator {
    config: WktGeneratorConfig,
}

impl WktGenerator {
    pub fn new(config: WktGeneratorConfig) -> Self {
        WktGenerator { config }
    }

    pub fn config(&self) -> &WktGeneratorConfig {
        &self.config
    }

    pub fn generate(&self, geometry: &Geometry) -> String {
        let mut out = String::new();
        if self.config.emit_ewkt_srid {
            out.push_str(&format!("SRID={};", geometry.srid()));
        }
        let dims = geometry.factory().dimensions();
        self.write_geometry(&mut out, geometry, dims);
        out
    }

    fn header(&self, ty: GeometryType, dims: Dimensions) -> String {
        let mut tag = ty.wkt_keyword().to_string();
        match self.config.tag_format {
            WktTagFormat::Wkt11 => {}
            WktTagFormat::Ewkt => {
                if dims.has_m && !dims.has_z {
                    tag.push('M');
                }
            }
            WktTagFormat::Wkt12 => match (dims.has_z, dims.has_m) {
                (true, true) => tag.push_str(" ZM"),
                (true, false) => tag.push_str(" Z"),
                (false, true) => tag.push_str(" M"),
                (false, false) => {}
            },
        }
        match self.config.convert_case {
            ConvertCase::Upper => tag.to_ascii_uppercase(),
            ConvertCase::Lower => tag.to_ascii_lowercase(),
            ConvertCase::Keep => tag,
        }
    }

    fn empty(&self) -> &'static str {
        match self.config.convert_case {
            ConvertCase::Lower => "empty",
            _ => "EMPTY",
        }
    }

    fn write_geometry(&self, out: &mut String, geometry: &Geometry, dims: Dimensions) {
        out.push_str(&self.header(geometry.geometry_type(), dims));
        out.push(' ');
        if geometry.is_empty() {
            out.push_str(self.empty());
            return;
        }
        match geometry {
            Geometry::Point(p) => write_point(out, &p.coord()),
            Geometry::LineString(ls) => write_coords(out, ls.coords()),
            Geometry::Line(ls) => write_coords(out, ls.coords()),
            Geometry::LinearRing(ls) => write_coords(out, ls.coords()),
            Geometry::Polygon(poly) => self.write_polygon(out, poly),
            Geometry::MultiPoint(mp) => {
                out.push('(');
                for (i, p) in mp.points().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_point(out, &p.coord());
                }
                out.push(')');
            }
            Geometry::MultiLineString(mls) => {
                out.push('(');
                for (i, ls) in mls.lines().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if ls.is_empty() {
                        out.push_str(self.empty());
                    } else {
                        write_coords(out, ls.coords());
                    }
                }
                out.push(')');
            }
            Geometry::MultiPolygon(mpoly) => {
                out.push('(');
                for (i, poly) in mpoly.polygons().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if poly.is_empty() {
                        out.push_str(self.empty());
                    } else {
                        self.write_polygon(out, poly);
                    }
                }
                out.push(')');
            }
            Geometry::GeometryCollection(gc) => {
                out.push('(');
                for (i, g) in gc.geometries().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_geometry(out, g, dims);
                }
                out.push(')');
            }
        }
    }

    fn write_polygon(&self, out: &mut String, poly: &Polygon) {
        out.push('(');
        for (i, ring) in poly.rings().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if ring.is_empty() {
                out.push_str(self.empty());
            } else {
                write_coords(out, ring.coords());
            }
        }
        out.push(')');
    }
}

fn write_values(out: &mut String, c: &Coord) {
    out.push_str(&format!("{} {}", c.x, c.y));
    if let Some(z) = c.z {
        out.push_str(&format!(" {}", z));
    }
    if let Some(m) = c.m {
        out.push_str(&format!(" {}", m));
    }
}

fn write_point(out: &mut String, c: &Coord) {
    out.push('(');
    write_values(out, c);
    out.push(')');
}

fn write_coords(out: &mut String, coords: &[Coord]) {
    out.push('(');
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_values(out, c);
    }
    out.push(')');
}

// --- Tokenizer

#[derive(PartialEq, Clone, Debug)]
enum Token {
    LParen,
    RParen,
    Comma,
    Semicolon,
    Equals,
    Word(String),
    Number(f64),
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;
        let token = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'(' | b'[' => Token::LParen,
            b')' | b']' => Token::RParen,
            b',' => Token::Comma,
            b';' => Token::Semicolon,
            b'=' => Token::Equals,
            b'-' | b'+' | b'.' | b'0'..=b'9' => {
                pos += 1;
                let signed_word = matches!(c, b'-' | b'+')
                    && pos < bytes.len()
                    && bytes[pos].is_ascii_alphabetic();
                if signed_word {
                    // signed `inf` or `infinity`
                    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
                        pos += 1;
                    }
                } else {
                    while pos < bytes.len()
                        && matches!(bytes[pos], b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
                    {
                        pos += 1;
                    }
                }
                tokens.push((start, Token::Number(parse_number(&input[start..pos], start)?)));
                continue;
            }
            c if c.is_ascii_alphabetic() => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                let word = &input[start..pos];
                let token = if is_non_finite(word) {
                    Token::Number(parse_number(word, start)?)
                } else {
                    Token::Word(word.to_string())
                };
                tokens.push((start, token));
                continue;
            }
            _ => {
                let found = input[start..].chars().next().unwrap_or('?');
                return Err(Error::format(
                    FORMAT,
                    start,
                    format!("unexpected character `{}`", found),
                ));
            }
        };
        tokens.push((start, token));
        pos += 1;
    }
    Ok(tokens)
}

/// Words that `f64`'s `Display` produces for non-finite values.
fn is_non_finite(word: &str) -> bool {
    ["inf", "infinity", "nan"].iter().any(|w| word.eq_ignore_ascii_case(w))
}

fn parse_number(text: &str, offset: usize) -> Result<f64> {
    text.to_ascii_lowercase()
        .parse::<f64>()
        .map_err(|_| Error::format(FORMAT, offset, format!("invalid number `{}`", text)))
}

// --- Parser

/// WKT parser bound to a factory. Every geometry is built through that factory.
#[derive(Clone, Debug)]
pub struct WktParser {
    factory: Factory,
    config: WktParserConfig,
}

struct ParseState {
    tokens: Vec<(usize, Token)>,
    idx: usize,
    end: usize,
    dims: Option<Dimensions>,
}

impl ParseState {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.idx).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.idx).map(|(o, _)| *o).unwrap_or(self.end)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::format(FORMAT, self.offset(), message)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if self.peek() == Some(&expected) {
            self.idx += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(word))
    }

    /// Consume `EMPTY` if it is next.
    fn take_empty(&mut self) -> bool {
        if self.peek_word("EMPTY") {
            self.idx += 1;
            true
        } else {
            false
        }
    }
}

impl WktParser {
    pub fn new(factory: Factory, config: WktParserConfig) -> Self {
        WktParser { factory, config }
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn config(&self) -> &WktParserConfig {
        &self.config
    }

    pub fn parse(&self, text: &str) -> Result<Geometry> {
        let mut st = ParseState {
            tokens: tokenize(text)?,
            idx: 0,
            end: text.len(),
            dims: None,
        };
        if st.peek_word("SRID") {
            if !self.config.support_ewkt || self.config.strict_wkt11 {
                return Err(st.error("EWKT SRID prefix is not enabled"));
            }
            st.idx += 1;
            st.expect(Token::Equals, "`=` after SRID")?;
            let srid = match st.peek() {
                Some(Token::Number(n)) if n.fract() == 0.0 => *n as i32,
                _ => return Err(st.error("expected integer SRID")),
            };
            st.idx += 1;
            st.expect(Token::Semicolon, "`;` after SRID")?;
            if srid != self.factory.srid() {
                debug!(
                    "ignoring EWKT srid {}, factory srid is {}",
                    srid,
                    self.factory.srid()
                );
            }
        }
        let geometry = self.parse_tagged(&mut st, 0)?;
        if st.peek().is_some() && !self.config.ignore_extra_tokens {
            return Err(st.error("unexpected tokens after geometry"));
        }
        Ok(geometry)
    }

    fn set_dims(&self, st: &mut ParseState, dims: Dimensions) -> Result<()> {
        if let Some(current) = st.dims {
            if current != dims {
                return Err(st.error("inconsistent Z/M dimensions"));
            }
            return Ok(());
        }
        if dims.has_z && !self.factory.has_z() {
            return Err(st.error("data has a Z coordinate but the factory does not support it"));
        }
        if dims.has_m && !self.factory.has_m() {
            return Err(st.error("data has an M coordinate but the factory does not support it"));
        }
        st.dims = Some(dims);
        Ok(())
    }

    fn parse_tagged(&self, st: &mut ParseState, depth: usize) -> Result<Geometry> {
        if depth > MAX_NESTING {
            return Err(st.error(format!("geometry nesting deeper than {}", MAX_NESTING)));
        }
        let word = match st.peek() {
            Some(Token::Word(w)) => w.clone(),
            _ => return Err(st.error("expected geometry type")),
        };
        let mut tag: Option<Dimensions> = None;
        let ty = match GeometryType::from_wkt_keyword(&word) {
            Some(ty) => ty,
            None => {
                let ewkt_m = word.len() > 1
                    && word.ends_with(['M', 'm'])
                    && GeometryType::from_wkt_keyword(&word[..word.len() - 1]).is_some();
                if !ewkt_m {
                    return Err(st.error(format!("unknown geometry type `{}`", word)));
                }
                if !self.config.support_ewkt || self.config.strict_wkt11 {
                    return Err(st.error("EWKT M tags are not enabled"));
                }
                let dims = Dimensions::new(false, true);
                self.set_dims(st, dims)?;
                tag = Some(dims);
                GeometryType::from_wkt_keyword(&word[..word.len() - 1])
                    .ok_or_else(|| st.error("unknown geometry type"))?
            }
        };
        st.idx += 1;

        let wkt12_tag = if st.peek_word("Z") {
            Some(Dimensions::new(true, false))
        } else if st.peek_word("M") {
            Some(Dimensions::new(false, true))
        } else if st.peek_word("ZM") {
            Some(Dimensions::new(true, true))
        } else {
            None
        };
        if let Some(dims) = wkt12_tag {
            if !self.config.support_wkt12 || self.config.strict_wkt11 || tag.is_some() {
                return Err(st.error("WKT 1.2 dimension tags are not enabled"));
            }
            self.set_dims(st, dims)?;
            st.idx += 1;
        }

        let f = &self.factory;
        if st.take_empty() {
            return match ty {
                GeometryType::Point => Err(st.error("empty points are not supported")),
                GeometryType::Polygon => {
                    Ok(f.polygon(f.linear_ring(Vec::new())?, Vec::new())?.into())
                }
                GeometryType::MultiPoint => Ok(f.multi_point(Vec::new())?.into()),
                GeometryType::MultiLineString => Ok(f.multi_line_string(Vec::new())?.into()),
                GeometryType::MultiPolygon => Ok(f.multi_polygon(Vec::new())?.into()),
                GeometryType::GeometryCollection => Ok(f.collection(Vec::new())?.into()),
                _ => Ok(f.line_string(Vec::new())?.into()),
            };
        }

        let geometry: Geometry = match ty {
            GeometryType::Point => {
                st.expect(Token::LParen, "`(`")?;
                let c = self.parse_coord(st)?;
                st.expect(Token::RParen, "`)`")?;
                f.point_from(c).into()
            }
            GeometryType::Polygon => self.parse_polygon(st)?.into(),
            GeometryType::MultiPoint => {
                st.expect(Token::LParen, "`(`")?;
                let mut points = Vec::new();
                loop {
                    if st.peek() == Some(&Token::LParen) {
                        st.idx += 1;
                        points.push(f.point_from(self.parse_coord(st)?));
                        st.expect(Token::RParen, "`)`")?;
                    } else {
                        points.push(f.point_from(self.parse_coord(st)?));
                    }
                    if !self.list_continues(st)? {
                        break;
                    }
                }
                f.multi_point(points)?.into()
            }
            GeometryType::MultiLineString => {
                st.expect(Token::LParen, "`(`")?;
                let mut lines = Vec::new();
                loop {
                    lines.push(self.parse_line_string(st)?);
                    if !self.list_continues(st)? {
                        break;
                    }
                }
                f.multi_line_string(lines)?.into()
            }
            GeometryType::MultiPolygon => {
                st.expect(Token::LParen, "`(`")?;
                let mut polygons = Vec::new();
                loop {
                    polygons.push(self.parse_polygon(st)?);
                    if !self.list_continues(st)? {
                        break;
                    }
                }
                f.multi_polygon(polygons)?.into()
            }
            GeometryType::GeometryCollection => {
                st.expect(Token::LParen, "`(`")?;
                let mut geometries = Vec::new();
                loop {
                    geometries.push(self.parse_tagged(st, depth + 1)?);
                    if !self.list_continues(st)? {
                        break;
                    }
                }
                f.collection(geometries)?.into()
            }
            _ => self.parse_line_string(st)?.into(),
        };
        Ok(geometry)
    }

    /// After a list element: `true` on `,`, `false` on the closing `)`.
    fn list_continues(&self, st: &mut ParseState) -> Result<bool> {
        match st.peek() {
            Some(Token::Comma) => {
                st.idx += 1;
                Ok(true)
            }
            Some(Token::RParen) => {
                st.idx += 1;
                Ok(false)
            }
            _ => Err(st.error("expected `,` or `)`")),
        }
    }

    fn parse_coord(&self, st: &mut ParseState) -> Result<Coord> {
        let start = st.idx;
        let mut values = Vec::with_capacity(4);
        while let Some(Token::Number(n)) = st.peek() {
            values.push(*n);
            st.idx += 1;
        }
        if values.len() < 2 {
            return Err(st.error("expected at least two coordinate values"));
        }
        let dims = match st.dims {
            Some(dims) => dims,
            None => {
                let dims = match values.len() {
                    2 => Dimensions::XY,
                    3 if self.factory.has_z() => Dimensions::new(true, false),
                    3 => Dimensions::new(false, true),
                    _ => Dimensions::new(true, true),
                };
                let saved = st.idx;
                st.idx = start;
                self.set_dims(st, dims)?;
                st.idx = saved;
                dims
            }
        };
        if self.config.strict_wkt11 && values.len() != 2 {
            st.idx = start;
            return Err(st.error("strict WKT 1.1 allows only X and Y"));
        }
        if values.len() != dims.count() {
            st.idx = start;
            return Err(st.error(format!(
                "expected {} coordinate values, found {}",
                dims.count(),
                values.len()
            )));
        }
        let mut rest = values[2..].iter().copied();
        Ok(Coord {
            x: values[0],
            y: values[1],
            z: if dims.has_z { rest.next() } else { None },
            m: if dims.has_m { rest.next() } else { None },
        })
    }

    fn parse_coord_seq(&self, st: &mut ParseState) -> Result<Vec<Coord>> {
        if st.take_empty() {
            return Ok(Vec::new());
        }
        st.expect(Token::LParen, "`(`")?;
        let mut coords = Vec::new();
        loop {
            coords.push(self.parse_coord(st)?);
            if !self.list_continues(st)? {
                break;
            }
        }
        Ok(coords)
    }

    fn parse_line_string(&self, st: &mut ParseState) -> Result<LineString> {
        let coords = self.parse_coord_seq(st)?;
        self.factory.line_string(coords)
    }

    fn parse_ring(&self, st: &mut ParseState) -> Result<LinearRing> {
        let coords = self.parse_coord_seq(st)?;
        self.factory.linear_ring(coords)
    }

    fn parse_polygon(&self, st: &mut ParseState) -> Result<Polygon> {
        let f = &self.factory;
        if st.take_empty() {
            return f.polygon(f.linear_ring(Vec::new())?, Vec::new());
        }
        st.expect(Token::LParen, "`(`")?;
        let exterior = self.parse_ring(st)?;
        let mut interiors = Vec::new();
        while self.list_continues(st)? {
            interiors.push(self.parse_ring(st)?);
        }
        f.polygon(exterior, interiors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn factory(has_z: bool, has_m: bool, config: WktGeneratorConfig) -> Factory {
        Factory::builder()
            .has_z(has_z)
            .has_m(has_m)
            .srid(4326)
            .wkt_generator(config)
            .build()
            .unwrap()
    }

    fn ring(f: &Factory, pts: &[(f64, f64)]) -> LinearRing {
        f.linear_ring(pts.iter().map(|&(x, y)| Coord::xy(x, y))).unwrap()
    }

    fn samples(f: &Factory) -> Vec<Geometry> {
        let c = |x: f64, y: f64| Coord::xyzm(x, y, x + y, x * y);
        let outer = ring(f, &[(0., 0.), (10., 0.), (10., 10.), (0., 10.), (0., 0.)]);
        let hole = ring(f, &[(1., 1.), (2., 1.), (2., 2.), (1., 1.)]);
        let poly = f.polygon(outer, vec![hole]).unwrap();
        let line = f.line_string(vec![c(10., -20.), c(-0.5, 0.25)]).unwrap();
        let empty_line = f.line_string(Vec::new()).unwrap();
        let empty_poly = f.polygon(f.linear_ring(Vec::new()).unwrap(), Vec::new()).unwrap();
        vec![
            f.point_from(c(1.5, -2.0)).into(),
            line.clone().into(),
            poly.clone().into(),
            f.multi_point(vec![f.point(1., 2.), f.point(3., 4.)]).unwrap().into(),
            f.multi_line_string(vec![line.clone(), empty_line]).unwrap().into(),
            f.multi_polygon(vec![poly, empty_poly.clone()]).unwrap().into(),
            f.collection(vec![
                f.point(0.1, 0.2).into(),
                f.collection(vec![line.into()]).unwrap().into(),
                f.multi_point(Vec::new()).unwrap().into(),
            ])
            .unwrap()
            .into(),
            empty_poly.into(),
        ]
    }

    #[test]
    fn round_trip_all_dialects() {
        let cases = [ConvertCase::Upper, ConvertCase::Lower, ConvertCase::Keep];
        let tags = [WktTagFormat::Wkt11, WktTagFormat::Ewkt, WktTagFormat::Wkt12];
        for &(has_z, has_m) in &[(false, false), (true, false), (false, true), (true, true)] {
            for &convert_case in &cases {
                for &tag_format in &tags {
                    for &emit_ewkt_srid in &[false, true] {
                        let config = WktGeneratorConfig {
                            convert_case,
                            tag_format,
                            emit_ewkt_srid,
                        };
                        let f = factory(has_z, has_m, config);
                        for geom in samples(&f) {
                            let text = f.generate_wkt(&geom);
                            let parsed = f
                                .parse_wkt(&text)
                                .unwrap_or_else(|e| panic!("{}: {}", text, e));
                            assert_eq!(parsed, geom, "{}", text);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn generate_dialects() {
        let f = factory(true, false, WktGeneratorConfig::default());
        let p: Geometry = f.point_from(Coord::xyz(1., 2., 3.)).into();
        assert_eq!(f.generate_wkt(&p), "POINT (1 2 3)");
        let wkt12 = WktGenerator::new(WktGeneratorConfig {
            tag_format: WktTagFormat::Wkt12,
            ..Default::default()
        });
        assert_eq!(wkt12.generate(&p), "POINT Z (1 2 3)");

        let f = factory(false, true, WktGeneratorConfig::default());
        let p: Geometry = f.point_from(Coord::xym(1., 2., 3.)).into();
        let ewkt = WktGenerator::new(WktGeneratorConfig {
            tag_format: WktTagFormat::Ewkt,
            emit_ewkt_srid: true,
            convert_case: ConvertCase::Keep,
        });
        assert_eq!(ewkt.generate(&p), "SRID=4326;PointM (1 2 3)");

        let lower = WktGenerator::new(WktGeneratorConfig {
            convert_case: ConvertCase::Lower,
            tag_format: WktTagFormat::Wkt12,
            ..Default::default()
        });
        let f = Factory::default();
        let mp: Geometry = f.multi_point(Vec::new()).unwrap().into();
        assert_eq!(lower.generate(&mp), "multipoint empty");
        let line: Geometry = f.line(vec![Coord::xy(0., 0.), Coord::xy(1e-7, 1e21)]).unwrap().into();
        assert_eq!(f.generate_wkt(&line), "LINESTRING (0 0, 0.0000001 1000000000000000000000)");
    }

    #[test]
    fn parse_variants() {
        let f = Factory::default();
        let g = f.parse_wkt("multipoint (1 2, (3 4))").unwrap();
        assert_eq!(g, f.multi_point(vec![f.point(1., 2.), f.point(3., 4.)]).unwrap().into());
        let g = f.parse_wkt("  LineString[0 0,1e1 -2.5]  ").unwrap();
        assert_eq!(g, f.line_string(vec![Coord::xy(0., 0.), Coord::xy(10., -2.5)]).unwrap().into());
        let g = f.parse_wkt("GEOMETRYCOLLECTION EMPTY").unwrap();
        assert!(g.is_empty());
    }

    #[test]
    fn line_and_ring_come_back_as_line_string() {
        let f = Factory::default();
        let ring = ring(&f, &[(0., 0.), (1., 0.), (1., 1.), (0., 0.)]);
        let parsed = f.parse_wkt(&f.generate_wkt(&ring.clone().into())).unwrap();
        assert_eq!(parsed, Geometry::LineString(ring.into_line_string()));
    }

    #[test]
    fn missing_dims_are_filled() {
        let f = Factory::builder().has_z(true).build().unwrap();
        let g = f.parse_wkt("POINT (1 2)").unwrap();
        assert_eq!(g, f.point_from(Coord::xyz(1., 2., 0.)).into());
    }

    #[test]
    fn format_errors() {
        let f = Factory::default();
        assert_matches!(f.parse_wkt("POINT (1 2 3)"), Err(Error::Format { format: "WKT", .. }));
        assert_matches!(f.parse_wkt("POINT Z (1 2 3)"), Err(Error::Format { offset: 6, .. }));
        assert_matches!(f.parse_wkt("POINT (1)"), Err(Error::Format { offset: 8, .. }));
        assert_matches!(f.parse_wkt("POINT (1 2"), Err(Error::Format { offset: 10, .. }));
        assert_matches!(f.parse_wkt("CIRCLE (1 2)"), Err(Error::Format { offset: 0, .. }));
        assert_matches!(f.parse_wkt("POINT (1 2) x"), Err(Error::Format { offset: 12, .. }));
        assert_matches!(f.parse_wkt("POINT EMPTY"), Err(Error::Format { .. }));
        assert_matches!(f.parse_wkt("POINT (1 2) ; "), Err(Error::Format { .. }));
        assert_matches!(f.parse_wkt("POINT (1 #)"), Err(Error::Format { offset: 9, .. }));
        assert_matches!(f.parse_wkt("LINESTRING (1 2)"), Err(Error::Structural(_)));

        let zf = Factory::builder().has_z(true).build().unwrap();
        assert_matches!(
            zf.parse_wkt("LINESTRING (1 2 3, 4 5)"),
            Err(Error::Format { offset: 19, .. })
        );
        assert_matches!(
            zf.parse_wkt("GEOMETRYCOLLECTION Z (POINT M (1 2 3))"),
            Err(Error::Format { .. })
        );
    }

    #[test]
    fn parser_options() {
        let strict = WktParserConfig {
            support_ewkt: false,
            support_wkt12: false,
            strict_wkt11: false,
            ignore_extra_tokens: true,
        };
        let f = Factory::builder().has_z(true).has_m(true).wkt_parser(strict).build().unwrap();
        assert_matches!(f.parse_wkt("SRID=4326;POINT (1 2 3 4)"), Err(Error::Format { .. }));
        assert_matches!(f.parse_wkt("POINT ZM (1 2 3 4)"), Err(Error::Format { .. }));
        assert_matches!(f.parse_wkt("POINTM (1 2 3)"), Err(Error::Format { .. }));
        assert!(f.parse_wkt("POINT (1 2 3 4) trailing junk").is_ok());

        let wkt11 = WktParserConfig {
            strict_wkt11: true,
            ..Default::default()
        };
        let f = Factory::builder().has_z(true).wkt_parser(wkt11).build().unwrap();
        assert_matches!(f.parse_wkt("POINT (1 2 3)"), Err(Error::Format { .. }));
        assert!(f.parse_wkt("POINT (1 2)").is_ok());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let f = Factory::default();
        let nested = |n: usize| {
            format!(
                "{}POINT (1 2){}",
                "GEOMETRYCOLLECTION (".repeat(n),
                ")".repeat(n)
            )
        };
        assert!(f.parse_wkt(&nested(MAX_NESTING)).is_ok());
        assert_matches!(
            f.parse_wkt(&nested(MAX_NESTING + 1)),
            Err(Error::Format { format: "WKT", .. })
        );
        assert_matches!(f.parse_wkt(&nested(100_000)), Err(Error::Format { .. }));
    }

    #[test]
    fn non_finite_values() {
        let f = Factory::builder().has_m(true).build().unwrap();
        let p: Geometry = f
            .point_from(Coord::xym(f64::INFINITY, f64::NEG_INFINITY, 1.0))
            .into();
        let text = f.generate_wkt(&p);
        assert_eq!(text, "POINT (inf -inf 1)");
        assert_eq!(f.parse_wkt(&text).unwrap(), p);
        let expected: Geometry = f.point_from(Coord::xym(f64::INFINITY, f64::INFINITY, 1.0)).into();
        assert_eq!(f.parse_wkt("POINT (Infinity +INF 1)").unwrap(), expected);
        match f.parse_wkt("POINT (1 2 NaN)").unwrap() {
            Geometry::Point(p) => assert!(p.m().unwrap().is_nan()),
            g => panic!("{}", g),
        }
        assert_matches!(f.parse_wkt("POINT (-foo 2 3)"), Err(Error::Format { offset: 7, .. }));
    }

    #[test]
    fn foreign_srid_is_ignored() {
        let f = Factory::builder().srid(3857).build().unwrap();
        let g = f.parse_wkt("SRID=4326;POINT(1 2)").unwrap();
        assert_eq!(g.srid(), 3857);
    }
}
