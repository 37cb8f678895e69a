//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

use std::fmt;

/// Deepest accepted nesting of geometries inside collections when parsing.
pub(crate) const MAX_NESTING: usize = 64;

/// A single position. `z` and `m` are present only when the owning factory supports them.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Coord { x, y, z: None, m: None }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Coord { x, y, z: Some(z), m: None }
    }

    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Coord { x, y, z: None, m: Some(m) }
    }

    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Coord { x, y, z: Some(z), m: Some(m) }
    }

    /// Fit the coordinate to the given dimensions: missing ordinates become 0,
    /// unsupported ordinates are dropped.
    pub(crate) fn normalized(self, dims: Dimensions) -> Self {
        Coord {
            x: self.x,
            y: self.y,
            z: if dims.has_z { Some(self.z.unwrap_or(0.0)) } else { None },
            m: if dims.has_m { Some(self.m.unwrap_or(0.0)) } else { None },
        }
    }

    pub(crate) fn is_nan(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord::xy(x, y)
    }
}

impl From<(f64, f64, f64)> for Coord {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Coord::xyz(x, y, z)
    }
}

/// Which optional ordinates a coordinate sequence carries.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Hash)]
pub struct Dimensions {
    pub has_z: bool,
    pub has_m: bool,
}

impl Dimensions {
    pub const XY: Dimensions = Dimensions { has_z: false, has_m: false };

    pub fn new(has_z: bool, has_m: bool) -> Self {
        Dimensions { has_z, has_m }
    }

    /// Number of ordinates per coordinate.
    pub fn count(self) -> usize {
        2 + self.has_z as usize + self.has_m as usize
    }
}

/// Tag of each geometry variant.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Line,
    LinearRing,
    Polygon,
    GeometryCollection,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryType {
    /// Base WKB type code. Lines and rings travel as line strings.
    pub fn wkb_code(self) -> u32 {
        match self {
            GeometryType::Point => 1,
            GeometryType::LineString | GeometryType::Line | GeometryType::LinearRing => 2,
            GeometryType::Polygon => 3,
            GeometryType::MultiPoint => 4,
            GeometryType::MultiLineString => 5,
            GeometryType::MultiPolygon => 6,
            GeometryType::GeometryCollection => 7,
        }
    }

    pub fn from_wkb_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(GeometryType::Point),
            2 => Some(GeometryType::LineString),
            3 => Some(GeometryType::Polygon),
            4 => Some(GeometryType::MultiPoint),
            5 => Some(GeometryType::MultiLineString),
            6 => Some(GeometryType::MultiPolygon),
            7 => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }

    /// Keyword used in WKT, in its unconverted mixed case.
    pub fn wkt_keyword(self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString | GeometryType::Line | GeometryType::LinearRing => {
                "LineString"
            }
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }

    pub fn from_wkt_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "POINT" => Some(GeometryType::Point),
            "LINESTRING" => Some(GeometryType::LineString),
            "POLYGON" => Some(GeometryType::Polygon),
            "MULTIPOINT" => Some(GeometryType::MultiPoint),
            "MULTILINESTRING" => Some(GeometryType::MultiLineString),
            "MULTIPOLYGON" => Some(GeometryType::MultiPolygon),
            "GEOMETRYCOLLECTION" => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            GeometryType::Line => "Line",
            GeometryType::LinearRing => "LinearRing",
            other => other.wkt_keyword(),
        };
        f.write_str(name)
    }
}
