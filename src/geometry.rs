//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Geometry values.
//!
//! Every value carries a handle to the [`Factory`] that built it. Values are
//! created through the factory constructors only, which enforce the structural
//! preconditions of each variant.

use std::fmt;
use std::ops::Deref;
use std::slice::Iter;

use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::types::{Coord, GeometryType};

fn check_factory(parent: &Factory, child: &Factory, what: &str) -> Result<()> {
    if parent != child {
        return Err(Error::Structural(format!(
            "{} belongs to a different factory (srid {}) than its parent (srid {})",
            what,
            child.srid(),
            parent.srid()
        )));
    }
    Ok(())
}

fn normalize<I: IntoIterator<Item = Coord>>(factory: &Factory, coords: I) -> Vec<Coord> {
    let dims = factory.dimensions();
    coords.into_iter().map(|c| c.normalized(dims)).collect()
}

// --- Point

#[derive(PartialEq, Clone, Debug)]
pub struct Point {
    factory: Factory,
    coord: Coord,
}

impl Point {
    pub(crate) fn new(factory: &Factory, coord: Coord) -> Self {
        Point {
            factory: factory.clone(),
            coord: coord.normalized(factory.dimensions()),
        }
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn x(&self) -> f64 {
        self.coord.x
    }

    pub fn y(&self) -> f64 {
        self.coord.y
    }

    pub fn z(&self) -> Option<f64> {
        self.coord.z
    }

    pub fn m(&self) -> Option<f64> {
        self.coord.m
    }
}

// --- LineString, Line, LinearRing

#[derive(PartialEq, Clone, Debug)]
pub struct LineString {
    factory: Factory,
    coords: Vec<Coord>,
}

impl LineString {
    pub(crate) fn new<I: IntoIterator<Item = Coord>>(factory: &Factory, coords: I) -> Result<Self> {
        let coords = normalize(factory, coords);
        if coords.len() == 1 {
            return Err(Error::Structural(
                "LineString needs 0 or at least 2 points".to_string(),
            ));
        }
        Ok(LineString {
            factory: factory.clone(),
            coords,
        })
    }

    pub(crate) fn from_points(factory: &Factory, points: &[Point]) -> Result<Self> {
        for point in points {
            check_factory(factory, point.factory(), "point")?;
        }
        Self::new(factory, points.iter().map(|p| p.coord()))
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.coords.iter().map(move |c| Point {
            factory: self.factory.clone(),
            coord: *c,
        })
    }

    pub fn num_points(&self) -> usize {
        self.coords.len()
    }

    pub fn point_n(&self, n: usize) -> Option<Point> {
        self.coords.get(n).map(|c| Point {
            factory: self.factory.clone(),
            coord: *c,
        })
    }

    pub fn start_point(&self) -> Option<Point> {
        self.point_n(0)
    }

    pub fn end_point(&self) -> Option<Point> {
        self.coords.len().checked_sub(1).and_then(|n| self.point_n(n))
    }

    /// Empty line strings count as closed.
    pub fn is_closed(&self) -> bool {
        match (self.coords.first(), self.coords.last()) {
            (Some(first), Some(last)) => first == last,
            _ => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// A line string with exactly two points.
#[derive(PartialEq, Clone, Debug)]
pub struct Line(LineString);

impl Line {
    pub(crate) fn new<I: IntoIterator<Item = Coord>>(factory: &Factory, coords: I) -> Result<Self> {
        let inner = LineString::new(factory, coords)?;
        if inner.num_points() != 2 {
            return Err(Error::Structural(format!(
                "Line needs exactly 2 points, got {}",
                inner.num_points()
            )));
        }
        Ok(Line(inner))
    }

    pub fn into_line_string(self) -> LineString {
        self.0
    }
}

impl Deref for Line {
    type Target = LineString;

    fn deref(&self) -> &LineString {
        &self.0
    }
}

/// A closed line string: empty, or at least 4 points with first == last.
#[derive(PartialEq, Clone, Debug)]
pub struct LinearRing(LineString);

impl LinearRing {
    pub(crate) fn new<I: IntoIterator<Item = Coord>>(factory: &Factory, coords: I) -> Result<Self> {
        let inner = LineString::new(factory, coords)?;
        let n = inner.num_points();
        if n != 0 && n < 4 {
            return Err(Error::Structural(format!(
                "LinearRing needs 0 or at least 4 points, got {}",
                n
            )));
        }
        if !inner.is_closed() {
            return Err(Error::Structural("LinearRing is not closed".to_string()));
        }
        Ok(LinearRing(inner))
    }

    pub fn into_line_string(self) -> LineString {
        self.0
    }
}

impl Deref for LinearRing {
    type Target = LineString;

    fn deref(&self) -> &LineString {
        &self.0
    }
}

impl From<Line> for LineString {
    fn from(line: Line) -> Self {
        line.0
    }
}

impl From<LinearRing> for LineString {
    fn from(ring: LinearRing) -> Self {
        ring.0
    }
}

// --- Polygon

#[derive(PartialEq, Clone, Debug)]
pub struct Polygon {
    factory: Factory,
    exterior: LinearRing,
    interiors: Vec<LinearRing>,
}

impl Polygon {
    pub(crate) fn new<I: IntoIterator<Item = LinearRing>>(
        factory: &Factory,
        exterior: LinearRing,
        interiors: I,
    ) -> Result<Self> {
        check_factory(factory, exterior.factory(), "exterior ring")?;
        let interiors: Vec<LinearRing> = interiors.into_iter().collect();
        for ring in &interiors {
            check_factory(factory, ring.factory(), "interior ring")?;
        }
        if exterior.is_empty() && !interiors.is_empty() {
            return Err(Error::Structural(
                "empty Polygon cannot have interior rings".to_string(),
            ));
        }
        Ok(Polygon {
            factory: factory.clone(),
            exterior,
            interiors,
        })
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn exterior_ring(&self) -> &LinearRing {
        &self.exterior
    }

    pub fn interior_rings(&self) -> &[LinearRing] {
        &self.interiors
    }

    pub fn num_interior_rings(&self) -> usize {
        self.interiors.len()
    }

    /// Exterior ring followed by the interior rings.
    pub fn rings(&self) -> impl Iterator<Item = &LinearRing> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }
}

// --- Collections

macro_rules! collection_type {
    ($(#[$doc:meta])* $name:ident, $field:ident, $item:ty, $what:expr) => {
        $(#[$doc])*
        #[derive(PartialEq, Clone, Debug)]
        pub struct $name {
            factory: Factory,
            $field: Vec<$item>,
        }

        impl $name {
            pub(crate) fn new<I: IntoIterator<Item = $item>>(
                factory: &Factory,
                items: I,
            ) -> Result<Self> {
                let $field: Vec<$item> = items.into_iter().collect();
                for item in &$field {
                    check_factory(factory, item.factory(), $what)?;
                }
                Ok($name {
                    factory: factory.clone(),
                    $field,
                })
            }

            pub fn factory(&self) -> &Factory {
                &self.factory
            }

            pub fn $field(&self) -> Iter<'_, $item> {
                self.$field.iter()
            }

            pub fn num_geometries(&self) -> usize {
                self.$field.len()
            }

            pub fn geometry_n(&self, n: usize) -> Option<&$item> {
                self.$field.get(n)
            }

            pub fn is_empty(&self) -> bool {
                self.$field.is_empty()
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $item;
            type IntoIter = Iter<'a, $item>;

            fn into_iter(self) -> Self::IntoIter {
                self.$field.iter()
            }
        }
    };
}

collection_type!(
    /// Heterogeneous collection of geometries.
    GeometryCollection, geometries, Geometry, "collection element"
);
collection_type!(MultiPoint, points, Point, "point");
collection_type!(MultiLineString, lines, LineString, "line string");
collection_type!(MultiPolygon, polygons, Polygon, "polygon");

// --- Geometry

/// Any geometry value.
#[derive(PartialEq, Clone, Debug)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Line(Line),
    LinearRing(LinearRing),
    Polygon(Polygon),
    GeometryCollection(GeometryCollection),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
}

impl Geometry {
    pub fn factory(&self) -> &Factory {
        match self {
            Geometry::Point(g) => g.factory(),
            Geometry::LineString(g) => g.factory(),
            Geometry::Line(g) => g.factory(),
            Geometry::LinearRing(g) => g.factory(),
            Geometry::Polygon(g) => g.factory(),
            Geometry::GeometryCollection(g) => g.factory(),
            Geometry::MultiPoint(g) => g.factory(),
            Geometry::MultiLineString(g) => g.factory(),
            Geometry::MultiPolygon(g) => g.factory(),
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Line(_) => GeometryType::Line,
            Geometry::LinearRing(_) => GeometryType::LinearRing,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    pub fn srid(&self) -> i32 {
        self.factory().srid()
    }

    /// Topological dimension: 0 for points, 1 for curves, 2 for surfaces.
    /// Collections report their largest member, or -1 when empty.
    pub fn dimension(&self) -> i32 {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => 0,
            Geometry::LineString(_)
            | Geometry::Line(_)
            | Geometry::LinearRing(_)
            | Geometry::MultiLineString(_) => 1,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => 2,
            Geometry::GeometryCollection(gc) => {
                gc.geometries().map(|g| g.dimension()).max().unwrap_or(-1)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(g) => g.is_empty(),
            Geometry::Line(g) => g.is_empty(),
            Geometry::LinearRing(g) => g.is_empty(),
            Geometry::Polygon(g) => g.is_empty(),
            Geometry::GeometryCollection(g) => g.is_empty(),
            Geometry::MultiPoint(g) => g.is_empty(),
            Geometry::MultiLineString(g) => g.is_empty(),
            Geometry::MultiPolygon(g) => g.is_empty(),
        }
    }

    /// WKT produced by the factory's configured generator.
    pub fn as_text(&self) -> String {
        self.factory().generate_wkt(self)
    }

    /// WKB produced by the factory's configured generator.
    pub fn as_binary(&self) -> Vec<u8> {
        self.factory().generate_wkb(self)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

macro_rules! geometry_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Geometry {
                fn from(g: $variant) -> Self {
                    Geometry::$variant(g)
                }
            }
        )*
    };
}

geometry_from!(
    Point,
    LineString,
    Line,
    LinearRing,
    Polygon,
    GeometryCollection,
    MultiPoint,
    MultiLineString,
    MultiPolygon
);
