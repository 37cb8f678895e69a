//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Simple-feature geometry values with WKT and WKB codecs.
//!
//! - A [`Factory`] fixes SRID, Z/M support, coordinate system and projection
//! - Geometry values (points, line strings, polygons, collections) built by it
//! - WKT (1.1, EWKT, 1.2) and WKB (EWKB, ISO 1.2) readers and writers
//! - CRS resolution through a pluggable projection capability and SRS catalog
//! - Binary and JSON persistence of a geometry with its factory
//! - PostGIS `geometry`/`geography` column support
//!
//! ```rust
//! use wkgeom::{Factory, Geometry};
//!
//! let factory = Factory::builder().srid(4326).build().unwrap();
//! let geom = factory.parse_wkt("POINT (10 -20)").unwrap();
//! assert_eq!(geom.srid(), 4326);
//! assert_eq!(
//!     factory.wkb_generator().generate_hex(&geom),
//!     "0101000000000000000000244000000000000034C0"
//! );
//! if let Geometry::Point(p) = geom {
//!     assert_eq!((p.x(), p.y()), (10.0, -20.0));
//! }
//! ```
//!
//! With PostGIS:
//!
//! ```rust,no_run
//! use postgres::{Client, NoTls};
//! use wkgeom::Geometry;
//!
//! let mut client = Client::connect("host=localhost user=postgres", NoTls).unwrap();
//! for row in &client.query("SELECT route FROM busline", &[]).unwrap() {
//!     let route: Geometry = row.get("route");
//!     println!("{} (srid {})", route, route.srid());
//! }
//! ```

pub mod crs;
pub mod envelope;
pub mod error;
pub mod ewkb;
mod factory;
mod geometry;
mod postgis;
#[cfg(feature = "proj4")]
pub mod proj4;
pub mod srs;
mod types;
pub mod wkt;

pub use crs::{
    Capabilities, CoordinateSystem, ProjectionCapability, ProjectionDefinition, ProjectionHandle,
};
pub use error::{Error, Result};
pub use ewkb::{WkbGeneratorConfig, WkbParserConfig, WkbTypeFormat};
pub use factory::{Factory, FactoryBuilder, Property};
pub use geometry::{
    Geometry, GeometryCollection, Line, LineString, LinearRing, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
pub use srs::{MemoryCatalog, SrsCatalog, SrsEntry};
pub use types::{Coord, Dimensions, GeometryType};
pub use wkt::{ConvertCase, WktGeneratorConfig, WktParserConfig, WktTagFormat};
