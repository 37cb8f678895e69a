//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Persistence of a geometry together with the configuration of its factory.
//!
//! A persisted unit holds a [`FactoryRecord`] and a companion encoding of the
//! geometry. Two formats are provided:
//!
//! - [`Binary`]: bincode, geometry as little-endian WKB 1.2 with the SRID flag
//! - [`Document`]: JSON, geometry as WKT 1.2 text with an EWKT `SRID=` prefix
//!
//! ```rust
//! use wkgeom::{envelope, Capabilities, Factory};
//!
//! let factory = Factory::builder().srid(4326).build().unwrap();
//! let point = factory.point(10.0, -20.0).into();
//! let json = envelope::to_json(&point).unwrap();
//! let back = envelope::from_json(&json, &Capabilities::default()).unwrap();
//! assert_eq!(back, point);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crs::{Capabilities, CoordinateSystem};
use crate::error::Result;
use crate::ewkb::{WkbGenerator, WkbGeneratorConfig, WkbParser, WkbParserConfig, WkbTypeFormat};
use crate::factory::Factory;
use crate::geometry::Geometry;
use crate::wkt::{WktGenerator, WktGeneratorConfig, WktParser, WktParserConfig, WktTagFormat};

/// Projection part of a [`FactoryRecord`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ProjectionRecord {
    pub definition: String,
    pub radians: bool,
}

/// Serializable snapshot of a factory configuration.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct FactoryRecord {
    pub has_z: bool,
    pub has_m: bool,
    pub srid: i32,
    pub buffer_resolution: i32,
    pub wkt_generator: WktGeneratorConfig,
    pub wkb_generator: WkbGeneratorConfig,
    pub wkt_parser: WktParserConfig,
    pub wkb_parser: WkbParserConfig,
    pub projection: Option<ProjectionRecord>,
    /// Canonical WKT of the coordinate system.
    pub coord_sys: Option<String>,
}

impl Factory {
    pub fn to_record(&self) -> FactoryRecord {
        FactoryRecord {
            has_z: self.has_z(),
            has_m: self.has_m(),
            srid: self.srid(),
            buffer_resolution: self.buffer_resolution(),
            wkt_generator: self.wkt_generator_config().clone(),
            wkb_generator: self.wkb_generator_config().clone(),
            wkt_parser: self.wkt_parser_config().clone(),
            wkb_parser: self.wkb_parser_config().clone(),
            projection: self.projection().map(|p| ProjectionRecord {
                definition: p.definition().to_string(),
                radians: p.is_radians(),
            }),
            coord_sys: self.coord_sys().map(CoordinateSystem::to_wkt),
        }
    }

    /// Rebuild a factory from a record. The projection is parsed again with
    /// the given capabilities; without a projection capability it is dropped.
    ///
    /// The record is complete, so the SRS catalog is never consulted: a CRS
    /// the record does not carry stays absent.
    pub fn from_record(record: FactoryRecord, capabilities: &Capabilities) -> Result<Factory> {
        let mut builder = Factory::builder()
            .has_z(record.has_z)
            .has_m(record.has_m)
            .srid(record.srid)
            .buffer_resolution(record.buffer_resolution)
            .capabilities(capabilities.clone().without_catalog())
            .wkt_generator(record.wkt_generator)
            .wkb_generator(record.wkb_generator)
            .wkt_parser(record.wkt_parser)
            .wkb_parser(record.wkb_parser);
        if let Some(projection) = record.projection {
            builder = builder.projection_definition(projection.definition, projection.radians);
        }
        if let Some(coord_sys) = record.coord_sys {
            builder = builder.coord_sys_wkt(coord_sys);
        }
        builder.build()
    }
}

/// A persisted (factory, geometry) pair.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Persisted<C> {
    pub factory: FactoryRecord,
    pub geometry: C,
}

/// Format specific half of the envelope.
pub trait PersistFormat {
    /// Encoded geometry stored next to the factory record.
    type Companion: Serialize + DeserializeOwned;
    type Output;
    type Input: ?Sized;

    fn companion(geometry: &Geometry) -> Self::Companion;
    fn restore(factory: &Factory, companion: Self::Companion) -> Result<Geometry>;
    fn write(unit: &Persisted<Self::Companion>) -> Result<Self::Output>;
    fn read(input: &Self::Input) -> Result<Persisted<Self::Companion>>;
}

/// WKB bytes, serialized as a byte string.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct WkbBytes(#[serde(with = "serde_bytes")] pub Vec<u8>);

/// bincode with a WKB companion.
#[derive(Debug, Clone, Copy)]
pub struct Binary;

impl PersistFormat for Binary {
    type Companion = WkbBytes;
    type Output = Vec<u8>;
    type Input = [u8];

    fn companion(geometry: &Geometry) -> WkbBytes {
        let generator = WkbGenerator::new(WkbGeneratorConfig {
            type_format: WkbTypeFormat::Wkb12,
            emit_ewkb_srid: true,
            little_endian: true,
        });
        WkbBytes(generator.generate(geometry))
    }

    fn restore(factory: &Factory, companion: WkbBytes) -> Result<Geometry> {
        WkbParser::new(factory.clone(), WkbParserConfig::default()).parse(&companion.0)
    }

    fn write(unit: &Persisted<WkbBytes>) -> Result<Vec<u8>> {
        Ok(bincode::serialize(unit)?)
    }

    fn read(input: &[u8]) -> Result<Persisted<WkbBytes>> {
        Ok(bincode::deserialize(input)?)
    }
}

/// JSON with a WKT companion.
#[derive(Debug, Clone, Copy)]
pub struct Document;

impl PersistFormat for Document {
    type Companion = String;
    type Output = String;
    type Input = str;

    fn companion(geometry: &Geometry) -> String {
        let generator = WktGenerator::new(WktGeneratorConfig {
            tag_format: WktTagFormat::Wkt12,
            emit_ewkt_srid: true,
            ..Default::default()
        });
        generator.generate(geometry)
    }

    fn restore(factory: &Factory, companion: String) -> Result<Geometry> {
        WktParser::new(factory.clone(), WktParserConfig::default()).parse(&companion)
    }

    fn write(unit: &Persisted<String>) -> Result<String> {
        Ok(serde_json::to_string(unit)?)
    }

    fn read(input: &str) -> Result<Persisted<String>> {
        Ok(serde_json::from_str(input)?)
    }
}

pub fn encode<F: PersistFormat>(geometry: &Geometry) -> Result<F::Output> {
    let unit = Persisted {
        factory: geometry.factory().to_record(),
        geometry: F::companion(geometry),
    };
    F::write(&unit)
}

pub fn decode<F: PersistFormat>(input: &F::Input, capabilities: &Capabilities) -> Result<Geometry> {
    let unit = F::read(input)?;
    let factory = Factory::from_record(unit.factory, capabilities)?;
    F::restore(&factory, unit.geometry)
}

pub fn to_bytes(geometry: &Geometry) -> Result<Vec<u8>> {
    encode::<Binary>(geometry)
}

pub fn from_bytes(bytes: &[u8], capabilities: &Capabilities) -> Result<Geometry> {
    decode::<Binary>(bytes, capabilities)
}

pub fn to_json(geometry: &Geometry) -> Result<String> {
    encode::<Document>(geometry)
}

pub fn from_json(json: &str, capabilities: &Capabilities) -> Result<Geometry> {
    decode::<Document>(json, capabilities)
}
