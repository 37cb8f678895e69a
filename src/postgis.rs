//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! `ToSql`/`FromSql` for PostGIS `geometry` and `geography` columns.
//!
//! Values are written as little-endian EWKB, with the SRID flag when the
//! geometry's SRID is not 0. Values read from the database get a fresh factory
//! matching the SRID and dimensions found in the EWKB header.

use std::error::Error as StdError;

use bytes::BytesMut;
use postgres_types::{to_sql_checked, FromSql, IsNull, ToSql, Type};

use crate::ewkb::{WkbGenerator, WkbGeneratorConfig, WkbHeader, WkbTypeFormat};
use crate::factory::Factory;
use crate::geometry::Geometry;

macro_rules! accepts_geography {
    () => {
        fn accepts(ty: &Type) -> bool {
            matches!(ty.name(), "geography" | "geometry")
        }
    };
}

impl ToSql for Geometry {
    fn to_sql(
        &self,
        _: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let generator = WkbGenerator::new(WkbGeneratorConfig {
            type_format: WkbTypeFormat::Ewkb,
            emit_ewkb_srid: self.srid() != 0,
            little_endian: true,
        });
        out.extend_from_slice(&generator.generate(self));
        Ok(IsNull::No)
    }

    accepts_geography!();
    to_sql_checked!();
}

impl<'a> FromSql<'a> for Geometry {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Geometry, Box<dyn StdError + Sync + Send>> {
        let header = WkbHeader::peek(raw)?;
        let factory = Factory::builder()
            .srid(header.srid.unwrap_or(0))
            .has_z(header.has_z)
            .has_m(header.has_m)
            .build()?;
        Ok(factory.parse_wkb(raw)?)
    }

    accepts_geography!();
}
