//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Spatial reference system catalogs, looked up by numeric SRID.

use std::collections::HashMap;
use std::fmt;

use crate::crs::{CoordinateSystem, ProjectionCapability, ProjectionHandle};
use crate::error::Result;

/// A catalog entry. Either half of the CRS may be missing.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct SrsEntry {
    /// Authority-qualified identifier, e.g. `EPSG:4326`.
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub coord_sys: Option<CoordinateSystem>,
    pub projection: Option<ProjectionHandle>,
}

/// Synchronous lookup of CRS definitions by SRID.
pub trait SrsCatalog: fmt::Debug + Send + Sync {
    fn get(&self, srid: i32) -> Option<SrsEntry>;
}

/// In-memory catalog.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    entries: HashMap<i32, SrsEntry>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, srid: i32, entry: SrsEntry) -> Option<SrsEntry> {
        self.entries.insert(srid, entry)
    }

    /// Add an entry from textual definitions. The proj4 text is parsed only
    /// when a projection capability is given.
    pub fn insert_definition(
        &mut self,
        srid: i32,
        name: &str,
        coord_sys_wkt: Option<&str>,
        proj4: Option<&str>,
        capability: Option<&dyn ProjectionCapability>,
    ) -> Result<()> {
        let coord_sys = coord_sys_wkt.map(CoordinateSystem::from_wkt).transpose()?;
        let projection = match (proj4, capability) {
            (Some(text), Some(capability)) => Some(capability.parse(&text.into(), false)?),
            _ => None,
        };
        let identifier = coord_sys
            .as_ref()
            .and_then(|cs| cs.authority().map(|(auth, code)| format!("{}:{}", auth, code)))
            .unwrap_or_else(|| format!("SRID:{}", srid));
        self.insert(
            srid,
            SrsEntry {
                identifier,
                name: name.to_string(),
                description: None,
                coord_sys,
                projection,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SrsCatalog for MemoryCatalog {
    fn get(&self, srid: i32) -> Option<SrsEntry> {
        self.entries.get(&srid).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::WGS84_WKT;

    #[test]
    fn insert_and_lookup() {
        let mut catalog = MemoryCatalog::new();
        assert!(catalog.is_empty());
        catalog
            .insert_definition(4326, "WGS 84", Some(WGS84_WKT), Some("+proj=longlat"), None)
            .unwrap();
        let entry = catalog.get(4326).unwrap();
        assert_eq!(entry.identifier, "EPSG:4326");
        assert_eq!(entry.name, "WGS 84");
        assert!(entry.coord_sys.is_some());
        // no capability, no projection
        assert!(entry.projection.is_none());
        assert!(catalog.get(3857).is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[cfg(feature = "proj4")]
    #[test]
    fn insert_with_projection() {
        let mut catalog = MemoryCatalog::new();
        let merc = "+proj=merc +a=6378137 +b=6378137";
        catalog
            .insert_definition(3857, "Web Mercator", None, Some(merc), Some(&crate::proj4::Proj4))
            .unwrap();
        let entry = catalog.get(3857).unwrap();
        assert_eq!(entry.identifier, "SRID:3857");
        assert_eq!(entry.projection.unwrap().canonical_str(), merc);
    }
}
