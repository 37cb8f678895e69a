//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Coordinate reference system support.
//!
//! A factory's CRS is assembled from up to three sources: an explicit
//! projection definition, explicit WKT-CRS text, and a [`SrsCatalog`] lookup by
//! SRID. Projection parsing is delegated to a [`ProjectionCapability`]; when no
//! capability is installed the projection silently resolves to `None`.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::srs::SrsCatalog;

// --- WKT-CRS tree

/// One bracketed element of a WKT-CRS definition, e.g. `AUTHORITY["EPSG","4326"]`.
#[derive(PartialEq, Clone, Debug)]
pub struct WktNode {
    pub keyword: String,
    pub args: Vec<WktValue>,
}

#[derive(PartialEq, Clone, Debug)]
pub enum WktValue {
    Text(String),
    /// Numbers keep their source spelling so re-rendering is lossless.
    Number(String),
    /// Bare enumeration values such as `NORTH` or `EAST`.
    Keyword(String),
    Node(WktNode),
}

impl WktNode {
    /// First direct child node with the given keyword.
    pub fn child(&self, keyword: &str) -> Option<&WktNode> {
        self.args.iter().find_map(|arg| match arg {
            WktValue::Node(node) if node.keyword.eq_ignore_ascii_case(keyword) => Some(node),
            _ => None,
        })
    }

    fn text_arg(&self, index: usize) -> Option<&str> {
        match self.args.get(index) {
            Some(WktValue::Text(s)) | Some(WktValue::Number(s)) => Some(s),
            _ => None,
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.keyword);
        out.push('[');
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match arg {
                WktValue::Text(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
                WktValue::Number(s) | WktValue::Keyword(s) => out.push_str(s),
                WktValue::Node(node) => node.render(out),
            }
        }
        out.push(']');
    }
}

const CRS_KEYWORDS: &[&str] = &[
    "GEOGCS", "PROJCS", "GEOCCS", "VERT_CS", "LOCAL_CS", "COMPD_CS", "FITTED_CS", "GEOGCRS",
    "GEODCRS", "GEODETICCRS", "GEOGRAPHICCRS", "PROJCRS", "PROJECTEDCRS", "VERTCRS",
    "VERTICALCRS", "COMPOUNDCRS", "ENGCRS", "ENGINEERINGCRS", "BOUNDCRS",
];

/// A coordinate system parsed from WKT-CRS text.
#[derive(PartialEq, Clone, Debug)]
pub struct CoordinateSystem {
    root: WktNode,
}

impl CoordinateSystem {
    /// Parse WKT-CRS text (WKT1 or WKT2 keywords).
    pub fn from_wkt(text: &str) -> Result<Self> {
        let mut parser = CrsParser {
            input: text.as_bytes(),
            pos: 0,
        };
        let root = parser.parse_node()?;
        parser.skip_ws();
        if parser.pos < parser.input.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        let known = CRS_KEYWORDS
            .iter()
            .any(|k| root.keyword.eq_ignore_ascii_case(k));
        if !known {
            return Err(Error::Configuration(format!(
                "WKT-CRS root `{}` is not a coordinate system",
                root.keyword
            )));
        }
        Ok(CoordinateSystem { root })
    }

    /// Root keyword, e.g. `GEOGCS` or `PROJCRS`.
    pub fn kind(&self) -> &str {
        &self.root.keyword
    }

    pub fn name(&self) -> Option<&str> {
        self.root.text_arg(0)
    }

    /// `(authority, code)` from the top level `AUTHORITY[..]` or `ID[..]` element.
    pub fn authority(&self) -> Option<(&str, &str)> {
        let node = self
            .root
            .child("AUTHORITY")
            .or_else(|| self.root.child("ID"))?;
        Some((node.text_arg(0)?, node.text_arg(1)?))
    }

    pub fn authority_code(&self) -> Option<i32> {
        self.authority()
            .and_then(|(_, code)| code.trim().parse::<i32>().ok())
    }

    pub fn root(&self) -> &WktNode {
        &self.root
    }

    /// Canonical WKT rendering: square brackets, no whitespace between elements.
    pub fn to_wkt(&self) -> String {
        let mut out = String::new();
        self.root.render(&mut out);
        out
    }
}

impl FromStr for CoordinateSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CoordinateSystem::from_wkt(s)
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

struct CrsParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> CrsParser<'a> {
    fn error(&self, message: &str) -> Error {
        Error::Configuration(format!(
            "malformed WKT-CRS at offset {}: {}",
            self.pos, message
        ))
    }

    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.input.get(self.pos).copied()
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.input.len()
            && (self.input[self.pos].is_ascii_alphanumeric() || self.input[self.pos] == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected keyword"));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_node(&mut self) -> Result<WktNode> {
        let keyword = self.identifier()?;
        let close = match self.peek() {
            Some(b'[') => b']',
            Some(b'(') => b')',
            _ => return Err(self.error("expected `[` or `(`")),
        };
        self.pos += 1;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_value()?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected `,` or closing bracket")),
            }
        }
        Ok(WktNode { keyword, args })
    }

    fn parse_value(&mut self) -> Result<WktValue> {
        match self.peek() {
            Some(b'"') => {
                self.pos += 1;
                let mut text = Vec::new();
                loop {
                    match self.input.get(self.pos) {
                        None => return Err(self.error("unterminated string")),
                        Some(b'"') if self.input.get(self.pos + 1) == Some(&b'"') => {
                            text.push(b'"');
                            self.pos += 2;
                        }
                        Some(b'"') => {
                            self.pos += 1;
                            break;
                        }
                        Some(&c) => {
                            text.push(c);
                            self.pos += 1;
                        }
                    }
                }
                Ok(WktValue::Text(String::from_utf8_lossy(&text).into_owned()))
            }
            Some(c) if c == b'-' || c == b'+' || c == b'.' || c.is_ascii_digit() => {
                let start = self.pos;
                while self.pos < self.input.len()
                    && matches!(
                        self.input[self.pos],
                        b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'
                    )
                {
                    self.pos += 1;
                }
                let number = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                if number.parse::<f64>().is_err() {
                    self.pos = start;
                    return Err(self.error("invalid number"));
                }
                Ok(WktValue::Number(number))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                let word = self.identifier()?;
                match self.peek() {
                    Some(b'[') | Some(b'(') => {
                        self.pos = start;
                        Ok(WktValue::Node(self.parse_node()?))
                    }
                    _ => Ok(WktValue::Keyword(word)),
                }
            }
            _ => Err(self.error("expected value")),
        }
    }
}

// --- Projection capability

/// Raw projection definition as handed to a [`ProjectionCapability`].
#[derive(PartialEq, Clone, Debug)]
pub enum ProjectionDefinition {
    Text(String),
    Params(BTreeMap<String, String>),
}

impl From<&str> for ProjectionDefinition {
    fn from(s: &str) -> Self {
        ProjectionDefinition::Text(s.to_string())
    }
}

impl From<String> for ProjectionDefinition {
    fn from(s: String) -> Self {
        ProjectionDefinition::Text(s)
    }
}

impl From<BTreeMap<String, String>> for ProjectionDefinition {
    fn from(params: BTreeMap<String, String>) -> Self {
        ProjectionDefinition::Params(params)
    }
}

/// Opaque projection produced by a [`ProjectionCapability`].
///
/// Two handles are equal when their canonical definitions and angular units match.
#[derive(Clone, Debug)]
pub struct ProjectionHandle {
    original: Option<String>,
    canonical: String,
    radians: bool,
}

impl ProjectionHandle {
    pub fn new(original: Option<String>, canonical: String, radians: bool) -> Self {
        ProjectionHandle {
            original,
            canonical,
            radians,
        }
    }

    /// The definition exactly as supplied, if it was supplied as text.
    pub fn original_str(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn canonical_str(&self) -> &str {
        &self.canonical
    }

    /// Whether geographic coordinates are expressed in radians instead of degrees.
    pub fn is_radians(&self) -> bool {
        self.radians
    }

    /// Text that recreates this handle: the original definition when known.
    pub fn definition(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.canonical)
    }
}

impl PartialEq for ProjectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical && self.radians == other.radians
    }
}

impl Eq for ProjectionHandle {}

impl Hash for ProjectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
        self.radians.hash(state);
    }
}

/// Pluggable projection backend. Absence of a backend is never an error.
pub trait ProjectionCapability: fmt::Debug + Send + Sync {
    fn parse(&self, definition: &ProjectionDefinition, radians: bool) -> Result<ProjectionHandle>;
}

/// Optional collaborators used while resolving a factory's CRS.
#[derive(Clone, Debug)]
pub struct Capabilities {
    pub projection: Option<Arc<dyn ProjectionCapability>>,
    pub catalog: Option<Arc<dyn SrsCatalog>>,
}

impl Capabilities {
    /// No projection backend and no catalog.
    pub fn none() -> Self {
        Capabilities {
            projection: None,
            catalog: None,
        }
    }

    pub fn with_projection(mut self, capability: Arc<dyn ProjectionCapability>) -> Self {
        self.projection = Some(capability);
        self
    }

    pub fn without_projection(mut self) -> Self {
        self.projection = None;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn SrsCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn without_catalog(mut self) -> Self {
        self.catalog = None;
        self
    }
}

impl Default for Capabilities {
    /// The built-in proj4 backend when the `proj4` feature is enabled, no catalog.
    fn default() -> Self {
        #[cfg(feature = "proj4")]
        let projection: Option<Arc<dyn ProjectionCapability>> = Some(Arc::new(crate::proj4::Proj4));
        #[cfg(not(feature = "proj4"))]
        let projection: Option<Arc<dyn ProjectionCapability>> = None;
        Capabilities {
            projection,
            catalog: None,
        }
    }
}

// --- Resolution

#[derive(Clone, Debug)]
pub(crate) enum ProjectionInput {
    Definition(ProjectionDefinition, bool),
    Handle(ProjectionHandle),
}

#[derive(Clone, Debug)]
pub(crate) enum CoordSysInput {
    Wkt(String),
    Parsed(CoordinateSystem),
}

pub(crate) struct ResolvedCrs {
    pub projection: Option<ProjectionHandle>,
    pub coord_sys: Option<CoordinateSystem>,
    pub srid: i32,
}

/// Resolve projection, coordinate system and SRID. An explicit SRID always wins
/// over the authority code of the coordinate system.
pub(crate) fn resolve(
    projection: Option<&ProjectionInput>,
    coord_sys: Option<&CoordSysInput>,
    srid: Option<i32>,
    capabilities: &Capabilities,
) -> Result<ResolvedCrs> {
    let mut projection = match projection {
        Some(ProjectionInput::Handle(handle)) => Some(handle.clone()),
        Some(ProjectionInput::Definition(definition, radians)) => match &capabilities.projection {
            Some(capability) => Some(capability.parse(definition, *radians)?),
            None => {
                debug!("no projection capability installed, ignoring projection definition");
                None
            }
        },
        None => None,
    };
    let mut coord_sys = match coord_sys {
        Some(CoordSysInput::Wkt(text)) => Some(CoordinateSystem::from_wkt(text)?),
        Some(CoordSysInput::Parsed(cs)) => Some(cs.clone()),
        None => None,
    };

    if projection.is_none() || coord_sys.is_none() {
        if let (Some(srid), Some(catalog)) = (srid, &capabilities.catalog) {
            match catalog.get(srid) {
                Some(entry) => {
                    if projection.is_none() {
                        projection = entry.projection;
                    }
                    if coord_sys.is_none() {
                        coord_sys = entry.coord_sys;
                    }
                }
                None => debug!("srid {} not found in catalog", srid),
            }
        }
    }

    let srid = srid
        .or_else(|| coord_sys.as_ref().and_then(|cs| cs.authority_code()))
        .unwrap_or(0);

    Ok(ResolvedCrs {
        projection,
        coord_sys,
        srid,
    })
}

#[cfg(test)]
pub(crate) const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;
