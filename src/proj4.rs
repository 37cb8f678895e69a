//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Projection capability backed by [proj4rs](https://docs.rs/proj4rs).
//!
//! Definitions are normalized, then handed to `proj4rs` which rejects unknown
//! projections and malformed parameters. No coordinate transformation is
//! performed.

use crate::crs::{ProjectionCapability, ProjectionDefinition, ProjectionHandle};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct Proj4;

impl Proj4 {
    /// Normalize a definition such as `proj=longlat  +datum=WGS84 +no_defs`
    /// into `+proj=longlat +datum=WGS84 +no_defs`.
    pub fn canonicalize(definition: &str) -> Result<String> {
        let mut params: Vec<(&str, Option<&str>)> = Vec::new();
        for token in definition.split_whitespace() {
            let token = token.trim_start_matches('+');
            if token.is_empty() {
                continue;
            }
            let (key, value) = match token.find('=') {
                Some(idx) => (&token[..idx], Some(&token[idx + 1..])),
                None => (token, None),
            };
            if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Err(Error::Configuration(format!(
                    "invalid proj4 parameter `{}`",
                    token
                )));
            }
            if params.iter().all(|(k, _)| *k != key) {
                params.push((key, value));
            }
        }
        if !params.iter().any(|(k, _)| *k == "proj") {
            return Err(Error::Configuration(format!(
                "proj4 definition `{}` has no +proj",
                definition
            )));
        }
        let canonical = params
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("+{}={}", key, value),
                None => format!("+{}", key),
            })
            .collect::<Vec<_>>()
            .join(" ");
        Ok(canonical)
    }

    /// Canonicalize `definition` and check that `proj4rs` can build a
    /// projection from it.
    pub fn validate(definition: &str) -> Result<String> {
        let canonical = Proj4::canonicalize(definition)?;
        proj4rs::Proj::from_proj_string(&canonical).map_err(|err| {
            Error::Configuration(format!("invalid proj4 definition `{}`: {}", definition, err))
        })?;
        Ok(canonical)
    }
}

impl ProjectionCapability for Proj4 {
    fn parse(&self, definition: &ProjectionDefinition, radians: bool) -> Result<ProjectionHandle> {
        match definition {
            ProjectionDefinition::Text(text) => {
                let canonical = Proj4::validate(text)?;
                Ok(ProjectionHandle::new(Some(text.clone()), canonical, radians))
            }
            ProjectionDefinition::Params(params) => {
                let text = params
                    .iter()
                    .map(|(key, value)| {
                        if value.is_empty() {
                            format!("+{}", key)
                        } else {
                            format!("+{}={}", key, value)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let canonical = Proj4::validate(&text)?;
                Ok(ProjectionHandle::new(None, canonical, radians))
            }
        }
    }
}
