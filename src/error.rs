//
// Copyright (c) ShuYu Wang <andelf@gmail.com>, Feather Workshop and Pirmin Kalberer. All rights reserved.
//

//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid factory options, e.g. malformed CRS text or projection definition.
    #[error("invalid factory configuration: {0}")]
    Configuration(String),
    /// A geometry construction precondition was violated.
    #[error("invalid geometry structure: {0}")]
    Structural(String),
    /// A codec met input that does not match its grammar or byte layout.
    #[error("{format} parse error at offset {offset}: {message}")]
    Format {
        /// Name of the format being parsed (`WKT`, `WKB`, `WKT-CRS`, ...).
        format: &'static str,
        /// Byte offset into the input where parsing stopped.
        offset: usize,
        /// Human readable description.
        message: String,
    },
    /// Failure rendering or reading a persisted unit.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl Error {
    pub(crate) fn format(format: &'static str, offset: usize, message: impl Into<String>) -> Self {
        Error::Format {
            format,
            offset,
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Error {
        Error::Persistence(format!("binary record: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Persistence(format!("document record: {}", e))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
