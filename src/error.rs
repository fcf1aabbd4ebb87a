//! Error types for Coronaview.
//!
//! This module provides a unified error handling approach using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Coronaview operations.
pub type Result<T> = std::result::Result<T, CoronaError>;

/// Errors that can occur in Coronaview.
#[derive(Debug, Error)]
pub enum CoronaError {
    /// A precondition on an input was violated (degenerate table size,
    /// zero-range image, out-of-bounds frame, inverted window, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Palette name not present in the registry.
    #[error("Unknown palette: {name}")]
    UnknownPalette { name: String },

    /// Failed to open a file.
    #[error("Failed to open file: {path}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read NetCDF file.
    #[error("NetCDF error: {0}")]
    NetCDF(String),

    /// Failed to encode an output frame.
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to serialize a payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoronaError {
    /// Create an InvalidArgument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an UnknownPalette error.
    pub fn unknown_palette(name: impl Into<String>) -> Self {
        Self::UnknownPalette { name: name.into() }
    }

    /// Create a FileOpen error.
    pub fn file_open(path: PathBuf, source: std::io::Error) -> Self {
        Self::FileOpen { path, source }
    }

    /// Whether this error is a rejected precondition rather than an I/O failure.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<netcdf::Error> for CoronaError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCDF(err.to_string())
    }
}
