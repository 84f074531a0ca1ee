//! Custom error types for patchprep.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the patchprep library.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or inconsistent configuration value.
    #[error("invalid configuration field {field}: {reason}")]
    Configuration { field: String, reason: String },

    /// Failed to read or parse a configuration file.
    #[error("failed to read configuration from {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },

    /// Failed to decode an image file.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to encode or write an image file.
    #[error("failed to encode image to {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to create an output file or directory.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pixel array does not have the expected shape.
    #[error("invalid image shape: expected {expected}, got {actual}")]
    InvalidImage { expected: String, actual: String },

    /// Not enough non-overlapping grid cells for the requested samples.
    #[error("insufficient area: {available} grid cells available, {requested} samples requested")]
    InsufficientArea { available: usize, requested: usize },

    /// Path does not match the expected input-root/extension shape.
    #[error("unexpected path {path}: {reason}")]
    PathFormat { path: PathBuf, reason: String },

    /// Failed to traverse the input directory.
    #[error("failed to list {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl Error {
    /// Shorthand for a [`Error::Configuration`] on `field`.
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for patchprep operations.
pub type Result<T> = std::result::Result<T, Error>;
