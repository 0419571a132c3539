//! Pak archive error types

use std::path::PathBuf;
use thiserror::Error;

use crate::document::DocumentError;

/// Errors raised while writing, reading or extracting a pak
#[derive(Error, Debug)]
pub enum PakError {
    #[error("Unable to find mod pak '{path}'")]
    NotFound { path: PathBuf },

    /// Not a zip, or an entry failed its integrity check
    #[error("Mod pak '{path}' appears corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Missing pak header comment in '{path}'")]
    MissingHeader { path: PathBuf },

    #[error("Invalid pak header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Pak version {version} is newer than the supported version {max}")]
    UnsupportedVersion { version: u32, max: u32 },

    #[error("No document found under '{folder}'")]
    NoDocument { folder: String },

    #[error("{count} documents found under '{folder}', expected exactly one")]
    AmbiguousDocument { folder: String, count: usize },

    /// Document stored in the pre-JSON binary format
    #[error("'{entry}' uses the legacy binary save format, which cannot be imported")]
    LegacyFormat { entry: String },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Zip error on '{path}'")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("I/O error {operation} '{path}'")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PakError>;

impl PakError {
    pub(crate) fn io(path: impl Into<PathBuf>, operation: &'static str) -> impl FnOnce(std::io::Error) -> PakError {
        let path = path.into();
        move |source| PakError::Io {
            path,
            operation,
            source,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            PakError::NotFound { .. } => "not_found",
            PakError::Corrupt { .. } => "corrupt",
            PakError::MissingHeader { .. } => "missing_header",
            PakError::InvalidHeader { .. } => "invalid_header",
            PakError::UnsupportedVersion { .. } => "unsupported_version",
            PakError::NoDocument { .. } => "no_document",
            PakError::AmbiguousDocument { .. } => "ambiguous_document",
            PakError::LegacyFormat { .. } => "legacy_format",
            PakError::Document(_) => "document",
            PakError::Zip { .. } => "zip",
            PakError::Io { .. } => "io",
        }
    }
}
