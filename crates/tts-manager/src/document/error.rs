//! Document loading error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or decoding a mod document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document file could not be read from disk
    #[error("Unable to read document '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document content is not valid JSON
    #[error("Document is not valid JSON: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// The document parsed, but its root is not a JSON object
    #[error("Document root must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Unrecognised save type name
    #[error("Unknown save type '{0}' (expected workshop, save or chest)")]
    UnknownSaveType(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

impl DocumentError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DocumentError::Read { .. } => "read",
            DocumentError::Parse { .. } => "parse",
            DocumentError::NotAnObject { .. } => "not_an_object",
            DocumentError::UnknownSaveType(_) => "unknown_save_type",
        }
    }
}
