//! Error types for the downloader system with context and recovery information

use std::path::PathBuf;
use thiserror::Error;

/// Errors for a single asset download
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP-related errors with context
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// Network timeout
    #[error("Request to '{url}' timed out after {duration_secs}s (try increasing timeout or check network)")]
    NetworkTimeout { url: String, duration_secs: u64 },

    /// Body shorter than the advertised content length
    #[error("Incomplete response from '{url}': expected {expected} bytes, got {actual}")]
    Truncated {
        url: String,
        expected: u64,
        actual: u64,
    },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// URL parsing errors with helpful suggestions
    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: url::ParseError,
    },

    /// No registered fetcher handles this scheme
    #[error("Unsupported URL scheme in '{url}' (supported: {supported_schemes})")]
    UnsupportedUrl {
        url: String,
        scheme: String,
        supported_schemes: String,
    },

    /// Downloaded image bytes are not in a recognised format
    #[error("Unable to determine image format of '{url}' ({size} bytes)")]
    UnknownImageFormat { url: String, size: usize },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
        suggestion: Option<String>,
    },
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Write,
    Move,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    /// Whether trying the same download later could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            DownloadError::HttpRequest { source, .. } => source
                .status()
                .is_none_or(|status| status.is_server_error() || status.as_u16() == 429),
            DownloadError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            DownloadError::NetworkTimeout { .. } => true,
            DownloadError::Truncated { .. } => true,
            DownloadError::FileSystem { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            DownloadError::InvalidUrl { .. } => false,
            DownloadError::UnsupportedUrl { .. } => false,
            DownloadError::UnknownImageFormat { .. } => false,
            DownloadError::Configuration { .. } => false,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::HttpRequest { .. } => "http_request",
            DownloadError::HttpStatus { .. } => "http_status",
            DownloadError::NetworkTimeout { .. } => "network_timeout",
            DownloadError::Truncated { .. } => "truncated",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::InvalidUrl { .. } => "invalid_url",
            DownloadError::UnsupportedUrl { .. } => "unsupported_url",
            DownloadError::UnknownImageFormat { .. } => "unknown_image_format",
            DownloadError::Configuration { .. } => "configuration",
        }
    }

    /// Invalid URL error with a suggestion matched to the parse failure
    pub fn invalid_url(url: &str, error: url::ParseError) -> Self {
        let suggestion = match error {
            url::ParseError::EmptyHost => "URL must have a valid hostname",
            url::ParseError::InvalidPort => "Port number must be between 1 and 65535",
            url::ParseError::RelativeUrlWithoutBase => {
                "URL must be absolute (include http:// or https://)"
            }
            _ => "Check URL format and try again",
        }
        .to_string();

        DownloadError::InvalidUrl {
            url: url.to_string(),
            suggestion,
            source: error,
        }
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            DownloadError::NetworkTimeout { .. } => {
                Some("Check your internet connection or try increasing the timeout value")
            }
            DownloadError::HttpStatus { status: 404, .. } => {
                Some("The asset has been removed from its host; ask the mod author for a new link")
            }
            DownloadError::InvalidUrl { suggestion, .. } => Some(suggestion),
            DownloadError::UnsupportedUrl { .. } => Some("Use a supported URL scheme (http/https)"),
            DownloadError::UnknownImageFormat { .. } => {
                Some("The host returned something other than an image, often an error page")
            }
            DownloadError::Configuration { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(error: url::ParseError) -> Self {
        DownloadError::invalid_url("<unparseable>", error)
    }
}
