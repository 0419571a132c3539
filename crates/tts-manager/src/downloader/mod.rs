//! Downloader module
//!
//! Everything needed to fetch missing assets: configuration, the fetcher
//! trait and its registry, the HTTP backend, progress events, metrics and
//! bounded concurrent batches.

pub mod batch;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod progress;
pub mod registry;

pub use batch::{DownloadSummary, download_handles};
pub use config::{BROWSER_USER_AGENT, DownloadConfig, DownloadConfigBuilder};
pub use error::{DownloadError, FileOperation, Result};
pub use http::HttpFetcher;
pub use metrics::{DownloadMetrics, DownloadMetricsSnapshot};
pub use progress::{
    IntoProgressCallback, NullProgressReporter, ProgressCallback, ProgressEvent, ProgressReporter,
};
pub use registry::{AssetFetcher, FetcherRegistry};

use std::path::PathBuf;

/// Result of a download operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    /// Asset was fetched and written
    Downloaded { path: PathBuf, size: u64 },
    /// Asset was already on disk; nothing was fetched
    AlreadyExists { path: PathBuf },
}

impl DownloadResult {
    pub fn path(&self) -> &std::path::Path {
        match self {
            DownloadResult::Downloaded { path, .. } | DownloadResult::AlreadyExists { path } => path,
        }
    }
}

#[cfg(test)]
mod tests;
