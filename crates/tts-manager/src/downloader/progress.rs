//! Progress tracking and reporting for download operations

use std::path::PathBuf;
use std::sync::Arc;

/// Progress callback for download operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted during download operations
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
    },
    DownloadStarted {
        url: String,
    },
    DownloadComplete {
        url: String,
        path: PathBuf,
        final_size: u64,
    },
    AlreadyPresent {
        url: String,
        path: PathBuf,
    },
    Error {
        url: String,
        error: String,
    },
    BatchComplete {
        attempted: usize,
        succeeded: usize,
    },
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_batch_started(&self, _total: usize) {}
    fn on_download_started(&self, _url: &str) {}
    fn on_download_complete(&self, _url: &str, _path: &std::path::Path, _final_size: u64) {}
    fn on_already_present(&self, _url: &str, _path: &std::path::Path) {}
    fn on_error(&self, _url: &str, _error: &str) {}
    fn on_batch_complete(&self, _attempted: usize, _succeeded: usize) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| match event {
            ProgressEvent::BatchStarted { total } => self.on_batch_started(total),
            ProgressEvent::DownloadStarted { url } => self.on_download_started(&url),
            ProgressEvent::DownloadComplete {
                url,
                path,
                final_size,
            } => self.on_download_complete(&url, &path, final_size),
            ProgressEvent::AlreadyPresent { url, path } => self.on_already_present(&url, &path),
            ProgressEvent::Error { url, error } => self.on_error(&url, &error),
            ProgressEvent::BatchComplete {
                attempted,
                succeeded,
            } => self.on_batch_complete(attempted, succeeded),
        })
    }
}

/// Null progress reporter that does nothing
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}
