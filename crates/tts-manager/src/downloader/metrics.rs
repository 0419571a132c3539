//! Download statistics shared across concurrent downloads

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by every download in a batch
#[derive(Debug, Default)]
pub struct DownloadMetrics {
    pub total_bytes: AtomicU64,
    pub total_downloads: AtomicU64,
    pub successful_downloads: AtomicU64,
    pub failed_downloads: AtomicU64,
    /// Assets that turned out to be on disk already
    pub already_present: AtomicU64,
}

impl DownloadMetrics {
    pub fn record_download_started(&self) {
        self.total_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download_completed(&self, size: u64) {
        self.successful_downloads.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_download_failed(&self) {
        self.failed_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_already_present(&self) {
        self.already_present.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> DownloadMetricsSnapshot {
        DownloadMetricsSnapshot {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            total_downloads: self.total_downloads.load(Ordering::Relaxed),
            successful_downloads: self.successful_downloads.load(Ordering::Relaxed),
            failed_downloads: self.failed_downloads.load(Ordering::Relaxed),
            already_present: self.already_present.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadMetricsSnapshot {
    pub total_bytes: u64,
    pub total_downloads: u64,
    pub successful_downloads: u64,
    pub failed_downloads: u64,
    pub already_present: u64,
}

impl DownloadMetricsSnapshot {
    /// Successful downloads as a fraction of attempts (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_downloads == 0 {
            0.0
        } else {
            self.successful_downloads as f64 / self.total_downloads as f64
        }
    }

    pub fn average_size(&self) -> f64 {
        if self.successful_downloads == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.successful_downloads as f64
        }
    }
}
