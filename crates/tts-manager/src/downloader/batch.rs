//! Bounded concurrent download of many assets

use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    DownloadResult,
    config::DownloadConfig,
    error::DownloadError,
    metrics::{DownloadMetrics, DownloadMetricsSnapshot},
    progress::{ProgressCallback, ProgressEvent},
    registry::FetcherRegistry,
};
use crate::filesystem::AssetLocator;
use crate::resolve::ResolutionHandle;

/// Outcome of downloading a set of assets
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub attempted: usize,
    pub succeeded: usize,
    /// Every URL that could not be downloaded, with its cause
    pub failed: Vec<(String, DownloadError)>,
    pub metrics: Option<DownloadMetricsSnapshot>,
}

impl DownloadSummary {
    /// True when every attempted download succeeded, including empty batches
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_urls(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|(url, _)| url.as_str())
    }
}

/// Download every handle with at most `config.max_concurrent_downloads` in flight
///
/// Each handle is borrowed by exactly one future. A failure is recorded in
/// the summary and never stops the other downloads.
pub async fn download_handles(
    handles: Vec<&mut ResolutionHandle>,
    registry: &FetcherRegistry,
    locator: &dyn AssetLocator,
    config: &DownloadConfig,
    progress_callback: Option<ProgressCallback>,
) -> DownloadSummary {
    let attempted = handles.len();
    let max_concurrent = config.max_concurrent_downloads.max(1);
    let metrics = DownloadMetrics::default();
    let started = Instant::now();

    debug!(
        "Starting batch download of {} assets with max_concurrent={}",
        attempted, max_concurrent
    );
    if let Some(ref callback) = progress_callback {
        callback(ProgressEvent::BatchStarted { total: attempted });
    }

    let results: Vec<(String, std::result::Result<DownloadResult, DownloadError>)> =
        stream::iter(handles)
            .map(|handle| {
                let progress = progress_callback.clone();
                let metrics = &metrics;
                async move {
                    let url = handle.url().to_string();
                    if let Some(ref callback) = progress {
                        callback(ProgressEvent::DownloadStarted { url: url.clone() });
                    }
                    metrics.record_download_started();

                    let result = handle.try_download(registry, locator).await;
                    match &result {
                        Ok(DownloadResult::Downloaded { path, size }) => {
                            metrics.record_download_completed(*size);
                            if let Some(ref callback) = progress {
                                callback(ProgressEvent::DownloadComplete {
                                    url: url.clone(),
                                    path: path.clone(),
                                    final_size: *size,
                                });
                            }
                        }
                        Ok(DownloadResult::AlreadyExists { path }) => {
                            metrics.record_already_present();
                            if let Some(ref callback) = progress {
                                callback(ProgressEvent::AlreadyPresent {
                                    url: url.clone(),
                                    path: path.clone(),
                                });
                            }
                        }
                        Err(e) => {
                            metrics.record_download_failed();
                            warn!("Failed to download {}: {} [{}]", url, e, e.category());
                            if let Some(ref callback) = progress {
                                callback(ProgressEvent::Error {
                                    url: url.clone(),
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                    (url, result)
                }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let mut summary = DownloadSummary {
        attempted,
        ..DownloadSummary::default()
    };
    for (url, result) in results {
        match result {
            Ok(_) => summary.succeeded += 1,
            Err(e) => summary.failed.push((url, e)),
        }
    }
    summary.failed.sort_by(|a, b| a.0.cmp(&b.0));

    let snapshot = metrics.snapshot();
    info!(
        "Downloaded {}/{} assets ({} bytes, {:.0} average, {:.0}% success) in {:.1}s",
        summary.succeeded,
        attempted,
        snapshot.total_bytes,
        snapshot.average_size(),
        snapshot.success_rate() * 100.0,
        started.elapsed().as_secs_f64()
    );
    summary.metrics = Some(snapshot);

    if let Some(ref callback) = progress_callback {
        callback(ProgressEvent::BatchComplete {
            attempted,
            succeeded: summary.succeeded,
        });
    }
    summary
}
