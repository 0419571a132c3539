//! Unit tests for the downloader module

use super::*;
use crate::document::AssetCategory;
use crate::filesystem::FileSystem;
use crate::resolve::ResolutionHandle;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";

/// Helper struct to capture progress events during testing
#[derive(Debug, Default)]
struct ProgressCapture {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressCapture {
    fn get_callback(&self) -> ProgressCallback {
        let events = self.events.clone();
        Arc::new(move |event| {
            events.lock().unwrap().push(event);
        })
    }

    fn count(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(*e)).count()
    }
}

fn setup() -> (TempDir, FileSystem, FetcherRegistry) {
    let dir = tempdir().unwrap();
    let fs = FileSystem::new(dir.path());
    let registry = FetcherRegistry::http(&DownloadConfig::default()).unwrap();
    (dir, fs, registry)
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
        assert_eq!(config.max_concurrent_downloads, 4);
    }

    #[test]
    fn test_builder_rejects_zero_workers() {
        let err = DownloadConfig::builder()
            .max_concurrent_downloads(0)
            .build()
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
        assert!(err.suggestion().is_some());

        let config = DownloadConfig::builder()
            .timeout(Duration::from_secs(5))
            .max_concurrent_downloads(2)
            .build()
            .unwrap();
        assert_eq!(config.max_concurrent_downloads, 2);
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let not_found = DownloadError::HttpStatus {
            url: "http://x".to_string(),
            status: 404,
        };
        assert!(!not_found.is_recoverable());
        assert!(not_found.suggestion().is_some());

        let unavailable = DownloadError::HttpStatus {
            url: "http://x".to_string(),
            status: 503,
        };
        assert!(unavailable.is_recoverable());

        let timeout = DownloadError::NetworkTimeout {
            url: "http://x".to_string(),
            duration_secs: 30,
        };
        assert!(timeout.is_recoverable());
        assert_eq!(timeout.category(), "network_timeout");
    }

    #[test]
    fn test_invalid_url_suggestion() {
        let err = DownloadError::invalid_url("http://", url::ParseError::EmptyHost);
        assert_eq!(err.suggestion(), Some("URL must have a valid hostname"));
        assert!(err.to_string().contains("http://"));
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_ftp_is_unsupported() {
        let (_dir, _fs, registry) = setup();

        let err = registry.find_fetcher("ftp://files.example/model.obj").err().unwrap();
        match err {
            DownloadError::UnsupportedUrl {
                scheme,
                supported_schemes,
                ..
            } => {
                assert_eq!(scheme, "ftp");
                assert_eq!(supported_schemes, "http, https");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = FetcherRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find_fetcher("http://a/b").is_err());
    }
}

#[cfg(test)]
mod download_tests {
    use super::*;

    #[tokio::test]
    async fn test_jpeg_saved_as_jpg() {
        let server = MockServer::start().await;
        serve(&server, "/cards/back", 200, JPEG_BYTES).await;
        let (_dir, fs, registry) = setup();

        let url = format!("{}/cards/back", server.uri());
        let mut handle = ResolutionHandle::new(url, AssetCategory::Image);
        let result = handle.try_download(&registry, &fs).await.unwrap();

        let expected = fs.get_image_path(&format!("{}.jpg", handle.stem()));
        assert_eq!(
            result,
            DownloadResult::Downloaded {
                path: expected.clone(),
                size: JPEG_BYTES.len() as u64
            }
        );
        assert_eq!(std::fs::read(&expected).unwrap(), JPEG_BYTES);
        assert_eq!(handle.location(&fs), Some(expected.as_path()));
    }

    #[tokio::test]
    async fn test_model_uses_fixed_extension() {
        let server = MockServer::start().await;
        serve(&server, "/mesh", 200, b"v 0 0 0\nf 1 1 1\n").await;
        let (_dir, fs, registry) = setup();

        let mut handle = ResolutionHandle::new(format!("{}/mesh", server.uri()), AssetCategory::Model);
        assert!(handle.download(&registry, &fs).await);

        let expected = fs.get_model_path(&format!("{}.obj", handle.stem()));
        assert!(expected.is_file());
        assert!(handle.is_present(&fs));
    }

    #[tokio::test]
    async fn test_http_404_leaves_no_file() {
        let server = MockServer::start().await;
        serve(&server, "/gone.png", 404, b"not found").await;
        let (_dir, fs, registry) = setup();

        let mut handle =
            ResolutionHandle::new(format!("{}/gone.png", server.uri()), AssetCategory::Image);
        assert!(!handle.download(&registry, &fs).await);
        assert!(!handle.is_present(&fs));
        assert!(!fs.category_path(AssetCategory::Image).exists());

        let err = handle.try_download(&registry, &fs).await.unwrap_err();
        assert!(matches!(err, DownloadError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_unknown_image_content_fails() {
        let server = MockServer::start().await;
        serve(&server, "/page", 200, b"<html>login required</html>").await;
        let (_dir, fs, registry) = setup();

        let mut handle = ResolutionHandle::new(format!("{}/page", server.uri()), AssetCategory::Image);
        let err = handle.try_download(&registry, &fs).await.unwrap_err();
        assert_eq!(err.category(), "unknown_image_format");
        assert!(!fs.category_path(AssetCategory::Image).exists());
    }

    #[tokio::test]
    async fn test_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ua.png"))
            .and(header("user-agent", BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES.to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        let (_dir, fs, registry) = setup();

        let mut handle = ResolutionHandle::new(format!("{}/ua.png", server.uri()), AssetCategory::Image);
        assert!(handle.download(&registry, &fs).await);
    }

    #[tokio::test]
    async fn test_missing_scheme_assumes_http() {
        let server = MockServer::start().await;
        serve(&server, "/bare.png", 200, PNG_BYTES).await;
        let (_dir, fs, registry) = setup();

        let bare = format!("{}/bare.png", server.uri().trim_start_matches("http://"));
        let mut handle = ResolutionHandle::new(bare, AssetCategory::Image);
        assert!(handle.download(&registry, &fs).await);

        let expected = fs.get_image_path(&format!("{}.png", handle.stem()));
        assert!(expected.is_file());
    }
}

#[cfg(test)]
mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let server = MockServer::start().await;
        serve(&server, "/a.png", 200, PNG_BYTES).await;
        serve(&server, "/b.jpg", 200, JPEG_BYTES).await;
        serve(&server, "/missing.png", 404, b"").await;
        let (_dir, fs, registry) = setup();

        let mut handles = vec![
            ResolutionHandle::new(format!("{}/a.png", server.uri()), AssetCategory::Image),
            ResolutionHandle::new(format!("{}/missing.png", server.uri()), AssetCategory::Image),
            ResolutionHandle::new(format!("{}/b.jpg", server.uri()), AssetCategory::Image),
            ResolutionHandle::new("ftp://files.example/model.obj", AssetCategory::Model),
        ];

        let capture = ProgressCapture::default();
        let summary = download_handles(
            handles.iter_mut().collect(),
            &registry,
            &fs,
            &DownloadConfig::default(),
            Some(capture.get_callback()),
        )
        .await;

        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.succeeded, 2);
        assert!(!summary.all_succeeded());

        let missing = format!("{}/missing.png", server.uri());
        let mut failed: Vec<&str> = summary.failed_urls().collect();
        failed.sort();
        assert_eq!(failed, vec!["ftp://files.example/model.obj", missing.as_str()]);

        let metrics = summary.metrics.unwrap();
        assert_eq!(metrics.total_downloads, 4);
        assert_eq!(metrics.successful_downloads, 2);
        assert_eq!(metrics.failed_downloads, 2);
        assert_eq!(metrics.success_rate(), 0.5);
        assert_eq!(
            metrics.average_size(),
            (PNG_BYTES.len() + JPEG_BYTES.len()) as f64 / 2.0
        );

        assert!(handles[0].is_present(&fs));
        assert!(handles[2].is_present(&fs));
        assert!(!handles[1].is_present(&fs));

        assert_eq!(capture.count(|e| matches!(e, ProgressEvent::DownloadStarted { .. })), 4);
        assert_eq!(capture.count(|e| matches!(e, ProgressEvent::Error { .. })), 2);
        assert_eq!(capture.count(|e| matches!(e, ProgressEvent::BatchComplete { succeeded: 2, .. })), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let (_dir, fs, registry) = setup();
        let summary =
            download_handles(Vec::new(), &registry, &fs, &DownloadConfig::default(), None).await;
        assert_eq!(summary.attempted, 0);
        assert!(summary.all_succeeded());
    }

    #[tokio::test]
    async fn test_sequential_batch() {
        let server = MockServer::start().await;
        serve(&server, "/one.obj", 200, b"v 1 1 1").await;
        serve(&server, "/two.obj", 200, b"v 2 2 2").await;
        let (_dir, fs, registry) = setup();
        let config = DownloadConfig::builder().max_concurrent_downloads(1).build().unwrap();

        let mut handles = vec![
            ResolutionHandle::new(format!("{}/one.obj", server.uri()), AssetCategory::Model),
            ResolutionHandle::new(format!("{}/two.obj", server.uri()), AssetCategory::Model),
        ];
        let summary =
            download_handles(handles.iter_mut().collect(), &registry, &fs, &config, None).await;
        assert!(summary.all_succeeded());
        assert_eq!(summary.succeeded, 2);
    }
}
