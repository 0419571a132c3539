//! Fetcher registry for routing asset URLs to a transport
//!
//! Assets are referenced by plain URLs of any scheme. The registry holds the
//! fetchers this build knows about and picks the first one that accepts a
//! URL; anything else is reported as unsupported for that one asset.

use async_trait::async_trait;

use super::{
    config::DownloadConfig,
    error::{DownloadError, Result},
    http::HttpFetcher,
};

/// A transport that can retrieve the raw bytes behind a URL
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the complete body for `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Check if this fetcher handles the URL's scheme
    fn supports_url(&self, url: &str) -> bool;

    /// Schemes listed in unsupported URL errors
    fn schemes(&self) -> &[&'static str];
}

/// Registry for managing multiple fetcher implementations
pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn AssetFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Register a new fetcher implementation
    pub fn register<F: AssetFetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetchers.push(Box::new(fetcher));
        self
    }

    /// Add an HTTP fetcher with the given configuration
    pub fn with_http_fetcher(self, config: &DownloadConfig) -> Result<Self> {
        Ok(self.register(HttpFetcher::new(config)?))
    }

    /// Registry with only the HTTP fetcher, the usual setup
    pub fn http(config: &DownloadConfig) -> Result<Self> {
        Self::new().with_http_fetcher(config)
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// Find the first fetcher that supports `url`
    pub fn find_fetcher(&self, url: &str) -> Result<&dyn AssetFetcher> {
        self.fetchers
            .iter()
            .find(|f| f.supports_url(url))
            .map(|f| f.as_ref())
            .ok_or_else(|| {
                let scheme = url::Url::parse(url)
                    .map(|u| u.scheme().to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                let supported: Vec<&str> = self
                    .fetchers
                    .iter()
                    .flat_map(|f| f.schemes().iter().copied())
                    .collect();
                DownloadError::UnsupportedUrl {
                    url: url.to_string(),
                    scheme,
                    supported_schemes: if supported.is_empty() {
                        "none".to_string()
                    } else {
                        supported.join(", ")
                    },
                }
            })
    }

    /// Find the right fetcher and fetch in one call
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.find_fetcher(url)?.fetch(url).await
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
