//! Configuration types for the downloader system

use std::time::Duration;

use super::error::{DownloadError, Result};

/// User agent the game's own asset cache uses; some image hosts reject
/// requests without a browser-like agent
pub const BROWSER_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 5.5; Windows NT)";

/// Configuration for download operations
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Total time allowed for one request, body included
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Upper bound on downloads in flight during a batch
    pub max_concurrent_downloads: usize,
}

impl DownloadConfig {
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder::default()
    }

    /// Reject settings the HTTP client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_downloads == 0 {
            return Err(DownloadError::Configuration {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                field: Some("max_concurrent_downloads".to_string()),
                suggestion: Some("Use 1 for sequential downloads".to_string()),
            });
        }
        if self.timeout.is_zero() {
            return Err(DownloadError::Configuration {
                message: "timeout must be greater than zero".to_string(),
                field: Some("timeout".to_string()),
                suggestion: None,
            });
        }
        Ok(())
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: BROWSER_USER_AGENT.to_string(),
            max_concurrent_downloads: 4,
        }
    }
}

/// Builder for [`DownloadConfig`], starting from the defaults
#[derive(Debug, Clone, Default)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn max_concurrent_downloads(mut self, max: usize) -> Self {
        self.config.max_concurrent_downloads = max;
        self
    }

    pub fn build(self) -> Result<DownloadConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
