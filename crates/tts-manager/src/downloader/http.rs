//! HTTP(S) fetcher built on reqwest

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info_span, Instrument};

use super::{
    config::DownloadConfig,
    error::{DownloadError, Result},
    registry::AssetFetcher,
};

const SCHEMES: [&str; 2] = ["http", "https"];

/// Single GET per asset, no authentication and no retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("Failed to create HTTP client: {e}"),
                field: None,
                suggestion: None,
            })?;

        Ok(Self {
            client,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn map_reqwest(&self, url: &str, error: reqwest::Error) -> DownloadError {
        if error.is_timeout() {
            DownloadError::NetworkTimeout {
                url: url.to_string(),
                duration_secs: self.timeout_secs,
            }
        } else {
            DownloadError::HttpRequest {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.map_reqwest(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(DownloadError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let expected = response.content_length();
            let body = response
                .bytes()
                .await
                .map_err(|e| self.map_reqwest(url, e))?;

            if let Some(expected) = expected {
                if (body.len() as u64) < expected {
                    return Err(DownloadError::Truncated {
                        url: url.to_string(),
                        expected,
                        actual: body.len() as u64,
                    });
                }
            }

            debug!("Fetched {} bytes", body.len());
            Ok(body.to_vec())
        }
        .instrument(info_span!("http_fetch", url = %url))
        .await
    }

    fn supports_url(&self, url: &str) -> bool {
        url::Url::parse(url)
            .map(|u| SCHEMES.contains(&u.scheme()))
            .unwrap_or(false)
    }

    fn schemes(&self) -> &[&'static str] {
        &SCHEMES
    }
}
