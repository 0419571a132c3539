//! Lazily resolved binding between one asset URL and its file on disk
//!
//! A [`ResolutionHandle`] starts out [`Resolution::Unresolved`]. The first
//! query probes the locator and caches the answer; a successful download
//! clears the cache so the next query sees the new file.

pub mod sniff;

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::document::{AssetCategory, strip_filename};
use crate::downloader::{DownloadError, DownloadResult, FetcherRegistry, FileOperation, Result};
use crate::filesystem::AssetLocator;

/// Cached outcome of probing for an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unresolved,
    Present { path: PathBuf, category: AssetCategory },
    Absent,
}

/// One referenced asset and what is known about its local copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionHandle {
    url: String,
    stem: String,
    declared: AssetCategory,
    state: Resolution,
}

/// Add `http://` to a URL that has no scheme
pub fn with_default_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        warn!("Missing protocol for {}. Assuming http://", url);
        format!("http://{url}")
    }
}

impl ResolutionHandle {
    pub fn new(url: impl Into<String>, declared: AssetCategory) -> Self {
        let url = url.into();
        Self {
            stem: strip_filename(&url),
            url,
            declared,
            state: Resolution::Unresolved,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Category the document references this URL under
    pub fn declared(&self) -> AssetCategory {
        self.declared
    }

    /// Cached state, without probing
    pub fn state(&self) -> &Resolution {
        &self.state
    }

    /// Probe the locator once and cache the result
    pub fn resolve(&mut self, locator: &dyn AssetLocator) -> &Resolution {
        if self.state == Resolution::Unresolved {
            self.state = match locator.find_details(&self.stem, self.declared) {
                Some((path, category)) => {
                    if category != self.declared {
                        warn!(
                            "{} is referenced as {} but found as {} at {}",
                            self.url,
                            self.declared,
                            category,
                            path.display()
                        );
                    }
                    Resolution::Present { path, category }
                }
                None => Resolution::Absent,
            };
        }
        &self.state
    }

    /// Forget the cached result
    pub fn invalidate(&mut self) {
        self.state = Resolution::Unresolved;
    }

    pub fn is_present(&mut self, locator: &dyn AssetLocator) -> bool {
        matches!(self.resolve(locator), Resolution::Present { .. })
    }

    /// Path of the local copy, if there is one
    pub fn location(&mut self, locator: &dyn AssetLocator) -> Option<&Path> {
        match self.resolve(locator) {
            Resolution::Present { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }

    /// Category the local copy was found under, else the declared one
    pub fn category(&mut self, locator: &dyn AssetLocator) -> AssetCategory {
        match self.resolve(locator) {
            Resolution::Present { category, .. } => *category,
            _ => self.declared,
        }
    }

    /// Download the asset unless it is already present
    ///
    /// The body is written next to its final path and renamed into place,
    /// so a failed write never leaves a file the locator would pick up.
    pub async fn try_download(
        &mut self,
        registry: &FetcherRegistry,
        locator: &dyn AssetLocator,
    ) -> Result<DownloadResult> {
        if let Some(path) = self.location(locator) {
            return Ok(DownloadResult::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let url = with_default_scheme(&self.url);
        let span = info_span!("asset_download", url = %url);
        async move {
            url::Url::parse(&url).map_err(|e| DownloadError::invalid_url(&url, e))?;

            info!("Downloading data for {}", url);
            let bytes = registry.fetch(&url).await?;

            let extension = match self.declared.extension() {
                Some(ext) => ext,
                None => sniff::image_extension(&bytes).ok_or_else(|| {
                    DownloadError::UnknownImageFormat {
                        url: url.clone(),
                        size: bytes.len(),
                    }
                })?,
            };
            let path = locator.get_asset_path(&format!("{}.{}", self.stem, extension), self.declared);
            debug!("File is {}, {}", extension, path.display());

            write_atomically(&path, &bytes).await?;
            self.invalidate();

            Ok(DownloadResult::Downloaded {
                path,
                size: bytes.len() as u64,
            })
        }
        .instrument(span)
        .await
    }

    /// Download and log the outcome, returning whether the asset is now present
    pub async fn download(&mut self, registry: &FetcherRegistry, locator: &dyn AssetLocator) -> bool {
        match self.try_download(registry, locator).await {
            Ok(DownloadResult::Downloaded { path, size }) => {
                debug!("Saved {} ({} bytes)", path.display(), size);
                true
            }
            Ok(DownloadResult::AlreadyExists { .. }) => true,
            Err(e) => {
                error!("Error downloading {} ({})", self.url, e);
                false
            }
        }
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| DownloadError::FileSystem {
                path: parent.to_path_buf(),
                operation: FileOperation::CreateDir,
                source,
            })?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".part");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, bytes)
        .await
        .map_err(|source| DownloadError::FileSystem {
            path: temp_path.clone(),
            operation: FileOperation::Write,
            source,
        })?;

    if let Err(source) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(DownloadError::FileSystem {
            path: path.to_path_buf(),
            operation: FileOperation::Move,
            source,
        });
    }
    debug!("Atomically renamed {} to {}", temp_path.display(), path.display());
    Ok(())
}

impl std::fmt::Display for ResolutionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            Resolution::Present { category, .. } => write!(f, "{}: {}", category, self.url),
            _ => write!(f, "{} (Not Found)", self.url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::FileSystem;
    use tempfile::tempdir;

    #[test]
    fn test_resolution_is_cached_until_invalidated() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        let mut handle = ResolutionHandle::new("http://a/img.png", AssetCategory::Image);
        assert_eq!(handle.stem(), "httpaimgpng");
        assert_eq!(handle.state(), &Resolution::Unresolved);

        assert!(!handle.is_present(&fs));
        assert_eq!(handle.state(), &Resolution::Absent);

        let file = fs.get_image_path("httpaimgpng.png");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"png").unwrap();

        // Still cached as absent
        assert!(!handle.is_present(&fs));

        handle.invalidate();
        assert_eq!(handle.location(&fs), Some(file.as_path()));
        assert_eq!(handle.category(&fs), AssetCategory::Image);
        assert_eq!(handle.to_string(), "image: http://a/img.png");
    }

    #[test]
    fn test_found_category_may_differ_from_declared() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        let file = fs.get_model_path("httpalutpng.obj");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"v 0 0 0").unwrap();

        let mut handle = ResolutionHandle::new("http://a/lut.png", AssetCategory::Image);
        assert_eq!(handle.category(&fs), AssetCategory::Model);
        assert_eq!(handle.declared(), AssetCategory::Image);
    }

    #[test]
    fn test_default_scheme() {
        assert_eq!(with_default_scheme("example.com/a.png"), "http://example.com/a.png");
        assert_eq!(with_default_scheme("https://example.com/a.png"), "https://example.com/a.png");
    }

    #[tokio::test]
    async fn test_present_asset_is_not_fetched() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        let file = fs.get_model_path("httpxmeshobj.obj");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"v 0 0 0").unwrap();

        // No fetchers registered: any network attempt would fail
        let registry = FetcherRegistry::new();
        let mut handle = ResolutionHandle::new("http://x/mesh.obj", AssetCategory::Model);
        let result = handle.try_download(&registry, &fs).await.unwrap();
        assert!(matches!(result, DownloadResult::AlreadyExists { path } if path == file));
    }
}
