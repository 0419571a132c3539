//! A mod or save together with the state of every asset it references

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::document::{AssetCategory, Document, ModDocument, SaveType, Result};
use crate::downloader::{
    DownloadConfig, DownloadSummary, FetcherRegistry, ProgressCallback, download_handles,
};
use crate::filesystem::FileSystem;
use crate::resolve::{Resolution, ResolutionHandle};

/// One document, its assets and where they are on disk
#[derive(Debug, Clone)]
pub struct Save {
    document: ModDocument,
    id: String,
    save_type: SaveType,
    filesystem: FileSystem,
    /// One per (category, url) entry of the asset map, in map order
    handles: Vec<ResolutionHandle>,
    document_path: Option<PathBuf>,
    thumbnail: Option<PathBuf>,
}

impl Save {
    /// Build from a parsed document and resolve every asset against `filesystem`
    pub fn new(document: Document, id: impl Into<String>, save_type: SaveType, filesystem: FileSystem) -> Self {
        let document = ModDocument::new(document);
        let handles = document
            .asset_map()
            .iter()
            .map(|(category, url, _)| ResolutionHandle::new(url, category))
            .collect();

        let mut save = Self {
            document,
            id: id.into(),
            save_type,
            filesystem,
            handles,
            document_path: None,
            thumbnail: None,
        };
        save.refresh();
        save
    }

    /// Load document `id` of `save_type` from `filesystem`
    ///
    /// The thumbnail is the `.png` next to the document, when there is one.
    pub fn load(filesystem: &FileSystem, id: &str, save_type: SaveType) -> Result<Self> {
        let path = filesystem.get_json_filename_for_type(id, save_type);
        debug!("Loading {} {} from {}", save_type, id, path.display());
        let document = Document::load(&path)?;

        let thumbnail = path.with_extension("png");
        let mut save = Self::new(document, id, save_type, filesystem.clone());
        save.thumbnail = thumbnail.is_file().then_some(thumbnail);
        save.document_path = Some(path);
        Ok(save)
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<PathBuf>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn save_type(&self) -> SaveType {
        self.save_type
    }

    /// Declared save name, falling back to the id
    pub fn name(&self) -> &str {
        self.document.name().unwrap_or(&self.id)
    }

    pub fn document(&self) -> &ModDocument {
        &self.document
    }

    pub fn filesystem(&self) -> &FileSystem {
        &self.filesystem
    }

    /// File the document was loaded from
    pub fn document_path(&self) -> Option<&Path> {
        self.document_path.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&Path> {
        self.thumbnail.as_deref()
    }

    pub fn handles(&self) -> &[ResolutionHandle] {
        &self.handles
    }

    /// Handles with a local copy
    pub fn present(&self) -> impl Iterator<Item = &ResolutionHandle> {
        self.handles
            .iter()
            .filter(|h| matches!(h.state(), Resolution::Present { .. }))
    }

    /// Handles without a local copy
    pub fn missing(&self) -> impl Iterator<Item = &ResolutionHandle> {
        self.handles
            .iter()
            .filter(|h| !matches!(h.state(), Resolution::Present { .. }))
    }

    pub fn missing_count(&self) -> usize {
        self.missing().count()
    }

    /// Handles the document references as `category`
    pub fn by_category(&self, category: AssetCategory) -> impl Iterator<Item = &ResolutionHandle> {
        self.handles.iter().filter(move |h| h.declared() == category)
    }

    pub fn images(&self) -> impl Iterator<Item = &ResolutionHandle> {
        self.by_category(AssetCategory::Image)
    }

    pub fn models(&self) -> impl Iterator<Item = &ResolutionHandle> {
        self.by_category(AssetCategory::Model)
    }

    pub fn is_installed(&self) -> bool {
        self.missing().next().is_none()
    }

    /// Probe the filesystem again for every asset
    pub fn refresh(&mut self) {
        for handle in &mut self.handles {
            handle.invalidate();
            handle.resolve(&self.filesystem);
        }
    }

    /// Document bytes as they should be archived
    ///
    /// The file on disk is used unchanged when there is one.
    pub fn document_bytes(&self) -> Result<Vec<u8>> {
        match &self.document_path {
            Some(path) => std::fs::read(path).map_err(|source| crate::document::DocumentError::Read {
                path: path.clone(),
                source,
            }),
            None => self.document.document().to_bytes(),
        }
    }

    /// Download every missing asset
    ///
    /// Failures are collected in the summary; the remaining downloads carry
    /// on. Handles are probed again afterwards.
    pub async fn download_all(
        &mut self,
        registry: &FetcherRegistry,
        config: &DownloadConfig,
        progress: Option<ProgressCallback>,
    ) -> DownloadSummary {
        let missing: Vec<&mut ResolutionHandle> = self
            .handles
            .iter_mut()
            .filter(|h| !matches!(h.state(), Resolution::Present { .. }))
            .collect();

        if missing.is_empty() {
            info!("{} is already installed", self.id);
            return DownloadSummary::default();
        }
        info!("Downloading {} missing assets for {}", missing.len(), self.id);

        let summary = download_handles(missing, registry, &self.filesystem, config, progress).await;
        self.refresh();

        if !summary.all_succeeded() {
            warn!(
                "{} of {} downloads failed for {}",
                summary.failed.len(),
                summary.attempted,
                self.id
            );
        }
        summary
    }
}

impl fmt::Display for Save {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} {})", self.name(), self.save_type, self.id)?;

        let missing: Vec<&ResolutionHandle> = self.missing().collect();
        if !missing.is_empty() {
            writeln!(f, "Missing:")?;
            for handle in missing {
                writeln!(f, "  {}", handle)?;
            }
        }

        for (title, category) in [("Images", AssetCategory::Image), ("Models", AssetCategory::Model)] {
            writeln!(f, "{}:", title)?;
            for handle in self.by_category(category) {
                writeln!(f, "  {}", handle)?;
            }
        }
        Ok(())
    }
}
