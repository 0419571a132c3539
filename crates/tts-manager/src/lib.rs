//! Tabletop Simulator mod manager
//!
//! This library finds every asset a Tabletop Simulator mod references,
//! downloads the ones missing from the local cache, and moves mods between
//! machines as self-contained pak archives.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tts_manager::{DownloadConfig, FetcherRegistry, FileSystem, Save, SaveType, pak};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Saves and mods under the platform default data directory
//! let filesystem = FileSystem::standard().ok_or("no data directory")?;
//!
//! // Load a workshop mod and probe for each of its assets
//! let mut save = Save::load(&filesystem, "123456789", SaveType::Workshop)?;
//!
//! if !save.is_installed() {
//!     let config = DownloadConfig::default();
//!     let registry = FetcherRegistry::http(&config)?;
//!     let summary = save.download_all(&registry, &config, None).await;
//!     println!("{} of {} downloaded", summary.succeeded, summary.attempted);
//! }
//!
//! // Package the mod with everything it needs
//! let written = pak::export(&save, Path::new("123456789.pak"))?;
//! println!("{} entries written", written.entries);
//!
//! // Check a pak before importing it elsewhere
//! let report = pak::verify_pak(Path::new("123456789.pak"))?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Asset discovery**: every URL in a document, plus categorised sets for models, images, bundles and PDFs
//! - **Cache compatible paths**: file names match the ones the game itself writes
//! - **Concurrent downloads**: bounded worker pool with progress events and metrics
//! - **Pak archives**: export, verify and import, including older layouts
//! - **Preferences**: registry or JSON file storage, honouring the game's own mod location

pub mod catalog;
pub mod document;
pub mod downloader;
pub mod filesystem;
pub mod pak;
pub mod preferences;
pub mod resolve;
pub mod save;

// Re-export commonly used types for convenience
pub use catalog::{ModSummary, describe_files_by_type, download_file, load_file_by_type};
pub use document::{AssetCategory, AssetMap, Document, DocumentError, ModDocument, SaveType};
pub use downloader::{
    DownloadConfig, DownloadError, DownloadSummary, FetcherRegistry, ProgressCallback, ProgressEvent,
};
pub use filesystem::{AssetLocator, FileSystem};
pub use pak::{PakError, PakHeader, VerifyReport};
pub use preferences::{ModSaveLocation, PreferenceStore, Preferences, PreferencesError, open_store};
pub use resolve::{Resolution, ResolutionHandle};
pub use save::Save;
