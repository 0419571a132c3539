//! Install layout and asset lookup
//!
//! The game keeps saves and chest items under its data directory, and mods
//! either in the same place or inside the game installation, depending on
//! the mod location preference. [`FileSystem`] captures both roots and
//! computes every path the rest of the crate reads or writes.

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::document::{AssetCategory, SaveType};

/// Extensions an image may have been saved with, most common first
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "tga", "rawt",
];

/// Catalogue file the game writes next to workshop mods
const WORKSHOP_INDEX_STEM: &str = "WorkshopFileInfos";

/// Folder name of the game data inside an installation
const GAME_DATA_DIR: &str = "Tabletop Simulator_Data";

/// Where assets live on disk
///
/// Implemented by [`FileSystem`]; resolution handles only depend on this
/// trait so tests and archive readers can provide their own layout.
pub trait AssetLocator: Send + Sync {
    /// Find an asset file by stem, probing `declared` first
    ///
    /// Returns the path and the category whose directory it was found in.
    fn find_details(&self, stem: &str, declared: AssetCategory) -> Option<(PathBuf, AssetCategory)>;

    /// Path a downloaded asset called `name` should be written to
    fn get_asset_path(&self, name: &str, category: AssetCategory) -> PathBuf;
}

/// The two data roots of one installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystem {
    /// Root holding `Saves/`
    base_path: PathBuf,
    /// Root holding `Mods/`
    data_path: PathBuf,
}

/// The game's default data directory for this platform
pub fn standard_base_path() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        dirs::data_dir().map(|dir| dir.join("Tabletop Simulator"))
    } else {
        dirs::document_dir().map(|dir| dir.join("My Games").join("Tabletop Simulator"))
    }
}

impl FileSystem {
    /// Saves and mods under the same root
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            data_path: base_path.clone(),
            base_path,
        }
    }

    /// Saves under `base_path`, mods under the game installation
    pub fn with_game_data(base_path: impl Into<PathBuf>, install_path: impl AsRef<Path>) -> Self {
        Self::with_paths(base_path, install_path.as_ref().join(GAME_DATA_DIR))
    }

    /// Saves under `base_path`, `Mods/` under `data_path`
    pub fn with_paths(base_path: impl Into<PathBuf>, data_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            data_path: data_path.into(),
        }
    }

    /// Saves and mods under the platform default data directory
    pub fn standard() -> Option<Self> {
        standard_base_path().map(Self::new)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// The `Mods` directory
    pub fn mods_path(&self) -> PathBuf {
        self.data_path.join("Mods")
    }

    /// Root a document of `save_type` and its archive entries are placed under
    pub fn root_for_type(&self, save_type: SaveType) -> &Path {
        match save_type {
            SaveType::Workshop => &self.data_path,
            SaveType::Save | SaveType::Chest => &self.base_path,
        }
    }

    /// Root an archive entry path is extracted under
    pub fn root_for_entry(&self, entry: &str) -> &Path {
        if entry.split('/').next() == Some("Saves") {
            &self.base_path
        } else {
            &self.data_path
        }
    }

    pub fn category_path(&self, category: AssetCategory) -> PathBuf {
        self.data_path.join(category.root())
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.category_path(AssetCategory::Model).join(name)
    }

    pub fn get_image_path(&self, name: &str) -> PathBuf {
        self.category_path(AssetCategory::Image).join(name)
    }

    /// Folder holding documents of `save_type`
    pub fn type_folder(&self, save_type: SaveType) -> PathBuf {
        self.root_for_type(save_type).join(save_type.folder())
    }

    pub fn get_path_by_type(&self, basename: &str, save_type: SaveType) -> PathBuf {
        self.type_folder(save_type).join(basename)
    }

    pub fn get_json_filename_for_type(&self, id: &str, save_type: SaveType) -> PathBuf {
        self.get_path_by_type(&format!("{id}.json"), save_type)
    }

    /// Ids of every document of `save_type`, sorted
    ///
    /// A missing folder yields no ids.
    pub fn get_filenames_by_type(&self, save_type: SaveType) -> Vec<String> {
        let folder = self.type_folder(save_type);
        let entries = match std::fs::read_dir(&folder) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {}: {}", folder.display(), e);
                return Vec::new();
            }
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|stem| stem != WORKSHOP_INDEX_STEM)
            .collect();
        ids.sort();
        ids
    }

    /// Whether the saves folder and the mods folder both exist
    pub fn check_dirs(&self) -> bool {
        let saves = self.type_folder(SaveType::Save);
        let mods = self.mods_path();
        debug!("Checking {} and {}", saves.display(), mods.display());
        saves.is_dir() && mods.is_dir()
    }

    fn candidates(&self, stem: &str, category: AssetCategory) -> Vec<PathBuf> {
        let dir = self.category_path(category);
        match category.extension() {
            Some(ext) => {
                let mut found = vec![dir.join(format!("{stem}.{ext}"))];
                // Paks older than version 3 install bundles and PDFs with the models
                if matches!(category, AssetCategory::Bundle | AssetCategory::Pdf) {
                    found.push(self.category_path(AssetCategory::Model).join(format!("{stem}.{ext}")));
                }
                found
            }
            None => IMAGE_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{stem}.{ext}")))
                .collect(),
        }
    }
}

impl AssetLocator for FileSystem {
    fn find_details(&self, stem: &str, declared: AssetCategory) -> Option<(PathBuf, AssetCategory)> {
        let order = std::iter::once(declared)
            .chain(AssetCategory::ALL.into_iter().filter(|c| *c != declared));

        for category in order {
            for candidate in self.candidates(stem, category) {
                trace!("Probing {}", candidate.display());
                if candidate.is_file() {
                    return Some((candidate, category));
                }
            }
        }
        None
    }

    fn get_asset_path(&self, name: &str, category: AssetCategory) -> PathBuf {
        self.category_path(category).join(name)
    }
}

impl std::fmt::Display for FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.base_path == self.data_path {
            write!(f, "{}", self.base_path.display())
        } else {
            write!(
                f,
                "{} (mods in {})",
                self.base_path.display(),
                self.data_path.display()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_paths_by_type() {
        let fs = FileSystem::with_game_data("/data", "/games/tts");

        assert_eq!(
            fs.get_json_filename_for_type("123", SaveType::Workshop),
            PathBuf::from("/games/tts/Tabletop Simulator_Data/Mods/Workshop/123.json")
        );
        assert_eq!(
            fs.get_json_filename_for_type("TS_Save_1", SaveType::Save),
            PathBuf::from("/data/Saves/TS_Save_1.json")
        );
        assert_eq!(
            fs.get_path_by_type("bag.json", SaveType::Chest),
            PathBuf::from("/data/Saves/Chest/bag.json")
        );
        assert_eq!(
            fs.get_image_path("a.png"),
            PathBuf::from("/games/tts/Tabletop Simulator_Data/Mods/Images/a.png")
        );
        assert_eq!(fs.root_for_entry("Saves/Chest/x.json"), Path::new("/data"));
        assert_eq!(
            fs.root_for_entry("Mods/Models/x.obj"),
            Path::new("/games/tts/Tabletop Simulator_Data")
        );
    }

    #[test]
    fn test_find_details_prefers_declared_category() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        touch(&fs.get_model_path("stem.obj"));
        touch(&fs.get_image_path("stem.jpg"));

        let (path, category) = fs.find_details("stem", AssetCategory::Image).unwrap();
        assert_eq!(category, AssetCategory::Image);
        assert_eq!(path, fs.get_image_path("stem.jpg"));

        let (_, category) = fs.find_details("stem", AssetCategory::Model).unwrap();
        assert_eq!(category, AssetCategory::Model);
    }

    #[test]
    fn test_find_details_falls_back_to_other_categories() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        touch(&fs.get_model_path("lut.obj"));

        let (path, category) = fs.find_details("lut", AssetCategory::Image).unwrap();
        assert_eq!(category, AssetCategory::Model);
        assert_eq!(path, fs.get_model_path("lut.obj"));
        assert!(fs.find_details("other", AssetCategory::Image).is_none());
    }

    #[test]
    fn test_find_details_accepts_bundles_and_pdfs_with_models() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        touch(&fs.get_model_path("bundle.unity3d"));
        touch(&fs.get_model_path("rules.PDF"));

        let (path, category) = fs.find_details("bundle", AssetCategory::Bundle).unwrap();
        assert_eq!(category, AssetCategory::Bundle);
        assert_eq!(path, fs.get_model_path("bundle.unity3d"));

        let (path, category) = fs.find_details("rules", AssetCategory::Pdf).unwrap();
        assert_eq!(category, AssetCategory::Pdf);
        assert_eq!(path, fs.get_model_path("rules.PDF"));
    }

    #[test]
    fn test_filenames_by_type_skips_index() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        touch(&fs.get_json_filename_for_type("200", SaveType::Workshop));
        touch(&fs.get_json_filename_for_type("100", SaveType::Workshop));
        touch(&fs.get_json_filename_for_type(WORKSHOP_INDEX_STEM, SaveType::Workshop));
        touch(&fs.get_path_by_type("100.png", SaveType::Workshop));

        assert_eq!(fs.get_filenames_by_type(SaveType::Workshop), vec!["100", "200"]);
        assert!(fs.get_filenames_by_type(SaveType::Chest).is_empty());
    }

    #[test]
    fn test_check_dirs() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        assert!(!fs.check_dirs());

        std::fs::create_dir_all(fs.type_folder(SaveType::Save)).unwrap();
        std::fs::create_dir_all(fs.mods_path()).unwrap();
        assert!(fs.check_dirs());
    }
}
