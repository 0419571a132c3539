//! User preferences
//!
//! Where mods are stored is decided by [`ModSaveLocation`]. `Auto` defers to
//! the game's own setting, read by the [`game`] module. Preferences persist
//! through a [`PreferenceStore`]: the registry on Windows, a JSON file
//! everywhere else. [`open_store`] picks the right one.

pub mod error;
pub mod file;
pub mod game;
#[cfg(windows)]
pub mod registry;

pub use error::{PreferencesError, Result};
pub use file::FileStore;
#[cfg(windows)]
pub use registry::RegistryStore;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error};

use crate::filesystem::{FileSystem, standard_base_path};

/// Where the game keeps downloaded mods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ModSaveLocation {
    /// The user's data directory, next to the saves
    Documents = 0,
    /// The game installation's data folder
    GameData = 1,
    /// Whatever the game itself is configured to use
    #[default]
    Auto = 2,
}

impl ModSaveLocation {
    pub const ALL: [ModSaveLocation; 3] = [
        ModSaveLocation::Documents,
        ModSaveLocation::GameData,
        ModSaveLocation::Auto,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|l| *l as i64 == index)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModSaveLocation::Documents => "Documents",
            ModSaveLocation::GameData => "GameData",
            ModSaveLocation::Auto => "Auto",
        }
    }
}

impl fmt::Display for ModSaveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModSaveLocation {
    type Err = PreferencesError;

    /// Accepts a name (any case) or its numeric value
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s))
            .or_else(|| s.parse().ok().and_then(Self::from_index))
            .ok_or_else(|| PreferencesError::InvalidValue {
                field: "modSavePref",
                value: s.to_string(),
            })
    }
}

impl<'de> Deserialize<'de> for ModSaveLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Index(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Name(name) => name.parse().map_err(de::Error::custom),
            Raw::Index(index) => Self::from_index(index)
                .ok_or_else(|| de::Error::custom(format!("invalid modSavePref {index}"))),
        }
    }
}

fn default_first_run() -> bool {
    true
}

/// Persisted user preferences
///
/// Setters only flag the preferences as changed when the value differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "modSavePref", default)]
    mod_save_pref: ModSaveLocation,
    #[serde(rename = "TTSLocation", default)]
    tts_location: PathBuf,
    #[serde(rename = "firstRun", default = "default_first_run")]
    first_run: bool,
    #[serde(skip)]
    changed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            mod_save_pref: ModSaveLocation::Auto,
            tts_location: PathBuf::new(),
            first_run: true,
            changed: false,
        }
    }
}

impl Preferences {
    pub fn mod_save_pref(&self) -> ModSaveLocation {
        self.mod_save_pref
    }

    pub fn set_mod_save_pref(&mut self, value: ModSaveLocation) {
        if self.mod_save_pref != value {
            self.mod_save_pref = value;
            self.changed = true;
        }
    }

    /// Game installation directory
    pub fn tts_location(&self) -> &Path {
        &self.tts_location
    }

    pub fn set_tts_location(&mut self, value: impl Into<PathBuf>) {
        let value: PathBuf = value.into().components().collect();
        if self.tts_location != value {
            self.tts_location = value;
            self.changed = true;
        }
    }

    pub fn first_run(&self) -> bool {
        self.first_run
    }

    pub fn set_first_run(&mut self, value: bool) {
        if self.first_run != value {
            self.first_run = value;
            self.changed = true;
        }
    }

    /// Whether anything was modified since loading or saving
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Called by stores once the values are written
    pub(crate) fn mark_saved(&mut self) {
        self.first_run = false;
        self.changed = false;
    }

    /// The effective location, asking the game when set to `Auto`
    pub fn mod_save_location(&self) -> ModSaveLocation {
        match self.mod_save_pref {
            ModSaveLocation::Auto => self.resolve_auto(game::game_mod_location()),
            explicit => explicit,
        }
    }

    fn resolve_auto(&self, game_setting: Option<ModSaveLocation>) -> ModSaveLocation {
        match game_setting {
            Some(ModSaveLocation::GameData) => ModSaveLocation::GameData,
            Some(_) => ModSaveLocation::Documents,
            None => {
                debug!("Game mod location unknown, assuming Documents");
                ModSaveLocation::Documents
            }
        }
    }

    /// Filesystem for the effective location under the platform data directory
    pub fn filesystem(&self) -> Result<FileSystem> {
        let base = standard_base_path().ok_or(PreferencesError::NoDataDirectory)?;
        Ok(self.filesystem_at(base, self.mod_save_location()))
    }

    /// Filesystem rooted at `base` for an already resolved location
    pub fn filesystem_at(&self, base: impl Into<PathBuf>, location: ModSaveLocation) -> FileSystem {
        match location {
            ModSaveLocation::GameData => {
                if !self.tts_location.is_dir() {
                    error!(
                        "Mods are in GameData but TTS install location is invalid: \"{}\"",
                        self.tts_location.display()
                    );
                }
                FileSystem::with_game_data(base, &self.tts_location)
            }
            _ => FileSystem::new(base),
        }
    }

    /// Whether the saves and mods folders exist where the preferences point
    pub fn validate(&self) -> Result<bool> {
        Ok(self.filesystem()?.check_dirs())
    }
}

impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Preferences:")?;
        writeln!(f, "modSavePref: {}", self.mod_save_pref)?;
        writeln!(f, "TTSLocation: {}", self.tts_location.display())?;
        write!(f, "firstRun: {}", self.first_run)
    }
}

/// Persistent storage for [`Preferences`]
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences, or defaults when nothing is stored yet
    fn load(&self) -> Result<Preferences>;

    /// Write `preferences`; clears the first-run and changed flags
    fn save(&self, preferences: &mut Preferences) -> Result<()>;

    /// Remove stored values and return the defaults
    fn reset(&self) -> Result<Preferences>;

    /// Human readable description of where values are kept
    fn location(&self) -> String;
}

/// The store for this platform
#[cfg(windows)]
pub fn open_store() -> Result<Box<dyn PreferenceStore>> {
    Ok(Box::new(RegistryStore::open()?))
}

/// The store for this platform
#[cfg(not(windows))]
pub fn open_store() -> Result<Box<dyn PreferenceStore>> {
    Ok(Box::new(FileStore::standard()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_location_parsing() {
        assert_eq!("GameData".parse::<ModSaveLocation>().unwrap(), ModSaveLocation::GameData);
        assert_eq!("documents".parse::<ModSaveLocation>().unwrap(), ModSaveLocation::Documents);
        assert_eq!("2".parse::<ModSaveLocation>().unwrap(), ModSaveLocation::Auto);
        assert!("Cloud".parse::<ModSaveLocation>().is_err());
        assert!("7".parse::<ModSaveLocation>().is_err());
    }

    #[test]
    fn test_deserialize_names_and_numbers() {
        let by_name: Preferences =
            serde_json::from_str(r#"{"modSavePref":"GameData","TTSLocation":"/games/tts","firstRun":false}"#).unwrap();
        assert_eq!(by_name.mod_save_pref(), ModSaveLocation::GameData);
        assert_eq!(by_name.tts_location(), Path::new("/games/tts"));
        assert!(!by_name.first_run());
        assert!(!by_name.changed());

        let by_number: Preferences = serde_json::from_str(r#"{"modSavePref":0}"#).unwrap();
        assert_eq!(by_number.mod_save_pref(), ModSaveLocation::Documents);
        assert!(by_number.first_run());

        assert!(serde_json::from_str::<Preferences>(r#"{"modSavePref":"Cloud"}"#).is_err());
    }

    #[test]
    fn test_setters_track_changes() {
        let mut prefs = Preferences::default();
        prefs.set_mod_save_pref(ModSaveLocation::Auto);
        prefs.set_first_run(true);
        assert!(!prefs.changed());

        prefs.set_tts_location("/games/tts/");
        assert!(prefs.changed());
        assert_eq!(prefs.tts_location(), Path::new("/games/tts"));

        prefs.mark_saved();
        assert!(!prefs.changed());
        assert!(!prefs.first_run());
    }

    #[test]
    fn test_auto_resolution() {
        let prefs = Preferences::default();
        assert_eq!(prefs.resolve_auto(Some(ModSaveLocation::GameData)), ModSaveLocation::GameData);
        assert_eq!(prefs.resolve_auto(Some(ModSaveLocation::Documents)), ModSaveLocation::Documents);
        assert_eq!(prefs.resolve_auto(None), ModSaveLocation::Documents);

        let mut explicit = Preferences::default();
        explicit.set_mod_save_pref(ModSaveLocation::GameData);
        assert_eq!(explicit.mod_save_location(), ModSaveLocation::GameData);
    }

    #[test]
    fn test_filesystem_by_location() {
        let base = tempdir().unwrap();
        let install = tempdir().unwrap();
        let mut prefs = Preferences::default();
        prefs.set_tts_location(install.path());

        let documents = prefs.filesystem_at(base.path(), ModSaveLocation::Documents);
        assert_eq!(documents.mods_path(), base.path().join("Mods"));

        let game = prefs.filesystem_at(base.path(), ModSaveLocation::GameData);
        assert_eq!(game.base_path(), base.path());
        assert_eq!(
            game.mods_path(),
            install.path().join("Tabletop Simulator_Data").join("Mods")
        );
    }

    #[test]
    fn test_display() {
        let text = Preferences::default().to_string();
        assert!(text.contains("modSavePref: Auto"));
        assert!(text.contains("firstRun: true"));
    }
}
