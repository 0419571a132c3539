//! JSON file preference store
//!
//! Older releases kept the same values in `tts_manager.ini`, section `main`.
//! When no JSON file exists yet that INI file is read instead, and the next
//! save writes JSON.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{ModSaveLocation, PreferenceStore, Preferences, PreferencesError, Result};

pub const FILE_NAME: &str = "tts_manager.json";
pub const LEGACY_FILE_NAME: &str = "tts_manager.ini";

/// Preferences kept in a JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    legacy_path: Option<PathBuf>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy_path: None,
        }
    }

    /// Fall back to an INI file at `path` while the JSON file is missing
    pub fn with_legacy(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_path = Some(path.into());
        self
    }

    /// `tts_manager.json` in the user configuration directory
    pub fn standard() -> Result<Self> {
        let dir = dirs::config_dir().ok_or(PreferencesError::NoConfigDirectory)?;
        Ok(Self::new(dir.join(FILE_NAME)).with_legacy(dir.join(LEGACY_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileStore {
    fn load_legacy(&self) -> Result<Preferences> {
        let Some(legacy) = self.legacy_path.as_deref() else {
            debug!("No preferences at {}, using defaults", self.path.display());
            return Ok(Preferences::default());
        };
        match std::fs::read_to_string(legacy) {
            Ok(text) => {
                info!("Reading preferences from {}", legacy.display());
                Ok(parse_ini(&text))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", self.path.display());
                Ok(Preferences::default())
            }
            Err(source) => Err(PreferencesError::Io {
                path: legacy.to_path_buf(),
                operation: "reading",
                source,
            }),
        }
    }
}

/// Preferences from the `main` section of an INI file
///
/// Keys match case-insensitively. Unknown or invalid values keep their
/// defaults. The result is flagged as changed so it gets saved as JSON.
pub fn parse_ini(text: &str) -> Preferences {
    let mut prefs = Preferences::default();
    let mut in_main = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_main = section.trim() == "main";
            continue;
        }
        if !in_main {
            continue;
        }
        let Some((key, value)) = line.split_once(['=', ':']) else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "modsavepref" => match value.parse::<ModSaveLocation>() {
                Ok(location) => prefs.set_mod_save_pref(location),
                Err(e) => warn!("{}, using {}", e, ModSaveLocation::Auto),
            },
            "ttslocation" => prefs.set_tts_location(value),
            "firstrun" => match value.to_ascii_lowercase().as_str() {
                "yes" | "true" | "on" | "1" => prefs.set_first_run(true),
                "no" | "false" | "off" | "0" => prefs.set_first_run(false),
                _ => warn!("Invalid firstRun '{}'", value),
            },
            other => debug!("Ignoring preference {}", other),
        }
    }
    prefs.changed = true;
    prefs
}

impl PreferenceStore for FileStore {
    fn load(&self) -> Result<Preferences> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return self.load_legacy(),
            Err(source) => {
                return Err(PreferencesError::Io {
                    path: self.path.clone(),
                    operation: "reading",
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| PreferencesError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, preferences: &mut Preferences) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let io_error = |operation: &'static str| {
            let path = self.path.clone();
            move |source| PreferencesError::Io {
                path,
                operation,
                source,
            }
        };

        std::fs::create_dir_all(dir).map_err(io_error("creating directory for"))?;

        let mut saved = preferences.clone();
        saved.mark_saved();
        let bytes = serde_json::to_vec_pretty(&saved).map_err(|source| PreferencesError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut temp = NamedTempFile::new_in(dir).map_err(io_error("writing"))?;
        temp.write_all(&bytes).map_err(io_error("writing"))?;
        temp.persist(&self.path).map_err(|e| PreferencesError::Io {
            path: self.path.clone(),
            operation: "replacing",
            source: e.error,
        })?;

        preferences.mark_saved();
        info!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    fn reset(&self) -> Result<Preferences> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Removed {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PreferencesError::Io {
                    path: self.path.clone(),
                    operation: "removing",
                    source,
                });
            }
        }
        Ok(Preferences::default())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::ModSaveLocation;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join(FILE_NAME));
        assert_eq!(store.load().unwrap(), Preferences::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join(FILE_NAME));

        let mut prefs = store.load().unwrap();
        prefs.set_mod_save_pref(ModSaveLocation::GameData);
        prefs.set_tts_location("/games/tts");
        assert!(prefs.changed());

        store.save(&mut prefs).unwrap();
        assert!(!prefs.changed());
        assert!(!prefs.first_run());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.mod_save_pref(), ModSaveLocation::GameData);
        assert_eq!(loaded.tts_location(), Path::new("/games/tts"));

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains(r#""modSavePref": "GameData""#));
        assert!(text.contains(r#""firstRun": false"#));
    }

    #[test]
    fn test_reset_removes_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join(FILE_NAME));
        let mut prefs = Preferences::default();
        prefs.set_mod_save_pref(ModSaveLocation::Documents);
        store.save(&mut prefs).unwrap();
        assert!(store.path().is_file());

        assert_eq!(store.reset().unwrap(), Preferences::default());
        assert!(!store.path().exists());
        // Resetting twice is fine
        store.reset().unwrap();
    }

    #[test]
    fn test_reads_legacy_ini_until_saved() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join(LEGACY_FILE_NAME);
        std::fs::write(
            &legacy,
            "[main]\nmodsavepref = GameData\nttslocation = /games/tts\nfirstrun = no\n",
        )
        .unwrap();
        let store = FileStore::new(dir.path().join(FILE_NAME)).with_legacy(&legacy);

        let mut prefs = store.load().unwrap();
        assert_eq!(prefs.mod_save_pref(), ModSaveLocation::GameData);
        assert_eq!(prefs.tts_location(), Path::new("/games/tts"));
        assert!(!prefs.first_run());
        assert!(prefs.changed());

        store.save(&mut prefs).unwrap();
        std::fs::write(&legacy, "[main]\nmodSavePref = Documents\n").unwrap();
        assert_eq!(store.load().unwrap().mod_save_pref(), ModSaveLocation::GameData);
    }

    #[test]
    fn test_parse_ini_ignores_other_sections_and_bad_values() {
        let prefs = parse_ini("[other]\nmodSavePref = Documents\n[main]\nmodSavePref = Nowhere\n");
        assert_eq!(prefs.mod_save_pref(), ModSaveLocation::Auto);
        assert!(prefs.first_run());
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join(FILE_NAME));
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.load().unwrap_err();
        assert_eq!(err.category(), "parse");
        assert!(err.suggestion().is_some());
    }
}
