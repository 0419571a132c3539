//! Windows registry preference store

use std::io::ErrorKind;
use tracing::{debug, info};
use winreg::RegKey;
use winreg::enums::HKEY_CURRENT_USER;

use super::{ModSaveLocation, PreferenceStore, Preferences, PreferencesError, Result};

pub const KEY_PATH: &str = r"Software\TTS Manager";

const MOD_SAVE_PREF: &str = "modSavePref";
const TTS_LOCATION: &str = "TTSLocation";
const FIRST_RUN: &str = "firstRun";

/// Values written by older releases, removed on save
const DEPRECATED_VALUES: [&str; 2] = ["locationIsUser", "defaultSaveLocation"];

/// Preferences kept under `HKCU\Software\TTS Manager`
pub struct RegistryStore {
    key: RegKey,
}

impl RegistryStore {
    /// Open the key, creating it if needed
    pub fn open() -> Result<Self> {
        let (key, _) = RegKey::predef(HKEY_CURRENT_USER)
            .create_subkey(KEY_PATH)
            .map_err(registry_error)?;
        Ok(Self { key })
    }

    fn get_string(&self, name: &str) -> Option<String> {
        self.key.get_value::<String, _>(name).ok()
    }

    fn delete(&self, name: &str) -> Result<()> {
        match self.key.delete_value(name) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(registry_error(source)),
        }
    }
}

fn registry_error(source: std::io::Error) -> PreferencesError {
    PreferencesError::Registry {
        key: KEY_PATH.to_string(),
        source,
    }
}

impl PreferenceStore for RegistryStore {
    fn load(&self) -> Result<Preferences> {
        let mut prefs = Preferences::default();

        let location = match self.get_string(MOD_SAVE_PREF) {
            Some(value) => value.parse().ok(),
            // Older releases only stored whether mods were in Documents
            None => self
                .get_string("locationIsUser")
                .map(|v| if v == "True" { ModSaveLocation::Documents } else { ModSaveLocation::Auto }),
        };
        if let Some(location) = location {
            prefs.set_mod_save_pref(location);
        }
        if let Some(path) = self.get_string(TTS_LOCATION) {
            prefs.set_tts_location(path);
        }
        if let Some(first_run) = self.get_string(FIRST_RUN) {
            prefs.set_first_run(first_run == "True");
        }

        debug!("Loaded preferences from HKCU\\{}", KEY_PATH);
        prefs.changed = false;
        Ok(prefs)
    }

    fn save(&self, preferences: &mut Preferences) -> Result<()> {
        let first_run = "False".to_string();
        self.key
            .set_value(MOD_SAVE_PREF, &preferences.mod_save_pref().name().to_string())
            .map_err(registry_error)?;
        self.key
            .set_value(TTS_LOCATION, &preferences.tts_location().display().to_string())
            .map_err(registry_error)?;
        self.key.set_value(FIRST_RUN, &first_run).map_err(registry_error)?;

        for name in DEPRECATED_VALUES {
            self.delete(name)?;
        }

        preferences.mark_saved();
        info!("Saved preferences to HKCU\\{}", KEY_PATH);
        Ok(())
    }

    fn reset(&self) -> Result<Preferences> {
        for name in [MOD_SAVE_PREF, TTS_LOCATION, FIRST_RUN]
            .into_iter()
            .chain(DEPRECATED_VALUES)
        {
            self.delete(name)?;
        }
        Ok(Preferences::default())
    }

    fn location(&self) -> String {
        format!("HKCU\\{KEY_PATH}")
    }
}
