//! The game's own mod location setting
//!
//! The game stores its options as a JSON blob named `ConfigGame` in Unity
//! player prefs. On Linux that is an XML file with the blob base64 encoded;
//! on Windows it is a binary registry value. `ConfigMods.Location` is `0`
//! for Documents and `1` for GameData.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{ModSaveLocation, PreferencesError, Result};

static CONFIG_GAME_PREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<pref\s+name="ConfigGame"[^>]*>\s*([A-Za-z0-9+/=\s]*?)\s*</pref>"#)
        .expect("ConfigGame pattern is valid")
});

fn game_config(reason: impl Into<String>) -> PreferencesError {
    PreferencesError::GameConfig {
        reason: reason.into(),
    }
}

/// Read `ConfigMods.Location` from a decoded `ConfigGame` blob
pub fn parse_config_game(bytes: &[u8]) -> Result<ModSaveLocation> {
    // Registry values carry a trailing NUL
    let bytes = bytes.strip_suffix(b"\0").unwrap_or(bytes);
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| game_config(format!("ConfigGame is not JSON ({e})")))?;

    let location = value
        .get("ConfigMods")
        .and_then(|mods| mods.get("Location"))
        .ok_or_else(|| game_config("ConfigGame has no ConfigMods.Location"))?;

    let parsed = match location {
        Value::Number(n) => n.as_i64().and_then(ModSaveLocation::from_index),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    match parsed {
        Some(ModSaveLocation::Auto) | None => Err(game_config(format!(
            "unexpected ConfigMods.Location {location}"
        ))),
        Some(location) => Ok(location),
    }
}

/// Read the mod location from the text of a Unity prefs file
pub fn parse_unity_prefs(xml: &str) -> Result<ModSaveLocation> {
    let encoded = CONFIG_GAME_PREF
        .captures(xml)
        .and_then(|c| c.get(1))
        .ok_or_else(|| game_config("no ConfigGame pref"))?;
    let compact: String = encoded.as_str().split_whitespace().collect();
    let decoded = STANDARD
        .decode(compact)
        .map_err(|e| game_config(format!("ConfigGame is not base64 ({e})")))?;
    parse_config_game(&decoded)
}

/// Location of the Unity prefs file on Linux
pub fn unity_prefs_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join("unity3d")
            .join("Berserk Games")
            .join("Tabletop Simulator")
            .join("prefs")
    })
}

#[cfg(windows)]
fn read_game_setting() -> Result<ModSaveLocation> {
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    const GAME_KEY: &str = r"Software\Berserk Games\Tabletop Simulator";

    let key = RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey(GAME_KEY)
        .map_err(|source| PreferencesError::Registry {
            key: GAME_KEY.to_string(),
            source,
        })?;

    // Unity suffixes value names with a hash, e.g. ConfigGame_h1234567
    for (name, value) in key.enum_values().filter_map(|v| v.ok()) {
        if name.starts_with("ConfigGame") {
            debug!("Reading game setting {}\\{}", GAME_KEY, name);
            return parse_config_game(&value.bytes);
        }
    }
    Err(game_config(format!("no ConfigGame value under {GAME_KEY}")))
}

#[cfg(not(windows))]
fn read_game_setting() -> Result<ModSaveLocation> {
    let path = unity_prefs_path().ok_or(PreferencesError::NoConfigDirectory)?;
    debug!("Reading game setting from {}", path.display());
    let xml = std::fs::read_to_string(&path).map_err(|source| PreferencesError::Io {
        path: path.clone(),
        operation: "reading",
        source,
    })?;
    parse_unity_prefs(&xml)
}

/// The game's configured mod location, if it can be determined
pub fn game_mod_location() -> Option<ModSaveLocation> {
    match read_game_setting() {
        Ok(location) => {
            debug!("Game stores mods in {}", location);
            Some(location)
        }
        Err(e) => {
            warn!("Unable to read the game's mod location [{}]: {}", e.category(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs_xml(config: &str) -> String {
        format!(
            "<unity_prefs version_major=\"1\" version_minor=\"1\">\n\
             \t<pref name=\"Quality\" type=\"int\">3</pref>\n\
             \t<pref name=\"ConfigGame\" type=\"string\">{}</pref>\n\
             </unity_prefs>\n",
            STANDARD.encode(config)
        )
    }

    #[test]
    fn test_parse_config_game() {
        assert_eq!(
            parse_config_game(br#"{"ConfigMods":{"Location":1}}"#).unwrap(),
            ModSaveLocation::GameData
        );
        assert_eq!(
            parse_config_game(b"{\"ConfigMods\":{\"Location\":0}}\0").unwrap(),
            ModSaveLocation::Documents
        );
        assert_eq!(
            parse_config_game(br#"{"ConfigMods":{"Location":"GameData"}}"#).unwrap(),
            ModSaveLocation::GameData
        );
        assert!(parse_config_game(br#"{"ConfigMods":{"Location":2}}"#).is_err());
        assert!(parse_config_game(br#"{"ConfigMods":{}}"#).is_err());
        assert!(parse_config_game(b"garbage").is_err());
    }

    #[test]
    fn test_parse_unity_prefs() {
        let xml = prefs_xml(r#"{"ConfigMods":{"Location":1,"Caching":true}}"#);
        assert_eq!(parse_unity_prefs(&xml).unwrap(), ModSaveLocation::GameData);

        let xml = prefs_xml(r#"{"ConfigMods":{"Location":0}}"#);
        assert_eq!(parse_unity_prefs(&xml).unwrap(), ModSaveLocation::Documents);
    }

    #[test]
    fn test_unity_prefs_without_config() {
        let err = parse_unity_prefs("<unity_prefs></unity_prefs>").unwrap_err();
        assert_eq!(err.category(), "game_config");

        let err = parse_unity_prefs(r#"<pref name="ConfigGame" type="string">@@@</pref>"#).unwrap_err();
        assert_eq!(err.category(), "game_config");
    }
}
