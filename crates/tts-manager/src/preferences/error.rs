//! Preferences error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing preferences
#[derive(Error, Debug)]
pub enum PreferencesError {
    /// The platform has no per-user configuration directory
    #[error("Unable to determine the user configuration directory")]
    NoConfigDirectory,

    /// The platform has no default game data directory
    #[error("Unable to determine the Tabletop Simulator data directory")]
    NoDataDirectory,

    #[error("I/O error {operation} '{path}'")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Preferences file '{path}' is invalid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Registry error on '{key}'")]
    Registry {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The game's own settings could not be read
    #[error("Unable to read game settings: {reason}")]
    GameConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, PreferencesError>;

impl PreferencesError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            PreferencesError::NoConfigDirectory => "no_config_directory",
            PreferencesError::NoDataDirectory => "no_data_directory",
            PreferencesError::Io { .. } => "io",
            PreferencesError::Parse { .. } => "parse",
            PreferencesError::InvalidValue { .. } => "invalid_value",
            PreferencesError::Registry { .. } => "registry",
            PreferencesError::GameConfig { .. } => "game_config",
        }
    }

    /// Get suggested resolution for this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PreferencesError::NoDataDirectory => Some("Pass --base-dir to point at the game data directory"),
            PreferencesError::Parse { .. } => Some("Run 'prefs --reset' to restore defaults"),
            PreferencesError::InvalidValue { field: "modSavePref", .. } => {
                Some("Use one of Documents, GameData or Auto")
            }
            _ => None,
        }
    }
}
