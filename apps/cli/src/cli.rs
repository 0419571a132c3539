//! Command line definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tts_manager::{ModSaveLocation, SaveType};

#[derive(Parser)]
#[command(name = "tts-manager", version, about = "Manage Tabletop Simulator mods and their assets")]
pub struct Cli {
    /// Directory holding Saves/ (overrides preferences)
    #[arg(long, global = true, env = "TTS_BASE_DIR", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Directory holding Mods/, when it is not the base directory
    #[arg(long, global = true, env = "TTS_MODS_DIR", value_name = "DIR")]
    pub mods_dir: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List installed mods, saves or chest items
    List {
        /// Document type (workshop, save or chest)
        #[arg(short = 't', long = "type", default_value = "workshop")]
        save_type: SaveType,
    },

    /// Show the assets of one document and which are missing
    Show {
        id: String,

        #[arg(short = 't', long = "type", default_value = "workshop")]
        save_type: SaveType,
    },

    /// Download missing assets
    Download {
        /// Document ids (all documents of the type with --all)
        #[arg(required_unless_present = "all")]
        ids: Vec<String>,

        #[arg(short = 't', long = "type", default_value = "workshop")]
        save_type: SaveType,

        /// Download for every document of the type
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Maximum downloads in flight
        #[arg(short = 'j', long, default_value_t = 4)]
        jobs: usize,

        /// Per request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Write a document and its local assets to a pak
    Export {
        id: String,

        #[arg(short = 't', long = "type", default_value = "workshop")]
        save_type: SaveType,

        /// Output file (defaults to <id>.pak)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract a pak into the data directories
    Import {
        pak: PathBuf,
    },

    /// Report assets missing from a pak or from an installed document
    Verify {
        /// Pak file to check
        #[arg(required_unless_present = "id")]
        pak: Option<PathBuf>,

        /// Check an installed document instead
        #[arg(long, conflicts_with = "pak")]
        id: Option<String>,

        #[arg(short = 't', long = "type", default_value = "workshop")]
        save_type: SaveType,

        /// Expect bundles and PDFs under Mods/Models, as imported from old paks
        #[arg(long, requires = "id")]
        legacy: bool,
    },

    /// Show or change preferences
    Prefs {
        /// Where mods are stored (Documents, GameData or Auto)
        #[arg(long, value_name = "LOCATION")]
        mod_location: Option<ModSaveLocation>,

        /// Game installation directory
        #[arg(long, value_name = "DIR")]
        tts_location: Option<PathBuf>,

        /// Check that the configured directories exist
        #[arg(long)]
        validate: bool,

        /// Restore defaults
        #[arg(long, conflicts_with_all = ["mod_location", "tts_location"])]
        reset: bool,
    },
}
