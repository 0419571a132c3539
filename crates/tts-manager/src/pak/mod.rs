//! Pak archives: a mod document, its thumbnail and its assets in one zip
//!
//! The zip comment carries a small JSON header, `{"Ver":3,"Id":"...","Type":"workshop"}`.
//! Entries use the same relative layout as the game data directory:
//!
//! ```text
//! Mods/Workshop/<id>.json
//! Mods/Workshop/Thumbnails/<id>.png
//! Mods/Models/<stem>.obj
//! Mods/Images/<stem>.<png|jpg|...>
//! Mods/Assetbundles/<stem>.unity3d
//! Mods/PDF/<stem>.PDF
//! ```
//!
//! Saves and chest items use `Saves/` and `Saves/Chest/` for the document.
//! Paks up to version 2 stored bundles and PDFs under `Mods/Models`.

pub mod error;
pub mod export;
pub mod import;
pub mod verify;

pub use error::{PakError, Result};
pub use export::{PakSummary, export};
pub use import::{ImportSummary, PakReader, import_pak};
pub use verify::{VerifyReport, strip_extension, verify_dir, verify_list, verify_pak};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::SaveType;

/// Version written by this crate
pub const PAK_VERSION: u32 = 3;

/// Newest version that used the shared `Mods/Models` layout
pub const LEGACY_PAK_VERSION: u32 = 2;

/// Metadata stored as the archive comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PakHeader {
    #[serde(rename = "Ver")]
    pub version: u32,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Type")]
    pub save_type: SaveType,
}

impl PakHeader {
    pub fn new(id: impl Into<String>, save_type: SaveType) -> Self {
        Self {
            version: PAK_VERSION,
            id: id.into(),
            save_type,
        }
    }

    /// Parse and validate an archive comment
    pub fn parse(comment: &[u8]) -> Result<Self> {
        if comment.is_empty() {
            return Err(PakError::InvalidHeader {
                reason: "header is empty".to_string(),
            });
        }
        let text = std::str::from_utf8(comment).map_err(|_| PakError::InvalidHeader {
            reason: "header is not UTF-8".to_string(),
        })?;
        let value: Value = serde_json::from_str(text).map_err(|e| PakError::InvalidHeader {
            reason: format!("header is not JSON ({e})"),
        })?;

        let version = value
            .get("Ver")
            .and_then(Value::as_u64)
            .ok_or_else(|| invalid(format!("missing or non-numeric Ver in {text}")))?;
        let version = u32::try_from(version).unwrap_or(u32::MAX);

        let id = value
            .get("Id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid(format!("missing Id in {text}")))?;

        let type_name = value
            .get("Type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("missing Type in {text}")))?;
        let save_type = SaveType::ALL
            .into_iter()
            .find(|t| t.name() == type_name)
            .ok_or_else(|| invalid(format!("unknown Type '{type_name}'")))?;

        let header = Self {
            version,
            id: id.to_string(),
            save_type,
        };
        header.validate()?;
        Ok(header)
    }

    /// Check version and id against what this crate can handle
    pub fn validate(&self) -> Result<()> {
        if self.version > PAK_VERSION {
            return Err(PakError::UnsupportedVersion {
                version: self.version,
                max: PAK_VERSION,
            });
        }
        if self.id.is_empty() {
            return Err(invalid("empty Id".to_string()));
        }
        // The id becomes a file name on import
        if self.id.contains(['/', '\\']) || self.id.contains("..") {
            return Err(invalid(format!("Id '{}' is not a valid file name", self.id)));
        }
        Ok(())
    }

    /// JSON text stored as the zip comment
    pub fn to_comment(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| invalid(e.to_string()))
    }

    /// Bundles and PDFs are stored under `Mods/Models`
    pub fn uses_legacy_layout(&self) -> bool {
        self.version <= LEGACY_PAK_VERSION
    }

    /// Entry name of the document inside the archive
    pub fn document_entry(&self) -> String {
        format!("{}/{}.json", self.save_type.folder(), self.id)
    }

    /// Entry name the thumbnail is written to in the archive
    pub fn thumbnail_entry(&self) -> String {
        format!("{}/Thumbnails/{}.png", self.save_type.folder(), self.id)
    }
}

fn invalid(reason: String) -> PakError {
    PakError::InvalidHeader { reason }
}
