//! Mod documents and the assets they reference
//!
//! A Tabletop Simulator mod is a JSON document that points at its models,
//! images, asset bundles and PDFs by URL. This module parses documents,
//! walks them for asset references, and maps each reference to the relative
//! path the game expects to find it under.
//!
//! - [`Document`]: immutable parsed JSON
//! - [`extract`]: every asset URL anywhere in the document
//! - [`collect_assets`] / [`AssetMap`]: URLs grouped by [`AssetCategory`]
//! - [`ModDocument`]: a document bundled with its asset map

pub mod asset_map;
pub mod error;
pub mod extract;

pub use asset_map::{AssetCategory, AssetMap, build_asset_map, relative_path, strip_filename};
pub use error::{DocumentError, Result};
pub use extract::{AssetReference, AssetSets, collect_assets, extract, extract_references};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parsed mod or save document
///
/// The JSON tree is never mutated after parsing; loading the same file again
/// produces a new `Document`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    value: Value,
}

impl Document {
    /// Wrap an already parsed JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) => Ok(Self { value }),
            other => Err(DocumentError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Parse a document from raw file bytes
    ///
    /// Bytes that are not valid UTF-8 are decoded as Latin-1, which covers
    /// the Windows code pages older saves were written in.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let value = match std::str::from_utf8(bytes) {
            Ok(text) => serde_json::from_str(text)?,
            Err(_) => {
                debug!("Document is not UTF-8, decoding as Latin-1");
                let text: String = bytes.iter().map(|&b| b as char).collect();
                serde_json::from_str(&text)?
            }
        };
        Self::from_value(value)
    }

    /// Read and parse a document file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&bytes)
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// The declared `SaveName`, if present and non-empty
    pub fn save_name(&self) -> Option<&str> {
        self.value
            .get("SaveName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Serialize back to pretty-printed JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.value)?)
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s.as_bytes())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Kind of document, which decides where it lives on disk and in a pak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveType {
    Workshop,
    Save,
    Chest,
}

impl SaveType {
    pub const ALL: [SaveType; 3] = [SaveType::Workshop, SaveType::Save, SaveType::Chest];

    /// Folder holding documents of this type, relative to the data root
    pub fn folder(self) -> &'static str {
        match self {
            SaveType::Workshop => "Mods/Workshop",
            SaveType::Save => "Saves",
            SaveType::Chest => "Saves/Chest",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SaveType::Workshop => "workshop",
            SaveType::Save => "save",
            SaveType::Chest => "chest",
        }
    }
}

impl fmt::Display for SaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SaveType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self> {
        SaveType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DocumentError::UnknownSaveType(s.to_string()))
    }
}

/// A document together with its categorised asset references
///
/// Built once per document. Loading a different document means building a
/// new `ModDocument`; there is no way to swap the JSON underneath an
/// existing asset map.
#[derive(Debug, Clone)]
pub struct ModDocument {
    document: Document,
    assets: AssetSets,
    asset_map: AssetMap,
}

impl ModDocument {
    pub fn new(document: Document) -> Self {
        let assets = collect_assets(&document);
        let asset_map = build_asset_map(&assets);

        let unclassified = extract(&document)
            .into_iter()
            .filter(|url| !asset_map.contains_url(url))
            .count();
        if unclassified > 0 {
            debug!("{} URL(s) referenced outside known asset fields", unclassified);
        }
        if asset_map.is_empty() && document.value.get("ObjectStates").is_none() {
            warn!("Document has no ObjectStates; no assets will be mapped");
        }

        Self {
            document,
            assets,
            asset_map,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn name(&self) -> Option<&str> {
        self.document.save_name()
    }

    pub fn assets(&self) -> &AssetSets {
        &self.assets
    }

    pub fn asset_map(&self) -> &AssetMap {
        &self.asset_map
    }

    /// Every URL in the document, classified or not
    pub fn urls(&self) -> std::collections::BTreeSet<String> {
        extract(&self.document)
    }

    pub fn images(&self) -> Vec<&str> {
        self.asset_map.urls(AssetCategory::Image).collect()
    }

    pub fn models(&self) -> Vec<&str> {
        self.asset_map.urls(AssetCategory::Model).collect()
    }

    pub fn bundles(&self) -> Vec<&str> {
        self.asset_map.urls(AssetCategory::Bundle).collect()
    }

    pub fn pdfs(&self) -> Vec<&str> {
        self.asset_map.urls(AssetCategory::Pdf).collect()
    }

    /// Number of referenced assets across all categories
    pub fn total_assets(&self) -> usize {
        self.asset_map.len()
    }
}

impl From<Document> for ModDocument {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}
