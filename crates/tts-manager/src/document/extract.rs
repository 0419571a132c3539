//! Asset reference discovery
//!
//! Two passes over the same JSON tree:
//!
//! - [`extract`] is the generic pass. It records every string under a field
//!   whose name ends in `URL`/`Url`, plus any string that starts with a
//!   known URL scheme, wherever it appears.
//! - [`collect_assets`] is the categorised pass. It only looks at the fields
//!   the game loads assets from, and keeps them in separate sets so they can
//!   be mapped to a category.
//!
//! Both passes are pure: each call builds fresh sets and merges the sets of
//! its children.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::trace;

use super::{AssetCategory, Document};

/// Field names that end in `URL` but never point at an asset
const EXCLUDED_FIELDS: [&str; 2] = ["PageURL", "Rules"];

/// Schemes recognised in string values regardless of field name
const URL_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Suffix tag some card backs carry to force a unique texture
const UNIQUE_TAG: &str = "{Unique}";

/// One asset URL and the field it was found under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetReference {
    pub url: String,
    pub field: String,
}

/// Drop a `{Unique}` tag and anything after it
pub fn strip_unique_tag(url: &str) -> &str {
    match url.find(UNIQUE_TAG) {
        Some(index) => &url[..index],
        None => url,
    }
}

fn has_url_scheme(text: &str) -> bool {
    text.split_once("://")
        .is_some_and(|(scheme, _)| URL_SCHEMES.contains(&scheme))
}

/// The set of distinct asset URLs referenced anywhere in the document
pub fn extract(document: &Document) -> BTreeSet<String> {
    extract_references(document)
        .into_iter()
        .map(|reference| reference.url)
        .collect()
}

/// Every asset reference in traversal order, with the field it came from
///
/// A URL used under several fields appears once per field.
pub fn extract_references(document: &Document) -> Vec<AssetReference> {
    references_in(document.as_value())
}

fn references_in(value: &Value) -> Vec<AssetReference> {
    match value {
        Value::Array(items) => items.iter().flat_map(references_in).collect(),
        Value::Object(fields) => {
            let mut found: Vec<AssetReference> = fields
                .iter()
                .filter_map(|(key, value)| reference_for_field(key, value))
                .collect();
            found.extend(fields.values().flat_map(references_in));
            found
        }
        _ => Vec::new(),
    }
}

fn reference_for_field(key: &str, value: &Value) -> Option<AssetReference> {
    let text = value.as_str()?;
    if text.is_empty() || EXCLUDED_FIELDS.contains(&key) {
        return None;
    }
    if !(key.ends_with("URL") || key.ends_with("Url") || has_url_scheme(text)) {
        return None;
    }
    let url = strip_unique_tag(text);
    if url.is_empty() {
        return None;
    }
    trace!("Found {}: {}", key, url);
    Some(AssetReference {
        url: url.to_string(),
        field: key.to_string(),
    })
}

/// Asset URLs grouped by the field family they were loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSets {
    /// `TableURL`
    pub table_images: BTreeSet<String>,
    /// `SkyURL`
    pub sky_images: BTreeSet<String>,
    /// `CustomUIAssets[].URL`
    pub ui_images: BTreeSet<String>,
    /// `CustomImage.ImageURL`, `CustomImage.ImageSecondaryURL`
    pub custom_images: BTreeSet<String>,
    /// `CustomDeck.*.FaceURL`, `CustomDeck.*.BackURL`
    pub deck_images: BTreeSet<String>,
    /// `CustomMesh.DiffuseURL`, `CustomMesh.NormalURL`
    pub mesh_images: BTreeSet<String>,
    /// `CustomMesh.MeshURL`, `CustomMesh.ColliderURL`
    pub mesh_models: BTreeSet<String>,
    /// `Lighting.LutURL`
    pub lighting_models: BTreeSet<String>,
    /// `CustomPDF.PDFUrl`
    pub pdfs: BTreeSet<String>,
    /// `CustomAssetbundle.AssetbundleURL`, `CustomAssetbundle.AssetbundleSecondaryURL`
    pub bundles: BTreeSet<String>,
}

impl AssetSets {
    /// Union of two sets of sets
    pub fn merge(mut self, other: AssetSets) -> AssetSets {
        self.table_images.extend(other.table_images);
        self.sky_images.extend(other.sky_images);
        self.ui_images.extend(other.ui_images);
        self.custom_images.extend(other.custom_images);
        self.deck_images.extend(other.deck_images);
        self.mesh_images.extend(other.mesh_images);
        self.mesh_models.extend(other.mesh_models);
        self.lighting_models.extend(other.lighting_models);
        self.pdfs.extend(other.pdfs);
        self.bundles.extend(other.bundles);
        self
    }

    /// All URLs that belong to `category`
    pub fn urls_for(&self, category: AssetCategory) -> BTreeSet<&str> {
        let groups: Vec<&BTreeSet<String>> = match category {
            AssetCategory::Image => vec![
                &self.table_images,
                &self.sky_images,
                &self.ui_images,
                &self.custom_images,
                &self.deck_images,
                &self.mesh_images,
            ],
            AssetCategory::Model => vec![&self.mesh_models, &self.lighting_models],
            AssetCategory::Bundle => vec![&self.bundles],
            AssetCategory::Pdf => vec![&self.pdfs],
        };
        groups
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        AssetCategory::ALL
            .into_iter()
            .all(|category| self.urls_for(category).is_empty())
    }
}

fn url_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    let url = strip_unique_tag(object.get(key)?.as_str()?);
    (!url.is_empty()).then_some(url)
}

fn urls_from(object: &Map<String, Value>, keys: &[&str]) -> BTreeSet<String> {
    keys.iter()
        .filter_map(|key| url_field(object, key))
        .map(str::to_string)
        .collect()
}

fn ui_asset_urls(object: &Map<String, Value>) -> BTreeSet<String> {
    object
        .get("CustomUIAssets")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|asset| url_field(asset, "URL"))
        .map(str::to_string)
        .collect()
}

/// Categorised asset references for the whole document
pub fn collect_assets(document: &Document) -> AssetSets {
    let Some(root) = document.as_value().as_object() else {
        return AssetSets::default();
    };

    let top_level = AssetSets {
        table_images: urls_from(root, &["TableURL"]),
        sky_images: urls_from(root, &["SkyURL"]),
        ui_images: ui_asset_urls(root),
        lighting_models: root
            .get("Lighting")
            .and_then(Value::as_object)
            .map(|lighting| urls_from(lighting, &["LutURL"]))
            .unwrap_or_default(),
        ..AssetSets::default()
    };

    let objects = root
        .get("ObjectStates")
        .and_then(Value::as_array)
        .map(|states| object_assets(states.iter()))
        .unwrap_or_default();

    top_level.merge(objects)
}

fn object_assets<'a>(objects: impl Iterator<Item = &'a Value>) -> AssetSets {
    objects
        .filter_map(Value::as_object)
        .map(single_object_assets)
        .fold(AssetSets::default(), AssetSets::merge)
}

fn single_object_assets(object: &Map<String, Value>) -> AssetSets {
    let child = |key: &str| object.get(key).and_then(Value::as_object);

    let mut sets = AssetSets {
        ui_images: ui_asset_urls(object),
        ..AssetSets::default()
    };

    if let Some(bundle) = child("CustomAssetbundle") {
        sets.bundles = urls_from(bundle, &["AssetbundleURL", "AssetbundleSecondaryURL"]);
    }
    if let Some(decks) = child("CustomDeck") {
        sets.deck_images = decks
            .values()
            .filter_map(Value::as_object)
            .flat_map(|deck| urls_from(deck, &["FaceURL", "BackURL"]))
            .collect();
    }
    if let Some(image) = child("CustomImage") {
        sets.custom_images = urls_from(image, &["ImageURL", "ImageSecondaryURL"]);
    }
    if let Some(mesh) = child("CustomMesh") {
        sets.mesh_images = urls_from(mesh, &["DiffuseURL", "NormalURL"]);
        sets.mesh_models = urls_from(mesh, &["MeshURL", "ColliderURL"]);
    }
    if let Some(pdf) = child("CustomPDF") {
        sets.pdfs = urls_from(pdf, &["PDFUrl"]);
    }

    // Alternate states are keyed by state number; contained objects are a list
    let nested = match object.get("States") {
        Some(Value::Object(states)) => object_assets(states.values()),
        Some(Value::Array(states)) => object_assets(states.iter()),
        _ => AssetSets::default(),
    };
    let contained = object
        .get("ContainedObjects")
        .and_then(Value::as_array)
        .map(|items| object_assets(items.iter()))
        .unwrap_or_default();

    sets.merge(nested).merge(contained)
}
