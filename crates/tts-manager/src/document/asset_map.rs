//! Asset categories and the URL to relative path mapping

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::AssetSets;

/// Kind of asset, which decides where it is stored and its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Model,
    Image,
    Bundle,
    Pdf,
}

impl AssetCategory {
    /// Every category, in the order assets are reported and archived
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Model,
        AssetCategory::Image,
        AssetCategory::Bundle,
        AssetCategory::Pdf,
    ];

    pub fn index(self) -> usize {
        match self {
            AssetCategory::Model => 0,
            AssetCategory::Image => 1,
            AssetCategory::Bundle => 2,
            AssetCategory::Pdf => 3,
        }
    }

    /// Directory holding this category, relative to the data root
    pub fn root(self) -> &'static str {
        match self {
            AssetCategory::Model => "Mods/Models",
            AssetCategory::Image => "Mods/Images",
            AssetCategory::Bundle => "Mods/Assetbundles",
            AssetCategory::Pdf => "Mods/PDF",
        }
    }

    /// Last component of [`root`](Self::root)
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Model => "Models",
            AssetCategory::Image => "Images",
            AssetCategory::Bundle => "Assetbundles",
            AssetCategory::Pdf => "PDF",
        }
    }

    /// Fixed file extension, or `None` for images whose extension comes
    /// from the downloaded content
    pub fn extension(self) -> Option<&'static str> {
        match self {
            AssetCategory::Model => Some("obj"),
            AssetCategory::Image => None,
            AssetCategory::Bundle => Some("unity3d"),
            AssetCategory::Pdf => Some("PDF"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetCategory::Model => "model",
            AssetCategory::Image => "image",
            AssetCategory::Bundle => "asset bundle",
            AssetCategory::Pdf => "pdf",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reduce a URL to the file name stem the game uses for its cache
///
/// Only ASCII letters and digits survive, in their original order.
pub fn strip_filename(url: &str) -> String {
    url.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Relative path (without extension) an asset of `category` is stored under
pub fn relative_path(category: AssetCategory, url: &str) -> String {
    format!("{}/{}", category.root(), strip_filename(url))
}

/// URL to relative path tables, one per [`AssetCategory`]
///
/// Built once from an [`AssetSets`]; there are no mutating methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMap {
    slots: [BTreeMap<String, String>; 4],
}

impl AssetMap {
    /// URL to relative path entries for one category
    pub fn get(&self, category: AssetCategory) -> &BTreeMap<String, String> {
        &self.slots[category.index()]
    }

    pub fn urls(&self, category: AssetCategory) -> impl Iterator<Item = &str> {
        self.get(category).keys().map(String::as_str)
    }

    /// Every entry as `(category, url, relative path)`, categories in [`AssetCategory::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (AssetCategory, &str, &str)> {
        AssetCategory::ALL.into_iter().flat_map(move |category| {
            self.get(category)
                .iter()
                .map(move |(url, path)| (category, url.as_str(), path.as_str()))
        })
    }

    pub fn count(&self, category: AssetCategory) -> usize {
        self.get(category).len()
    }

    /// Total entries across all categories
    ///
    /// A URL referenced under two categories counts twice.
    pub fn len(&self) -> usize {
        self.slots.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(BTreeMap::is_empty)
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.slots.iter().any(|slot| slot.contains_key(url))
    }
}

/// Classify categorised URL sets and compute each relative path
pub fn build_asset_map(assets: &AssetSets) -> AssetMap {
    // Indexed parallel collect keeps ALL order, which matches index()
    let tables: Vec<BTreeMap<String, String>> = AssetCategory::ALL
        .par_iter()
        .map(|&category| {
            assets
                .urls_for(category)
                .into_iter()
                .map(|url| (url.to_string(), relative_path(category, url)))
                .collect()
        })
        .collect();

    AssetMap {
        slots: tables.try_into().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, collect_assets};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_strip_filename_keeps_ascii_alphanumerics() {
        assert_eq!(strip_filename("http://a/img.png"), "httpaimgpng");
        assert_eq!(
            strip_filename("https://i.imgur.com/AbC_12-x.jpg?raw=1"),
            "httpsiimgurcomAbC12xjpgraw1"
        );
        assert_eq!(strip_filename("http://ü.example/é"), "httpexample");
        assert_eq!(strip_filename(""), "");
    }

    #[test]
    fn test_relative_path_is_category_rooted() {
        assert_eq!(
            relative_path(AssetCategory::Image, "http://a/img.png"),
            "Mods/Images/httpaimgpng"
        );
        assert_eq!(
            relative_path(AssetCategory::Model, "http://a/img.png"),
            "Mods/Models/httpaimgpng"
        );
        assert_eq!(
            relative_path(AssetCategory::Bundle, "http://b/x.unity3d"),
            "Mods/Assetbundles/httpbxunity3d"
        );
        assert_eq!(
            relative_path(AssetCategory::Pdf, "http://p/r.pdf"),
            "Mods/PDF/httpprpdf"
        );
    }

    #[test]
    fn test_stem_is_category_independent() {
        let url = "http://cloud-3.steamusercontent.com/ugc/123/ABC/";
        let stems: Vec<String> = AssetCategory::ALL
            .into_iter()
            .map(|category| {
                relative_path(category, url)
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        assert!(stems.iter().all(|stem| stem == &strip_filename(url)));
    }

    #[test]
    fn test_build_asset_map_groups_by_category() {
        let document = Document::from_value(json!({
            "TableURL": "http://a/img.png",
            "Lighting": {"LutURL": "http://a/lut.png"},
            "ObjectStates": [{
                "CustomMesh": {
                    "MeshURL": "http://m/mesh.obj",
                    "ColliderURL": "",
                    "DiffuseURL": "http://m/diffuse.png",
                    "NormalURL": ""
                },
                "CustomAssetbundle": {"AssetbundleURL": "http://b/b.unity3d", "AssetbundleSecondaryURL": ""},
                "CustomPDF": {"PDFUrl": "http://p/r.pdf"}
            }]
        }))
        .unwrap();

        let map = build_asset_map(&collect_assets(&document));

        assert_eq!(
            map.get(AssetCategory::Image).get("http://a/img.png").map(String::as_str),
            Some("Mods/Images/httpaimgpng")
        );
        assert_eq!(
            map.urls(AssetCategory::Model).collect::<Vec<_>>(),
            vec!["http://a/lut.png", "http://m/mesh.obj"]
        );
        assert_eq!(map.count(AssetCategory::Bundle), 1);
        assert_eq!(map.count(AssetCategory::Pdf), 1);
        assert_eq!(map.len(), 6);
        assert!(map.contains_url("http://p/r.pdf"));
        assert!(!map.contains_url("http://nowhere/"));

        let order: Vec<AssetCategory> = map.iter().map(|(category, _, _)| category).collect();
        let mut sorted = order.clone();
        sorted.sort_by_key(|c| c.index());
        assert_eq!(order, sorted);
    }

    #[test]
    fn test_empty_map() {
        let map = build_asset_map(&AssetSets::default());
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.iter().count(), 0);
    }
}
