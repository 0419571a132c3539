//! Completeness checks for paks and installed mods

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{PakReader, Result};
use crate::document::{AssetCategory, AssetMap, relative_path};

/// Order categories are checked and reported in
const REPORT_ORDER: [AssetCategory; 4] = [
    AssetCategory::Image,
    AssetCategory::Model,
    AssetCategory::Pdf,
    AssetCategory::Bundle,
];

/// Which referenced assets a set of files is missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Missing URLs per category, indexed by [`AssetCategory::index`]
    missing: [Vec<String>; 4],
    pub found: usize,
    /// Assets the document references
    pub total: usize,
    /// Number of names that were checked against
    pub entries: usize,
    /// Bundles and PDFs were looked for under `Mods/Models`
    pub legacy_layout: bool,
}

impl VerifyReport {
    pub fn missing(&self, category: AssetCategory) -> &[String] {
        &self.missing[category.index()]
    }

    /// Every missing URL, in report order
    pub fn missing_urls(&self) -> impl Iterator<Item = &str> {
        REPORT_ORDER
            .into_iter()
            .flat_map(move |category| self.missing(category).iter().map(String::as_str))
    }

    pub fn missing_count(&self) -> usize {
        self.missing.iter().map(Vec::len).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }
}

/// Drop everything from the first `.` of the last path component
pub fn strip_extension(name: &str) -> &str {
    let start = name.rfind('/').map_or(0, |i| i + 1);
    match name[start..].find('.') {
        Some(dot) => &name[..start + dot],
        None => name,
    }
}

/// Check that every asset in `asset_map` has a matching entry in `names`
///
/// Names are `/`-separated paths relative to the data root, e.g.
/// `Mods/Images/httpaimgpng.png`; extensions are ignored. With
/// `legacy_layout`, bundles and PDFs are expected under `Mods/Models`.
pub fn verify_list<I, S>(asset_map: &AssetMap, names: I, legacy_layout: bool) -> VerifyReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = 0;
    let available: HashSet<String> = names
        .into_iter()
        .inspect(|_| entries += 1)
        .map(|name| strip_extension(&name.as_ref().replace('\\', "/")).to_string())
        .collect();

    let mut report = VerifyReport {
        total: asset_map.len(),
        entries,
        legacy_layout,
        ..VerifyReport::default()
    };

    for category in REPORT_ORDER {
        let relocated = legacy_layout && matches!(category, AssetCategory::Bundle | AssetCategory::Pdf);
        for (url, path) in asset_map.get(category) {
            let expected = if relocated {
                relative_path(AssetCategory::Model, url)
            } else {
                path.clone()
            };
            if available.contains(&expected) {
                report.found += 1;
                debug!("{}: {} found", category, url);
            } else {
                warn!("{}: {} is missing", category, url);
                report.missing[category.index()].push(url.clone());
            }
        }
    }

    if report.is_complete() {
        info!("All items found {} of {} ({})", report.found, report.total, entries);
    } else {
        warn!(
            "Missing: images {}, models {}, pdfs {}, asset bundles {}",
            report.missing(AssetCategory::Image).len(),
            report.missing(AssetCategory::Model).len(),
            report.missing(AssetCategory::Pdf).len(),
            report.missing(AssetCategory::Bundle).len()
        );
        warn!(
            "{} of {} ({}) assets missing",
            report.missing_count(),
            report.total,
            entries
        );
    }
    report
}

/// Verify a pak against the document it contains
pub fn verify_pak(path: &Path) -> Result<VerifyReport> {
    PakReader::open(path)?.verify()
}

/// Verify the assets installed under `data_path` against `asset_map`
///
/// With `legacy_layout`, bundles and PDFs are expected under `Mods/Models`.
pub fn verify_dir(asset_map: &AssetMap, data_path: &Path, legacy_layout: bool) -> VerifyReport {
    let names: Vec<String> = AssetCategory::ALL
        .into_iter()
        .flat_map(|category| {
            WalkDir::new(data_path.join(category.root()))
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| {
                    entry
                        .path()
                        .strip_prefix(data_path)
                        .ok()
                        .map(|relative| relative.to_string_lossy().replace('\\', "/"))
                })
        })
        .collect();
    debug!("Found {} asset files under {}", names.len(), data_path.display());
    verify_list(asset_map, names, legacy_layout)
}
