//! Writing a save and its local assets into a pak

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use super::{PakError, PakHeader, Result};
use crate::document::AssetCategory;
use crate::resolve::Resolution;
use crate::save::Save;

/// Archive order of asset categories after the document and thumbnail
const EXPORT_ORDER: [AssetCategory; 4] = [
    AssetCategory::Model,
    AssetCategory::Image,
    AssetCategory::Bundle,
    AssetCategory::Pdf,
];

/// What an export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakSummary {
    pub path: PathBuf,
    pub header: PakHeader,
    /// Entries written, document and thumbnail included
    pub entries: usize,
    pub assets: usize,
    pub thumbnail: bool,
    /// URLs with no local copy, which were left out
    pub skipped: Vec<String>,
}

/// Write `save` to a pak at `target`
///
/// The archive is assembled in a temporary file beside `target` and only
/// moved into place once complete.
pub fn export(save: &Save, target: &Path) -> Result<PakSummary> {
    let header = PakHeader::new(save.id(), save.save_type());
    header.validate()?;

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir).map_err(PakError::io(dir, "creating temporary file in"))?;

    let zip_error = |source| PakError::Zip {
        path: target.to_path_buf(),
        source,
    };
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(temp.as_file());
    let mut written: HashSet<String> = HashSet::new();

    let mut add = |writer: &mut ZipWriter<&File>, name: String, bytes: &[u8]| -> Result<bool> {
        if !written.insert(name.clone()) {
            debug!("Skipping duplicate entry {}", name);
            return Ok(false);
        }
        debug!("Writing {} ({} bytes)", name, bytes.len());
        writer.start_file(name, options).map_err(zip_error)?;
        writer
            .write_all(bytes)
            .map_err(PakError::io(target, "writing"))?;
        Ok(true)
    };

    let document = save.document_bytes()?;
    add(&mut writer, header.document_entry(), &document)?;

    let mut thumbnail = false;
    if let Some(path) = save.thumbnail() {
        let bytes = std::fs::read(path).map_err(PakError::io(path, "reading"))?;
        thumbnail = add(&mut writer, header.thumbnail_entry(), &bytes)?;
    }

    let mut assets = 0;
    for category in EXPORT_ORDER {
        for handle in save.by_category(category) {
            let Resolution::Present { path, .. } = handle.state() else {
                continue;
            };
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("Skipping {} with unusable file name {}", handle.url(), path.display());
                continue;
            };
            let bytes = std::fs::read(path).map_err(PakError::io(path, "reading"))?;
            if add(&mut writer, format!("{}/{}", category.root(), file_name), &bytes)? {
                assets += 1;
            }
        }
    }

    let skipped: Vec<String> = save.missing().map(|h| h.url().to_string()).collect();
    for url in &skipped {
        warn!("{} is missing locally and will not be exported", url);
    }

    writer.set_comment(header.to_comment()?);
    writer.finish().map_err(zip_error)?;

    temp.persist(target).map_err(|e| PakError::Io {
        path: target.to_path_buf(),
        operation: "moving archive to",
        source: e.error,
    })?;

    let entries = written.len();
    info!(
        "Exported {} to {} ({} entries, {} skipped)",
        save.id(),
        target.display(),
        entries,
        skipped.len()
    );

    Ok(PakSummary {
        path: target.to_path_buf(),
        header,
        entries,
        assets,
        thumbnail,
        skipped,
    })
}
