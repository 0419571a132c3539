//! Reading and extracting paks

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use zip::ZipArchive;

use super::{PakError, PakHeader, Result, VerifyReport, verify_list};
use crate::document::{Document, ModDocument};
use crate::filesystem::FileSystem;

const THUMBNAIL_DIR: &str = "Thumbnails";

/// An open pak with a validated header
pub struct PakReader {
    path: PathBuf,
    archive: ZipArchive<File>,
    header: PakHeader,
    names: Vec<String>,
}

/// What an import wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub header: PakHeader,
    pub document_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    /// Every file written, document and thumbnail included
    pub extracted: Vec<PathBuf>,
    pub legacy_layout: bool,
}

impl PakReader {
    /// Open `path` and validate its header
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PakError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(PakError::io(path, "opening"))?;
        let mut archive = ZipArchive::new(file).map_err(|e| PakError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if archive.comment().is_empty() {
            return Err(PakError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
        let header = PakHeader::parse(archive.comment())?;

        let mut names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index).map_err(|e| PakError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            names.push(entry.name().to_string());
        }

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            header,
            names,
        })
    }

    pub fn header(&self) -> &PakHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in archive order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Read every entry to the end so the CRC of each is checked, and
    /// reject entry names that would escape the extraction root
    pub fn check_integrity(&mut self) -> Result<()> {
        for index in 0..self.archive.len() {
            let mut entry = self.archive.by_index(index).map_err(|e| PakError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            let name = entry.name().to_string();
            if entry.enclosed_name().is_none() {
                return Err(PakError::Corrupt {
                    path: self.path.clone(),
                    reason: format!("unsafe entry name '{name}'"),
                });
            }
            io::copy(&mut entry, &mut io::sink()).map_err(|e| PakError::Corrupt {
                path: self.path.clone(),
                reason: format!("{name}: {e}"),
            })?;
        }
        debug!("All {} entries of {} are intact", self.names.len(), self.path.display());
        Ok(())
    }

    /// Name of the single document entry for the header's save type
    pub fn document_entry(&self) -> Result<String> {
        let folder = self.header.save_type.folder();
        let prefix = format!("{folder}/");
        let direct: Vec<&str> = self
            .names
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .collect();

        if let Some(legacy) = direct.iter().find(|n| has_extension(n, "cjc")) {
            return Err(PakError::LegacyFormat {
                entry: format!("{prefix}{legacy}"),
            });
        }

        let documents: Vec<&str> = direct.into_iter().filter(|n| has_extension(n, "json")).collect();
        match documents.as_slice() {
            [] => Err(PakError::NoDocument {
                folder: folder.to_string(),
            }),
            [single] => Ok(format!("{prefix}{single}")),
            many => Err(PakError::AmbiguousDocument {
                folder: folder.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Parse the document entry
    pub fn read_document(&mut self) -> Result<Document> {
        let name = self.document_entry()?;
        let bytes = self.read_entry(&name)?;
        Ok(Document::parse(&bytes)?)
    }

    /// The thumbnail to keep: the one named after the id, else the first
    pub fn thumbnail_entry(&self) -> Option<&str> {
        let thumbnails: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|name| is_thumbnail(name))
            .collect();
        thumbnails
            .iter()
            .copied()
            .find(|name| basename(name).contains(self.header.id.as_str()))
            .or_else(|| thumbnails.first().copied())
    }

    /// Compare the archive's entries against its own document
    pub fn verify(&mut self) -> Result<VerifyReport> {
        let document = ModDocument::new(self.read_document()?);
        let legacy = self.header.uses_legacy_layout();
        if legacy {
            warn!(
                "{} uses the version {} layout; re-export it to migrate",
                self.path.display(),
                self.header.version
            );
        }
        Ok(verify_list(document.asset_map(), &self.names, legacy))
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name).map_err(|e| PakError::Corrupt {
            path: self.path.clone(),
            reason: format!("{name}: {e}"),
        })?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| PakError::Corrupt {
                path: self.path.clone(),
                reason: format!("{name}: {e}"),
            })?;
        Ok(bytes)
    }

    /// Write every entry under the filesystem's roots
    ///
    /// Nothing is written unless the whole archive passes its integrity
    /// check and contains exactly one readable document.
    pub fn extract(&mut self, filesystem: &FileSystem) -> Result<ImportSummary> {
        self.check_integrity()?;
        self.read_document()?;

        let header = self.header.clone();
        let document_entry = self.document_entry()?;
        let thumbnail = self.thumbnail_entry().map(str::to_string);
        let thumbnail_target = format!("{}/{}.png", header.save_type.folder(), header.id);

        let mut extracted = Vec::new();
        let mut document_path = None;
        let mut thumbnail_path = None;

        for index in 0..self.archive.len() {
            let mut entry = self.archive.by_index(index).map_err(|e| PakError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();

            let relative = if is_thumbnail(&name) {
                if thumbnail.as_deref() != Some(name.as_str()) {
                    debug!("Skipping extra thumbnail {}", name);
                    continue;
                }
                PathBuf::from(&thumbnail_target)
            } else {
                match entry.enclosed_name() {
                    Some(path) => path,
                    None => continue,
                }
            };

            let root = filesystem.root_for_entry(&name);
            let target = root.join(&relative);
            debug!("Extracting {} to {}", name, target.display());

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(PakError::io(parent, "creating"))?;
            }
            let mut out = File::create(&target).map_err(PakError::io(&target, "creating"))?;
            io::copy(&mut entry, &mut out).map_err(PakError::io(&target, "writing"))?;

            if name == document_entry {
                document_path = Some(target.clone());
            } else if thumbnail.as_deref() == Some(name.as_str()) {
                thumbnail_path = Some(target.clone());
            }
            extracted.push(target);
        }

        let document_path = document_path.ok_or_else(|| PakError::NoDocument {
            folder: header.save_type.folder().to_string(),
        })?;

        Ok(ImportSummary {
            legacy_layout: header.uses_legacy_layout(),
            header,
            document_path,
            thumbnail_path,
            extracted,
        })
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn is_thumbnail(name: &str) -> bool {
    let mut parts = name.rsplit('/');
    let file = parts.next().unwrap_or_default();
    !file.is_empty() && parts.next() == Some(THUMBNAIL_DIR)
}

/// Import the pak at `path` into `filesystem`
pub fn import_pak(filesystem: &FileSystem, path: &Path) -> Result<ImportSummary> {
    debug!("About to import {} into {}", path.display(), filesystem);

    let result = PakReader::open(path).and_then(|mut reader| {
        let header = reader.header();
        info!(
            "Extracting {} pak for id {} (pak version {})",
            header.save_type, header.id, header.version
        );
        if header.uses_legacy_layout() {
            warn!(
                "{} uses the version {} layout; re-export it to migrate",
                path.display(),
                header.version
            );
        }
        reader.extract(filesystem)
    });

    match &result {
        Ok(summary) => info!(
            "Imported {} successfully ({} files)",
            path.display(),
            summary.extracted.len()
        ),
        Err(e) => error!("Import of {} aborted: {}", path.display(), e),
    }
    result
}
