//! Looking up installed documents by id and type

use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::document::{self, Document, SaveType};
use crate::downloader::{DownloadConfig, DownloadSummary, FetcherRegistry, ProgressCallback};
use crate::filesystem::FileSystem;
use crate::save::Save;

/// Name and id of one installed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModSummary {
    pub id: String,
    pub name: String,
}

/// Load a document, logging instead of failing
pub fn load_document(path: &Path) -> Option<Document> {
    if !path.is_file() {
        error!("Unable to find requested file {}", path.display());
        return None;
    }
    info!("Loading json file {}", path.display());
    match Document::load(path) {
        Ok(document) => Some(document),
        Err(e) => {
            error!("Unable to load {} [{}]: {}", path.display(), e.category(), e);
            None
        }
    }
}

/// Load the document for `id` of `save_type`
pub fn load_file_by_type(filesystem: &FileSystem, id: &str, save_type: SaveType) -> Option<Document> {
    load_document(&filesystem.get_json_filename_for_type(id, save_type))
}

/// Every readable document of `save_type`, sorted by name then id
///
/// Documents without a `SaveName` are listed under their id; unreadable
/// ones are skipped.
pub fn describe_files_by_type(filesystem: &FileSystem, save_type: SaveType) -> Vec<ModSummary> {
    let ids = filesystem.get_filenames_by_type(save_type);
    debug!("Describing {} {} documents", ids.len(), save_type);

    let mut mods: Vec<ModSummary> = ids
        .into_par_iter()
        .filter_map(|id| {
            let path = filesystem.get_json_filename_for_type(&id, save_type);
            match Document::load(&path) {
                Ok(document) => {
                    let name = document.save_name().unwrap_or(&id).to_string();
                    Some(ModSummary { id, name })
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    mods.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    mods
}

/// Download every missing asset of one installed document
pub async fn download_file(
    filesystem: &FileSystem,
    id: &str,
    save_type: SaveType,
    registry: &FetcherRegistry,
    config: &DownloadConfig,
    progress: Option<ProgressCallback>,
) -> document::Result<DownloadSummary> {
    info!("Downloading {} file {} (from {})", save_type, id, filesystem);
    let mut save = Save::load(filesystem, id, save_type)?;

    if save.is_installed() {
        info!("All files already downloaded.");
        return Ok(DownloadSummary::default());
    }

    let summary = save.download_all(registry, config, progress).await;
    if summary.all_succeeded() {
        info!("All files downloaded.");
    } else {
        warn!("Some files failed to download.");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    fn write(path: &Path, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_describe_sorts_by_name() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        write(
            &fs.get_json_filename_for_type("1", SaveType::Workshop),
            r#"{"SaveName":"Zombies","ObjectStates":[]}"#,
        );
        write(
            &fs.get_json_filename_for_type("2", SaveType::Workshop),
            r#"{"SaveName":"Chess","ObjectStates":[]}"#,
        );
        write(
            &fs.get_json_filename_for_type("3", SaveType::Workshop),
            r#"{"ObjectStates":[]}"#,
        );
        write(&fs.get_json_filename_for_type("4", SaveType::Workshop), "not json");

        let mods = describe_files_by_type(&fs, SaveType::Workshop);
        let listed: Vec<(&str, &str)> = mods.iter().map(|m| (m.name.as_str(), m.id.as_str())).collect();
        assert_eq!(listed, vec![("3", "3"), ("Chess", "2"), ("Zombies", "1")]);
        assert!(describe_files_by_type(&fs, SaveType::Chest).is_empty());
    }

    #[test]
    fn test_load_file_by_type() {
        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        write(
            &fs.get_json_filename_for_type("TS_Save_1", SaveType::Save),
            r#"{"SaveName":"Game night"}"#,
        );
        write(&fs.get_json_filename_for_type("broken", SaveType::Save), "{");

        let document = load_file_by_type(&fs, "TS_Save_1", SaveType::Save).unwrap();
        assert_eq!(document.save_name(), Some("Game night"));
        assert!(load_file_by_type(&fs, "missing", SaveType::Save).is_none());
        assert!(load_file_by_type(&fs, "broken", SaveType::Save).is_none());
    }

    #[tokio::test]
    async fn test_download_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"v 0 0 0".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let fs = FileSystem::new(dir.path());
        write(
            &fs.get_json_filename_for_type("5", SaveType::Chest),
            &format!(
                r#"{{"ObjectStates":[{{"CustomMesh":{{"MeshURL":"{}/m.obj"}}}}]}}"#,
                server.uri()
            ),
        );

        let config = DownloadConfig::default();
        let registry = FetcherRegistry::http(&config).unwrap();
        let summary = download_file(&fs, "5", SaveType::Chest, &registry, &config, None)
            .await
            .unwrap();
        assert_eq!(summary.attempted, 1);
        assert!(summary.all_succeeded());

        let again = download_file(&fs, "5", SaveType::Chest, &registry, &config, None)
            .await
            .unwrap();
        assert_eq!(again.attempted, 0);

        assert!(
            download_file(&fs, "nope", SaveType::Chest, &registry, &config, None)
                .await
                .is_err()
        );
    }
}
