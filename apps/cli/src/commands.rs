//! Command handlers

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use tts_manager::downloader::{IntoProgressCallback, ProgressReporter};
use tts_manager::filesystem::standard_base_path;
use tts_manager::pak::{self, VerifyReport};
use tts_manager::{
    AssetCategory, DownloadConfig, FetcherRegistry, FileSystem, ModSaveLocation, Save, SaveType,
    catalog, open_store,
};

/// Prints one line per finished download to stderr
#[derive(Default)]
struct ConsoleProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl ConsoleProgress {
    fn tick(&self) -> (usize, usize) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        (done, self.total.load(Ordering::Relaxed))
    }
}

impl ProgressReporter for ConsoleProgress {
    fn on_batch_started(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    fn on_download_complete(&self, url: &str, path: &Path, final_size: u64) {
        let (done, total) = self.tick();
        eprintln!("[{done}/{total}] {url} -> {} ({final_size} bytes)", path.display());
    }

    fn on_error(&self, url: &str, error: &str) {
        let (done, total) = self.tick();
        eprintln!("[{done}/{total}] FAILED {url}: {error}");
    }
}

/// Filesystem from the command line overrides, else from preferences
pub fn filesystem(base_dir: Option<PathBuf>, mods_dir: Option<PathBuf>) -> Result<FileSystem> {
    let fs = match (base_dir, mods_dir) {
        (Some(base), Some(mods)) => FileSystem::with_paths(base, mods),
        (Some(base), None) => FileSystem::new(base),
        (None, Some(mods)) => {
            let base = standard_base_path().context("Unable to determine the data directory; pass --base-dir")?;
            FileSystem::with_paths(base, mods)
        }
        (None, None) => {
            let store = open_store().context("Unable to open preferences")?;
            let prefs = store
                .load()
                .with_context(|| format!("Unable to load preferences from {}", store.location()))?;
            prefs.filesystem().context("Unable to locate game data")?
        }
    };
    info!("Using {}", fs);
    Ok(fs)
}

pub fn list(fs: &FileSystem, save_type: SaveType) -> Result<bool> {
    let mods = catalog::describe_files_by_type(fs, save_type);
    if mods.is_empty() {
        eprintln!("No {} documents under {}", save_type, fs.type_folder(save_type).display());
        return Ok(true);
    }
    for summary in mods {
        println!("{}\t{}", summary.id, summary.name);
    }
    Ok(true)
}

fn load(fs: &FileSystem, id: &str, save_type: SaveType) -> Result<Save> {
    Save::load(fs, id, save_type).with_context(|| format!("Unable to load {save_type} {id}"))
}

pub fn show(fs: &FileSystem, id: &str, save_type: SaveType) -> Result<bool> {
    let save = load(fs, id, save_type)?;
    print!("{save}");

    let counts: Vec<String> = AssetCategory::ALL
        .into_iter()
        .map(|category| format!("{} {}", save.document().asset_map().count(category), category))
        .collect();
    println!("Assets: {}", counts.join(", "));
    println!(
        "{} of {} present",
        save.present().count(),
        save.handles().len()
    );
    Ok(save.is_installed())
}

pub async fn download(
    fs: &FileSystem,
    ids: Vec<String>,
    save_type: SaveType,
    all: bool,
    jobs: usize,
    timeout: u64,
) -> Result<bool> {
    let config = DownloadConfig::builder()
        .max_concurrent_downloads(jobs)
        .timeout(Duration::from_secs(timeout))
        .build()
        .context("Invalid download settings")?;
    let registry = FetcherRegistry::http(&config)?;
    let progress = ConsoleProgress::default().into_callback();

    let ids = if all { fs.get_filenames_by_type(save_type) } else { ids };
    let mut ok = true;
    for id in &ids {
        let summary = catalog::download_file(fs, id, save_type, &registry, &config, Some(progress.clone()))
            .await
            .with_context(|| format!("Unable to load {save_type} {id}"))?;

        if summary.all_succeeded() {
            println!("{id}: {} downloaded", summary.succeeded);
        } else {
            ok = false;
            println!(
                "{id}: {} of {} failed",
                summary.failed.len(),
                summary.attempted
            );
            for (url, error) in &summary.failed {
                println!("  {url}: {error}");
                if let Some(hint) = error.suggestion() {
                    println!("    {hint}");
                }
            }
        }
    }
    Ok(ok)
}

pub fn export(fs: &FileSystem, id: &str, save_type: SaveType, output: Option<PathBuf>) -> Result<bool> {
    let save = load(fs, id, save_type)?;
    let target = output.unwrap_or_else(|| PathBuf::from(format!("{id}.pak")));
    let summary = pak::export(&save, &target).with_context(|| format!("Export to {} failed", target.display()))?;

    println!(
        "Wrote {} ({} assets{})",
        summary.path.display(),
        summary.assets,
        if summary.thumbnail { ", thumbnail" } else { "" }
    );
    for url in &summary.skipped {
        println!("  skipped missing {url}");
    }
    Ok(summary.skipped.is_empty())
}

pub fn import(fs: &FileSystem, path: &Path) -> Result<bool> {
    let summary = pak::import_pak(fs, path).with_context(|| format!("Import of {} failed", path.display()))?;
    println!(
        "Imported {} {} ({} files) to {}",
        summary.header.save_type,
        summary.header.id,
        summary.extracted.len(),
        summary.document_path.display()
    );
    if summary.legacy_layout {
        println!("Pak uses an old layout; export it again to update it");
    }
    Ok(true)
}

pub fn verify_pak(path: &Path) -> Result<bool> {
    let report = pak::verify_pak(path).with_context(|| format!("Unable to verify {}", path.display()))?;
    print_report(&report);
    Ok(report.is_complete())
}

pub fn verify_installed(fs: &FileSystem, id: Option<String>, save_type: SaveType, legacy: bool) -> Result<bool> {
    let Some(id) = id else {
        bail!("Pass a pak file or --id");
    };
    let save = load(fs, &id, save_type)?;
    let report = pak::verify_dir(save.document().asset_map(), fs.data_path(), legacy);
    print_report(&report);
    Ok(report.is_complete())
}

fn print_report(report: &VerifyReport) {
    for category in [
        AssetCategory::Image,
        AssetCategory::Model,
        AssetCategory::Pdf,
        AssetCategory::Bundle,
    ] {
        for url in report.missing(category) {
            println!("missing {category}: {url}");
        }
    }
    println!(
        "{} of {} assets found ({} entries checked)",
        report.found, report.total, report.entries
    );
}

pub fn prefs(
    mod_location: Option<ModSaveLocation>,
    tts_location: Option<PathBuf>,
    validate: bool,
    reset: bool,
) -> Result<bool> {
    let store = open_store().context("Unable to open preferences")?;
    let mut prefs = if reset {
        store.reset().context("Unable to reset preferences")?
    } else {
        store
            .load()
            .with_context(|| format!("Unable to load preferences from {}", store.location()))?
    };

    if let Some(location) = mod_location {
        prefs.set_mod_save_pref(location);
    }
    if let Some(path) = tts_location {
        prefs.set_tts_location(path);
    }
    if prefs.changed() {
        store.save(&mut prefs).context("Unable to save preferences")?;
        eprintln!("Saved to {}", store.location());
    }

    println!("{prefs}");
    println!("Effective mod location: {}", prefs.mod_save_location());

    if validate {
        let valid = prefs.validate().context("Unable to locate game data")?;
        if valid {
            println!("Preferences validated OK.");
        } else {
            warn!("Unable to find some directories");
            println!("Unable to find some directories - please check your settings.");
        }
        return Ok(valid);
    }
    Ok(true)
}
