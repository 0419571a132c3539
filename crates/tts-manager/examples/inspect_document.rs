//! Example listing the assets a mod document references
//!
//! Prints each categorised asset with the relative path the game caches it
//! under, then any URLs found outside the known asset fields.
//!
//! Run this example with:
//! ```
//! cargo run --example inspect_document -- path/to/mod.json
//! ```

use std::path::PathBuf;
use tts_manager::{Document, ModDocument};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: inspect_document <file.json>")?;

    let document = ModDocument::new(Document::load(&path)?);
    println!(
        "{} ({} assets)",
        document.name().unwrap_or("<unnamed>"),
        document.total_assets()
    );

    for (category, url, relative) in document.asset_map().iter() {
        println!("{:>12}  {}  {}", category.label(), relative, url);
    }

    let unclassified: Vec<String> = document
        .urls()
        .into_iter()
        .filter(|url| !document.asset_map().contains_url(url))
        .collect();
    if !unclassified.is_empty() {
        println!("\nOther URLs:");
        for url in unclassified {
            println!("  {url}");
        }
    }
    Ok(())
}
