//! Catalog loading and entity lookup.
//!
//! The template catalog is a read-only directory tree with one subdirectory
//! per framework and one per add-on package. Both catalogs scan the same root;
//! each descriptor self-identifies its kind. A malformed descriptor is skipped
//! with a warning, a missing catalog root is fatal.

pub mod descriptor;
pub mod framework;
pub mod package;

pub use descriptor::{
    CommonFields, Descriptor, FrameworkDescriptor, PackageDescriptor, PromptDef, RecordDef,
    DESCRIPTOR_FILE, FILES_DIR,
};
pub use framework::{Framework, FrameworkCatalog};
pub use package::{Package, PackageCatalog};

use crate::error::{Error, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Scan the catalog root and parse every descriptor file found one level
/// below it. Returns entries sorted by directory name so load order (and
/// therefore everything derived from it) is deterministic.
pub(crate) async fn scan_descriptors(root: &Path) -> Result<Vec<(PathBuf, Descriptor)>> {
    if !root.is_dir() {
        return Err(Error::CatalogRootMissing {
            path: root.to_path_buf(),
        });
    }

    let mut dirs = Vec::new();
    let mut entries = fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut found = Vec::new();
    for dir in dirs {
        let descriptor_path = dir.join(DESCRIPTOR_FILE);
        if !descriptor_path.is_file() {
            continue;
        }

        let content = match fs::read_to_string(&descriptor_path).await {
            Ok(content) => content,
            Err(e) => {
                warn_skipped(&descriptor_path, &e.to_string());
                continue;
            }
        };

        match serde_json::from_str::<Descriptor>(&content) {
            Ok(descriptor) => found.push((dir, descriptor)),
            Err(e) => warn_skipped(&descriptor_path, &e.to_string()),
        }
    }

    Ok(found)
}

fn warn_skipped(path: &Path, message: &str) {
    eprintln!(
        "{} Skipping descriptor {}: {}",
        "Warning:".yellow(),
        path.display(),
        message
    );
}
