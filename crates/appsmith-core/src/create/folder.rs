//! Template tree discovery and classification.
//!
//! Classification is a pure function of the entry name, computed once at
//! discovery time and immutable afterward. The walk is sorted by file name so
//! a re-run against identical inputs visits entries in identical order.

use crate::catalog::{DESCRIPTOR_FILE, FILES_DIR};
use crate::error::Result;
use crate::render::TEMPLATE_SUFFIX;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manifest file name written into generated applications and packages.
pub const MANIFEST_FILE: &str = "package.json";

/// A filesystem entry discovered under a template staging tree.
#[derive(Debug, Clone)]
pub struct FolderItem {
    /// Absolute path of the source entry.
    pub path: PathBuf,
    /// Path relative to the entity directory (starts with the staging prefix).
    pub relative: PathBuf,
    pub is_folder: bool,
    pub is_template: bool,
    pub is_env_file: bool,
    pub is_package_json_file: bool,
    pub is_config_file: bool,
    pub is_readme_file: bool,
}

impl FolderItem {
    /// Classify an entry from its name alone.
    pub fn classify(path: PathBuf, relative: PathBuf, is_folder: bool) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let base = file_name
            .strip_suffix(TEMPLATE_SUFFIX)
            .unwrap_or(&file_name);
        let is_template = !is_folder && file_name.ends_with(TEMPLATE_SUFFIX);
        // Exactly `.env` or a dotted variant; `.envrc` is a plain file
        let is_env_file = !is_folder && (base == ".env" || base.starts_with(".env."));
        let is_package_json_file = !is_folder && base == MANIFEST_FILE;
        let is_config_file = !is_folder && file_name == DESCRIPTOR_FILE;
        let is_readme_file = !is_folder && base.eq_ignore_ascii_case("README.md");

        Self {
            path,
            relative,
            is_folder,
            is_template,
            is_env_file,
            is_package_json_file,
            is_config_file,
            is_readme_file,
        }
    }

    /// Destination path relative to the generated root: the staging prefix
    /// segment is stripped, as is the template suffix.
    pub fn output_relative(&self) -> PathBuf {
        let stripped = self
            .relative
            .strip_prefix(FILES_DIR)
            .unwrap_or(&self.relative);
        let mut out = stripped.to_path_buf();
        if self.is_template {
            if let Some(name) = out.file_name().map(|n| n.to_string_lossy().to_string()) {
                if let Some(base) = name.strip_suffix(TEMPLATE_SUFFIX) {
                    out.set_file_name(base);
                }
            }
        }
        out
    }

    /// For env entries: names of the example file and the live file, both
    /// written from the same rendered content.
    pub fn env_output_names(&self) -> (PathBuf, PathBuf) {
        let base = self.output_relative();
        let name = base
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let (example, live) = if name.contains(".example") {
            (name.clone(), name.replace(".example", ""))
        } else {
            (format!("{name}.example"), name)
        };

        let mut example_path = base.clone();
        example_path.set_file_name(example);
        let mut live_path = base;
        live_path.set_file_name(live);
        (example_path, live_path)
    }
}

/// Walk an entity's staging tree and classify every entry. Returns items in
/// deterministic name order; the staging root itself is not included.
pub fn walk_entity_tree(entity_dir: &Path) -> Result<Vec<FolderItem>> {
    let files_root = entity_dir.join(FILES_DIR);
    if !files_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(&files_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(entity_dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        items.push(FolderItem::classify(
            entry.path().to_path_buf(),
            relative,
            entry.file_type().is_dir(),
        ));
    }
    Ok(items)
}
