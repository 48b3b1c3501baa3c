//! End-to-end creation of application and shared-package directory trees.
//!
//! Destination-folder collisions are handled by a small state machine entered
//! once per `create()`: check existence, then either build, or ask the
//! injected prompt for one of exit / rename / overwrite. The folder walk
//! itself is a pure mapping from the classified source tree to the
//! destination given a fixed render context.

pub mod app;
pub mod folder;
pub mod shared;

pub use app::{AppCreator, CreatedApp};
pub use folder::{walk_entity_tree, FolderItem, MANIFEST_FILE};
pub use shared::{CreatedSharedPackage, SharedPackageCreator};

use crate::error::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Terminal choices of the overwrite prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteChoice {
    /// Abort the run with no changes made.
    Exit,
    /// Try again under a different destination name.
    Rename(String),
    /// Recursively delete the existing destination, then build.
    Overwrite,
}

/// Collaborator deciding what to do when the destination already exists.
/// The interactive implementation lives behind the `tui` feature; tests and
/// non-interactive callers inject their own.
pub trait CollisionPrompt {
    fn on_collision(&self, name: &str, destination: &Path) -> Result<OverwriteChoice>;
}

/// Default prompt for non-interactive runs: never destroys anything.
pub struct AbortOnCollision;

impl CollisionPrompt for AbortOnCollision {
    fn on_collision(&self, _name: &str, _destination: &Path) -> Result<OverwriteChoice> {
        Ok(OverwriteChoice::Exit)
    }
}

/// Always overwrite. Useful for scripted re-generation.
pub struct AlwaysOverwrite;

impl CollisionPrompt for AlwaysOverwrite {
    fn on_collision(&self, _name: &str, _destination: &Path) -> Result<OverwriteChoice> {
        Ok(OverwriteChoice::Overwrite)
    }
}

/// Run the destination state machine. Returns the final (possibly renamed)
/// name and a destination path guaranteed not to exist: the `overwrite`
/// branch deletes before this function returns.
pub async fn resolve_destination(
    parent: &Path,
    initial_name: &str,
    prompt: &dyn CollisionPrompt,
) -> Result<(String, PathBuf)> {
    let mut name = initial_name.to_string();
    loop {
        let destination = parent.join(&name);
        if !destination.exists() {
            return Ok((name, destination));
        }

        match prompt.on_collision(&name, &destination)? {
            OverwriteChoice::Exit => return Err(Error::Aborted),
            OverwriteChoice::Rename(new_name) => {
                name = new_name;
            }
            OverwriteChoice::Overwrite => {
                fs::remove_dir_all(&destination).await?;
                return Ok((name, destination));
            }
        }
    }
}

/// How the walk dispatcher renders template entries.
pub(crate) struct EmitOptions<'a, C: Serialize> {
    pub renderer: &'a crate::render::TemplateRenderer,
    pub context: &'a C,
    pub quiet: bool,
}

/// Walk classified items into the destination: folders are created, template
/// entries are rendered with path rewriting, env entries render once and
/// write an example/live file pair, and everything else is byte-copied
/// verbatim. Manifest and readme entries go through the renderer even
/// without the template suffix, so a catalog shipping a plain
/// `package.json` still gets its placeholders substituted.
pub(crate) async fn emit_items<C: Serialize>(
    items: &[FolderItem],
    destination: &Path,
    opts: &EmitOptions<'_, C>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for item in items {
        if item.is_config_file {
            continue;
        }

        if item.is_folder {
            fs::create_dir_all(destination.join(item.output_relative())).await?;
            continue;
        }

        if item.is_env_file {
            let content = opts.renderer.render_file(&item.path, opts.context).await?;
            let (example, live) = item.env_output_names();
            for rel in [example, live] {
                let target = destination.join(&rel);
                write_output(&target, content.as_bytes(), opts.quiet).await?;
                written.push(rel);
            }
            continue;
        }

        if item.is_template || item.is_package_json_file || item.is_readme_file {
            let content = opts.renderer.render_file(&item.path, opts.context).await?;
            let rel = item.output_relative();
            let target = destination.join(&rel);
            write_output(&target, content.as_bytes(), opts.quiet).await?;
            written.push(rel);
            continue;
        }

        // Static asset: copy bytes verbatim
        let rel = item.output_relative();
        let target = destination.join(&rel);
        let bytes = fs::read(&item.path).await?;
        write_output(&target, &bytes, opts.quiet).await?;
        written.push(rel);
    }

    Ok(written)
}

async fn write_output(target: &Path, bytes: &[u8], quiet: bool) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(target, bytes).await?;
    if !quiet {
        println!("  {} {}", "+".green(), target.display());
    }
    Ok(())
}
