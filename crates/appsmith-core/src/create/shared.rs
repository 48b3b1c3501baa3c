//! Shared-package creation.
//!
//! A shareable add-on selected as "shared" is extracted into its own package
//! under the workspace's shared-packages root, so multiple applications can
//! depend on one installed copy. Creation runs the same destination state
//! machine and folder walk as applications, rooted at the add-on's own
//! template directory.

use super::{emit_items, resolve_destination, walk_entity_tree, CollisionPrompt, EmitOptions};
use crate::catalog::{FrameworkCatalog, Package, PackageCatalog};
use crate::config::ConfigRegistry;
use crate::error::Result;
use crate::hooks::{HookContext, HookKind, HookRegistry};
use crate::metadata::Aggregator;
use crate::render::{package_context, TemplateRenderer};
use crate::store::TrackingStore;
use colored::Colorize;
use std::path::PathBuf;
use tokio::fs;

/// Outcome of a shared-package build.
#[derive(Debug, Clone)]
pub struct CreatedSharedPackage {
    /// Final shared package name (without namespace prefix).
    pub name: String,
    /// Add-on package it was extracted from.
    pub base_package: String,
    pub dir: PathBuf,
}

/// Builds one shared package directory tree.
pub struct SharedPackageCreator<'a> {
    pub config: &'a ConfigRegistry,
    pub frameworks: &'a FrameworkCatalog,
    pub packages: &'a PackageCatalog,
    pub hooks: &'a HookRegistry,
    pub renderer: &'a TemplateRenderer,
    pub store: &'a TrackingStore,
    pub prompt: &'a dyn CollisionPrompt,
    pub quiet: bool,
}

impl<'a> SharedPackageCreator<'a> {
    /// Create the shared package for `package` and register it in the
    /// tracking store with `used_by` as its first user.
    pub async fn create(&self, package: &Package, used_by: &str) -> Result<CreatedSharedPackage> {
        let aggregator = Aggregator::new(
            self.config,
            self.frameworks,
            self.packages,
            self.hooks,
            self.renderer,
        );
        let (shared_name, shared_description) = aggregator.shared_identity(package);

        let (shared_name, destination) =
            resolve_destination(&self.config.paths.shared_dir, &shared_name, self.prompt).await?;

        if !self.quiet {
            println!(
                "{} shared package {} (from {})",
                "Creating".cyan().bold(),
                shared_name,
                package.name()
            );
        }

        fs::create_dir_all(&destination).await?;

        let metadata = aggregator.resolve_shared(package).await?;

        let hook_ctx = HookContext {
            config: self.config,
            frameworks: self.frameworks,
            packages: self.packages,
        };
        self.hooks
            .invoke(package.name(), HookKind::PreInstall, &hook_ctx)?;

        let items = walk_entity_tree(package.dir())?;
        let ctx = package_context(
            self.config,
            package,
            &shared_name,
            &shared_description,
            &metadata,
        );
        emit_items(
            &items,
            &destination,
            &EmitOptions {
                renderer: self.renderer,
                context: &ctx,
                quiet: self.quiet,
            },
        )
        .await?;

        self.hooks
            .invoke(package.name(), HookKind::PostInstall, &hook_ctx)?;

        self.store
            .register_shared_package(&shared_name, package.name(), used_by)
            .await?;

        Ok(CreatedSharedPackage {
            name: shared_name,
            base_package: package.name().to_string(),
            dir: destination,
        })
    }
}
