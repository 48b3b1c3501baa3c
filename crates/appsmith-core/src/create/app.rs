//! Application creation.
//!
//! Orchestrates one end-to-end generation run: destination handling, shared
//! package extraction for add-ons not yet installed as shared, metadata
//! aggregation, pre/post hooks, the classified folder walk, and registration
//! in the creation-tracking store.

use super::shared::SharedPackageCreator;
use super::{emit_items, resolve_destination, walk_entity_tree, CollisionPrompt, EmitOptions};
use crate::catalog::{FrameworkCatalog, PackageCatalog};
use crate::config::{ConfigRegistry, InstallKind};
use crate::error::Result;
use crate::hooks::{HookContext, HookKind, HookRegistry};
use crate::metadata::Aggregator;
use crate::render::{app_context, TemplateRenderer};
use crate::store::{AppRecord, TrackingStore};
use chrono::Utc;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;

/// Outcome of an application build.
#[derive(Debug, Clone)]
pub struct CreatedApp {
    /// Final application name (may differ from the requested one after a
    /// rename at the overwrite prompt).
    pub name: String,
    pub dir: PathBuf,
    pub port: u16,
    pub framework: String,
    /// Shared package names this application depends on.
    pub shared_packages: Vec<String>,
}

/// Builds one application directory tree.
pub struct AppCreator<'a> {
    pub config: &'a ConfigRegistry,
    pub frameworks: &'a FrameworkCatalog,
    pub packages: &'a PackageCatalog,
    pub hooks: &'a HookRegistry,
    pub renderer: &'a TemplateRenderer,
    pub store: &'a TrackingStore,
    pub prompt: &'a dyn CollisionPrompt,
    pub quiet: bool,
}

impl<'a> AppCreator<'a> {
    pub async fn create(&self) -> Result<CreatedApp> {
        let framework = self.frameworks.get(&self.config.framework)?;

        let (app_name, destination) =
            resolve_destination(&self.config.paths.apps_dir, &self.config.app_name, self.prompt)
                .await?;

        let port = self.store.allocate_port(&app_name, self.config.port).await?;

        if !self.quiet {
            println!(
                "{} application {} ({}, port {})",
                "Creating".cyan().bold(),
                app_name,
                framework.display_name(),
                port
            );
        }

        // Shared extraction happens before the folder walk so the synthetic
        // dependency targets an installed package, under its final name even
        // after a rename at the collision prompt.
        let installed_shared = self.ensure_shared_packages(&app_name).await?;
        let shared_packages: Vec<String> = installed_shared
            .iter()
            .map(|(_, shared)| shared.clone())
            .collect();
        let shared_names: BTreeMap<String, String> = installed_shared.into_iter().collect();

        let aggregator = Aggregator::new(
            self.config,
            self.frameworks,
            self.packages,
            self.hooks,
            self.renderer,
        );
        let metadata = aggregator.resolve_app(framework, &shared_names).await?;

        let hook_ctx = HookContext {
            config: self.config,
            frameworks: self.frameworks,
            packages: self.packages,
        };
        self.hooks
            .invoke(framework.name(), HookKind::PreInstall, &hook_ctx)?;

        fs::create_dir_all(&destination).await?;

        let items = walk_entity_tree(framework.dir())?;
        let ctx = app_context(self.config, framework, &app_name, port, &metadata);
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
            .invoke(framework.name(), HookKind::PostInstall, &hook_ctx)?;

        self.store
            .register_app(AppRecord {
                name: app_name.clone(),
                port,
                framework: framework.name().to_string(),
                shared_packages: shared_packages.clone(),
                created_at: Utc::now(),
            })
            .await?;

        Ok(CreatedApp {
            name: app_name,
            dir: destination,
            port,
            framework: framework.name().to_string(),
            shared_packages,
        })
    }

    /// Create every selected shared add-on that isn't installed yet; mark
    /// reuse on the ones that are. Returns `(add-on name, installed shared
    /// name)` pairs in selection order; the installed name is authoritative
    /// for the synthetic dependency.
    async fn ensure_shared_packages(&self, app_name: &str) -> Result<Vec<(String, String)>> {
        let mut installed = Vec::new();

        for selection in &self.config.selected_packages {
            let InstallKind::Shared { .. } = selection.install else {
                continue;
            };
            let package = self.packages.get(&selection.name)?;

            if let Some(existing) = self.store.find_shared_for_package(package.name()).await? {
                if !self.quiet {
                    println!(
                        "  {} reusing shared package {}",
                        "->".blue(),
                        existing.name
                    );
                }
                self.store
                    .mark_shared_used_by(&existing.name, app_name)
                    .await?;
                installed.push((selection.name.clone(), existing.name));
                continue;
            }

            let creator = SharedPackageCreator {
                config: self.config,
                frameworks: self.frameworks,
                packages: self.packages,
                hooks: self.hooks,
                renderer: self.renderer,
                store: self.store,
                prompt: self.prompt,
                quiet: self.quiet,
            };
            let created = creator.create(package, app_name).await?;
            installed.push((selection.name.clone(), created.name));
        }

        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SelectedPackage, WorkspacePaths};
    use crate::create::{AbortOnCollision, AlwaysOverwrite};
    use crate::render::TemplateRenderer;
    use std::fs;
    use std::path::Path;

    fn write_entity(catalog: &Path, name: &str, descriptor: &str, files: &[(&str, &str)]) {
        let dir = catalog.join(name);
        fs::create_dir_all(dir.join("files")).unwrap();
        fs::write(dir.join("config.json"), descriptor).unwrap();
        for (rel, content) in files {
            let path = dir.join("files").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn seed_catalog(catalog: &Path) {
        write_entity(
            catalog,
            "express",
            r#"{
                "type": "framework",
                "name": "express",
                "displayName": "Express",
                "dependencies": [{ "name": "express", "value": "^4.18.0" }]
            }"#,
            &[
                (
                    "package.json.hbs",
                    "{\n  \"name\": \"{{appName}}\",\n  \"dependencies\": {\n{{dependencyBlock dependencies}}\n  }\n}",
                ),
                (".env.example.hbs", "PORT=\"{{port}}\"\n"),
                ("src/index.ts.hbs", "// {{appName}} on {{port}}\n"),
                ("assets/logo.svg", "<svg/>"),
            ],
        );
        write_entity(
            catalog,
            "db-access",
            r#"{
                "type": "package",
                "name": "db-access",
                "displayName": "Database Access",
                "version": "1.2.0",
                "shareable": true,
                "defaultSharedName": "db",
                "dependencies": [
                    { "name": "mongoose", "value": "^8.0.0", "addInApp": false, "addInShared": true }
                ]
            }"#,
            &[("index.ts.hbs", "export const name = \"{{sharedName}}\";\n")],
        );
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        config: ConfigRegistry,
        frameworks: FrameworkCatalog,
        packages: PackageCatalog,
        store: TrackingStore,
    }

    async fn fixture(selections: Vec<SelectedPackage>) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = tmp.path().join("templates");
        seed_catalog(&catalog);

        let paths = WorkspacePaths::conventional(tmp.path(), &catalog);
        let store = TrackingStore::new(paths.tracking_file());
        let mut config = ConfigRegistry::new("shop", "express", paths);
        config.selected_packages = selections;

        Fixture {
            frameworks: FrameworkCatalog::load(&catalog).await.unwrap(),
            packages: PackageCatalog::load(&catalog).await.unwrap(),
            config,
            store,
            _tmp: tmp,
        }
    }

    fn creator<'a>(fx: &'a Fixture, hooks: &'a HookRegistry, renderer: &'a TemplateRenderer, prompt: &'a dyn CollisionPrompt) -> AppCreator<'a> {
        AppCreator {
            config: &fx.config,
            frameworks: &fx.frameworks,
            packages: &fx.packages,
            hooks,
            renderer,
            store: &fx.store,
            prompt,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn create_renders_templates_and_copies_assets() {
        let fx = fixture(Vec::new()).await;
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let created = creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap();

        assert_eq!(created.name, "shop");
        assert_eq!(created.port, 3001);

        let index = fs::read_to_string(created.dir.join("src/index.ts")).unwrap();
        assert_eq!(index, "// shop on 3001\n");
        assert_eq!(
            fs::read_to_string(created.dir.join("assets/logo.svg")).unwrap(),
            "<svg/>"
        );
        // No raw template files in the output
        assert!(!created.dir.join("src/index.ts.hbs").exists());
    }

    #[tokio::test]
    async fn manifest_renders_with_merged_dependencies() {
        let fx = fixture(Vec::new()).await;
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let created = creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap();

        let manifest = fs::read_to_string(created.dir.join("package.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed["name"], "shop");
        assert_eq!(parsed["dependencies"]["express"], "^4.18.0");
    }

    #[tokio::test]
    async fn env_template_writes_example_and_live_pair() {
        let fx = fixture(Vec::new()).await;
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let created = creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap();

        let example = fs::read_to_string(created.dir.join(".env.example")).unwrap();
        let live = fs::read_to_string(created.dir.join(".env")).unwrap();
        assert_eq!(example, "PORT=\"3001\"\n");
        assert_eq!(example, live);
    }

    #[tokio::test]
    async fn shared_selection_creates_package_and_tracks_usage() {
        let fx = fixture(vec![SelectedPackage::shared(
            "db-access",
            "db",
            "Data access",
        )])
        .await;
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let created = creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap();

        assert_eq!(created.shared_packages, vec!["db"]);
        let shared_index =
            fs::read_to_string(fx.config.paths.shared_dir.join("db/index.ts")).unwrap();
        assert_eq!(shared_index, "export const name = \"db\";\n");

        let data = fx.store.load().await.unwrap();
        assert_eq!(data.shared_packages.len(), 1);
        assert_eq!(data.shared_packages[0].name, "db");
        assert_eq!(data.shared_packages[0].base_package, "db-access");
        assert_eq!(data.shared_packages[0].used_by, vec!["shop"]);
        assert_eq!(data.created_apps[0].shared_packages, vec!["db"]);
    }

    struct RenameOnCollision;

    impl CollisionPrompt for RenameOnCollision {
        fn on_collision(
            &self,
            name: &str,
            _destination: &std::path::Path,
        ) -> crate::error::Result<crate::create::OverwriteChoice> {
            Ok(crate::create::OverwriteChoice::Rename(format!(
                "{name}-renamed"
            )))
        }
    }

    #[tokio::test]
    async fn renamed_shared_package_drives_the_manifest_dependency() {
        let fx = fixture(vec![SelectedPackage::shared(
            "db-access",
            "db",
            "Data access",
        )])
        .await;
        // Unrelated folder already occupies the selected shared name
        fs::create_dir_all(fx.config.paths.shared_dir.join("db")).unwrap();

        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let created = creator(&fx, &hooks, &renderer, &RenameOnCollision)
            .create()
            .await
            .unwrap();

        assert_eq!(created.shared_packages, vec!["db-renamed"]);

        let manifest = fs::read_to_string(created.dir.join("package.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed["dependencies"]["@shared/db-renamed"], "1.2.0");
        assert!(parsed["dependencies"].get("@shared/db").is_none());

        let data = fx.store.load().await.unwrap();
        assert_eq!(data.shared_packages[0].name, "db-renamed");
    }

    #[tokio::test]
    async fn second_app_reuses_the_installed_shared_package() {
        let fx = fixture(vec![SelectedPackage::shared(
            "db-access",
            "db",
            "Data access",
        )])
        .await;
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap();

        let mut second = fx.config.clone();
        second.app_name = "admin".to_string();
        let admin = AppCreator {
            config: &second,
            ..creator(&fx, &hooks, &renderer, &AbortOnCollision)
        }
        .create()
        .await
        .unwrap();

        assert_eq!(admin.shared_packages, vec!["db"]);
        let data = fx.store.load().await.unwrap();
        // Still one shared package, now used by both apps
        assert_eq!(data.shared_packages.len(), 1);
        assert_eq!(data.shared_packages[0].used_by, vec!["shop", "admin"]);
    }

    #[tokio::test]
    async fn existing_destination_aborts_without_changes() {
        let fx = fixture(Vec::new()).await;
        let existing = fx.config.paths.apps_dir.join("shop");
        fs::create_dir_all(existing.join("src")).unwrap();
        fs::write(existing.join("src/keep.ts"), "keep").unwrap();

        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let err = creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap_err();

        assert!(err.is_abort());
        assert_eq!(
            fs::read_to_string(existing.join("src/keep.ts")).unwrap(),
            "keep"
        );
    }

    #[tokio::test]
    async fn overwrite_replaces_the_destination() {
        let fx = fixture(Vec::new()).await;
        let existing = fx.config.paths.apps_dir.join("shop");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("stale.txt"), "old").unwrap();

        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let created = creator(&fx, &hooks, &renderer, &AlwaysOverwrite)
            .create()
            .await
            .unwrap();

        assert!(!created.dir.join("stale.txt").exists());
        assert!(created.dir.join("src/index.ts").exists());
    }

    #[tokio::test]
    async fn pre_and_post_hooks_run_in_order() {
        use std::sync::atomic::{AtomicU8, Ordering};
        use std::sync::Arc;

        let fx = fixture(Vec::new()).await;
        let calls = Arc::new(AtomicU8::new(0));
        let mut hooks = HookRegistry::new();
        {
            let calls = calls.clone();
            hooks.register("express", HookKind::PreInstall, move |_| {
                calls.fetch_or(0b01, Ordering::SeqCst);
                Ok(crate::hooks::HookOutput::Done)
            });
        }
        {
            let calls = calls.clone();
            hooks.register("express", HookKind::PostInstall, move |ctx| {
                anyhow::ensure!(ctx.config.app_name == "shop");
                calls.fetch_or(0b10, Ordering::SeqCst);
                Ok(crate::hooks::HookOutput::Done)
            });
        }

        let renderer = TemplateRenderer::new();
        creator(&fx, &hooks, &renderer, &AbortOnCollision)
            .create()
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0b11);
    }
}
