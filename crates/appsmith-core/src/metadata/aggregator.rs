//! Metadata aggregation.
//!
//! For a framework or package, contributions are collected from four sources
//! in a fixed order that defines override order downstream:
//!
//! 1. records declared on the catalog descriptor (origin `config`);
//! 2. the entity's executable hook, if registered (origin `executable`);
//! 3. the entity's rendered manifest template, if present (origin `template`);
//! 4. application aggregation only: every selected add-on package, steps 1-3
//!    each, plus one synthetic dependency per shared-installed add-on pointing
//!    at the shared package's namespaced name.
//!
//! The aggregator filters by scope but never deduplicates; every surviving
//! record keeps its origin tag.

use super::{
    Origin, OriginKind, OriginScope, Record, RecordKind, ResolvedMetadata, Scope, SourceBundles,
    RECORD_KINDS,
};
use crate::catalog::{
    CommonFields, Framework, FrameworkCatalog, Package, PackageCatalog, RecordDef,
};
use crate::config::{ConfigRegistry, InstallKind, PORT_BASE};
use crate::error::{Error, Result};
use crate::hooks::{HookContext, HookKind, HookRegistry};
use crate::render::{app_context, package_context, TemplateRenderer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Manifest template consulted during step 3.
const MANIFEST_TEMPLATE: &str = "package.json.hbs";

/// Environment template consulted during step 3 for env vars.
const ENV_TEMPLATE: &str = ".env.example.hbs";

/// The entity a collection run targets.
#[derive(Clone, Copy)]
enum Entity<'e> {
    Framework(&'e Framework),
    Package(&'e Package),
}

impl<'e> Entity<'e> {
    fn name(&self) -> &str {
        match self {
            Entity::Framework(fw) => fw.name(),
            Entity::Package(pkg) => pkg.name(),
        }
    }

    fn common(&self) -> &CommonFields {
        match self {
            Entity::Framework(fw) => &fw.descriptor().common,
            Entity::Package(pkg) => &pkg.descriptor().common,
        }
    }

    fn files_dir(&self) -> PathBuf {
        match self {
            Entity::Framework(fw) => fw.files_dir(),
            Entity::Package(pkg) => pkg.files_dir(),
        }
    }

    fn origin_scope(&self) -> OriginScope {
        match self {
            Entity::Framework(_) => OriginScope::App,
            Entity::Package(_) => OriginScope::Package,
        }
    }
}

/// Collects and scopes metadata for the chosen framework and packages.
///
/// Holds only borrowed capabilities; construction is plain dependency
/// injection, there is no hidden manager graph.
pub struct Aggregator<'a> {
    config: &'a ConfigRegistry,
    frameworks: &'a FrameworkCatalog,
    packages: &'a PackageCatalog,
    hooks: &'a HookRegistry,
    renderer: &'a TemplateRenderer,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        config: &'a ConfigRegistry,
        frameworks: &'a FrameworkCatalog,
        packages: &'a PackageCatalog,
        hooks: &'a HookRegistry,
        renderer: &'a TemplateRenderer,
    ) -> Self {
        Self {
            config,
            frameworks,
            packages,
            hooks,
            renderer,
        }
    }

    fn hook_ctx(&self) -> HookContext<'_> {
        HookContext {
            config: self.config,
            frameworks: self.frameworks,
            packages: self.packages,
        }
    }

    /// Resolve the application-level metadata for the chosen framework and
    /// every selected add-on package. `installed_shared` maps add-on package
    /// names to the shared package name that actually got installed, which
    /// may differ from the selection after a rename at the overwrite prompt;
    /// the synthetic dependency always targets the installed name.
    pub async fn resolve_app(
        &self,
        framework: &Framework,
        installed_shared: &BTreeMap<String, String>,
    ) -> Result<ResolvedMetadata> {
        let mut meta = ResolvedMetadata::default();
        let entity = Entity::Framework(framework);

        for kind in RECORD_KINDS {
            let records = self.collect(entity, kind).await?;
            let bundles = meta.bundles_mut(kind);
            for record in records.into_iter().filter(|r| r.scope.add_in_app) {
                route_by_origin(bundles, record);
            }
        }
        meta.context_vars = self
            .hooks
            .collect_context_vars(framework.name(), &self.hook_ctx())?;

        // Step 4: add-on packages, in selection order
        for selection in &self.config.selected_packages {
            let package = self.packages.get(&selection.name)?;
            let entity = Entity::Package(package);

            for kind in RECORD_KINDS {
                let records = self.collect(entity, kind).await?;
                let bundles = meta.bundles_mut(kind);
                for record in records {
                    let keep = match &selection.install {
                        // Nothing shared exists, so shared-scoped records
                        // fall back into the application.
                        InstallKind::Direct => record.scope.add_in_app || record.scope.add_in_shared,
                        InstallKind::Shared { .. } => record.scope.add_in_app,
                    };
                    if keep {
                        bundles.packages.push(record);
                    }
                }
            }

            if let InstallKind::Shared { name, .. } = &selection.install {
                let shared_name = installed_shared
                    .get(&selection.name)
                    .map(String::as_str)
                    .unwrap_or(name);
                meta.dependencies.packages.push(Record {
                    name: self.config.namespaced(shared_name),
                    value: package.version().to_string(),
                    scope: Scope::app_only(),
                    origin: Origin {
                        scope: OriginScope::Package,
                        kind: OriginKind::Other,
                    },
                });
            }

            let vars = self
                .hooks
                .collect_context_vars(package.name(), &self.hook_ctx())?;
            for (key, value) in vars {
                meta.context_vars.insert(key, value);
            }
        }

        Ok(meta)
    }

    /// Resolve the metadata a shared package built from `package` receives.
    pub async fn resolve_shared(&self, package: &Package) -> Result<ResolvedMetadata> {
        let mut meta = ResolvedMetadata::default();
        let entity = Entity::Package(package);

        for kind in RECORD_KINDS {
            let records = self.collect(entity, kind).await?;
            let bundles = meta.bundles_mut(kind);
            for record in records.into_iter().filter(|r| r.scope.add_in_shared) {
                route_by_origin(bundles, record);
            }
        }
        meta.context_vars = self
            .hooks
            .collect_context_vars(package.name(), &self.hook_ctx())?;

        Ok(meta)
    }

    /// Steps 1-3 for one entity and one kind, in source order.
    async fn collect(&self, entity: Entity<'_>, kind: RecordKind) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let origin_scope = entity.origin_scope();

        // 1. catalog descriptor
        let common = entity.common();
        let defs: &[RecordDef] = match kind {
            RecordKind::Dependencies => &common.dependencies,
            RecordKind::DevDependencies => &common.dev_dependencies,
            RecordKind::Scripts => &common.scripts,
            RecordKind::EnvVars => &common.env_vars,
        };
        let config_origin = Origin {
            scope: origin_scope,
            kind: OriginKind::Config,
        };
        records.extend(defs.iter().map(|d| Record::from_def(d, config_origin)));

        // Framework testing lists ride along with the config source
        if let Entity::Framework(fw) = entity {
            let testing_origin = Origin {
                scope: origin_scope,
                kind: OriginKind::Testing,
            };
            let testing_defs: &[RecordDef] = match kind {
                RecordKind::DevDependencies => &fw.descriptor().testing_dependencies,
                RecordKind::Scripts => &fw.descriptor().testing_scripts,
                _ => &[],
            };
            records.extend(testing_defs.iter().map(|d| Record::from_def(d, testing_origin)));
        }

        // 2. executable hook
        let hook_kind = match kind {
            RecordKind::Dependencies => HookKind::Dependencies,
            RecordKind::DevDependencies => HookKind::DevDependencies,
            RecordKind::Scripts => HookKind::Scripts,
            RecordKind::EnvVars => HookKind::EnvVars,
        };
        records.extend(
            self.hooks
                .collect_records(entity.name(), hook_kind, &self.hook_ctx())?,
        );

        // 3. manifest template
        records.extend(self.collect_from_template(entity, kind).await?);

        Ok(records)
    }

    /// Step 3: render the entity's manifest (or env) template with the base
    /// context and extract the matching section.
    async fn collect_from_template(
        &self,
        entity: Entity<'_>,
        kind: RecordKind,
    ) -> Result<Vec<Record>> {
        let origin = Origin {
            scope: entity.origin_scope(),
            kind: OriginKind::Template,
        };

        if let RecordKind::EnvVars = kind {
            let path = entity.files_dir().join(ENV_TEMPLATE);
            if !path.is_file() {
                return Ok(Vec::new());
            }
            let rendered = self.render_base(entity, &path).await?;
            return Ok(parse_env_lines(&rendered, origin));
        }

        let Some(section) = kind.manifest_section() else {
            return Ok(Vec::new());
        };
        let path = entity.files_dir().join(MANIFEST_TEMPLATE);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let rendered = self.render_base(entity, &path).await?;
        let manifest: serde_json::Value =
            serde_json::from_str(&rendered).map_err(|e| Error::ManifestParse {
                name: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut records = Vec::new();
        if let Some(entries) = manifest.get(section).and_then(|s| s.as_object()) {
            for (name, value) in entries {
                let Some(value) = value.as_str() else { continue };
                records.push(Record {
                    name: name.clone(),
                    value: value.to_string(),
                    scope: Scope::both(),
                    origin,
                });
            }
        }
        Ok(records)
    }

    /// Render a template with the empty base context for its entity shape.
    async fn render_base(&self, entity: Entity<'_>, path: &std::path::Path) -> Result<String> {
        let empty = ResolvedMetadata::default();
        match entity {
            Entity::Framework(fw) => {
                let port = self.config.port.unwrap_or(PORT_BASE);
                let ctx = app_context(self.config, fw, &self.config.app_name, port, &empty);
                self.renderer.render_file(path, &ctx).await
            }
            Entity::Package(pkg) => {
                let (shared_name, shared_description) = self.shared_identity(pkg);
                let ctx =
                    package_context(self.config, pkg, &shared_name, &shared_description, &empty);
                self.renderer.render_file(path, &ctx).await
            }
        }
    }

    /// Shared name/description for a package: the user's decision when one
    /// exists, the descriptor defaults otherwise.
    pub fn shared_identity(&self, package: &Package) -> (String, String) {
        if let Some(InstallKind::Shared { name, description }) = self
            .config
            .selection(package.name())
            .map(|s| s.install.clone())
        {
            (name, description)
        } else {
            (
                package.default_shared_name().to_string(),
                package.default_shared_description().to_string(),
            )
        }
    }
}

/// Route a record into the bundle matching its origin tag.
fn route_by_origin(bundles: &mut SourceBundles, record: Record) {
    match record.origin.kind {
        OriginKind::Config | OriginKind::Testing => bundles.config.push(record),
        OriginKind::Executable => bundles.executable.push(record),
        OriginKind::Template => bundles.template.push(record),
        OriginKind::Other => bundles.packages.push(record),
    }
}

/// Parse `KEY=VALUE` lines of a rendered environment file. Comments and
/// blank lines are skipped; surrounding quotes on values are dropped.
fn parse_env_lines(content: &str, origin: Origin) -> Vec<Record> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (name, value) = line.split_once('=')?;
            let value = value.trim().trim_matches('"');
            Some(Record {
                name: name.trim().to_string(),
                value: value.to_string(),
                scope: Scope::both(),
                origin,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SelectedPackage, WorkspacePaths};
    use crate::hooks::HookOutput;
    use std::fs;
    use std::path::Path;

    fn write_entity(root: &Path, name: &str, descriptor: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("files")).unwrap();
        fs::write(dir.join("config.json"), descriptor).unwrap();
        for (rel, content) in files {
            let path = dir.join("files").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn express_descriptor() -> &'static str {
        r#"{
            "type": "framework",
            "name": "express",
            "displayName": "Express",
            "dependencies": [{ "name": "express", "value": "^4.18.0" }],
            "testingDependencies": [{ "name": "jest", "value": "^29.0.0" }],
            "testingScripts": [{ "name": "test", "value": "jest" }]
        }"#
    }

    fn db_descriptor() -> &'static str {
        r#"{
            "type": "package",
            "name": "db-access",
            "displayName": "Database Access",
            "version": "1.2.0",
            "shareable": true,
            "defaultSharedName": "db",
            "dependencies": [
                { "name": "mongoose", "value": "^8.0.0", "addInApp": false, "addInShared": true },
                { "name": "db-client", "value": "^1.0.0" }
            ]
        }"#
    }

    async fn catalogs(root: &Path) -> (FrameworkCatalog, PackageCatalog) {
        (
            FrameworkCatalog::load(root).await.unwrap(),
            PackageCatalog::load(root).await.unwrap(),
        )
    }

    #[tokio::test]
    async fn collect_order_is_config_then_hook_then_template() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(
            tmp.path(),
            "express",
            express_descriptor(),
            &[(
                "package.json.hbs",
                r#"{ "dependencies": { "body-parser": "^1.20.0" } }"#,
            )],
        );
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        let mut hooks = HookRegistry::new();
        hooks.register("express", HookKind::Dependencies, |_| {
            Ok(HookOutput::Records(vec![Record {
                name: "helmet".into(),
                value: "^7.0.0".into(),
                scope: Scope::app_only(),
                origin: Origin {
                    scope: OriginScope::App,
                    kind: OriginKind::Executable,
                },
            }]))
        });
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        let framework = frameworks.get("express").unwrap();
        let meta = aggregator.resolve_app(framework, &BTreeMap::new()).await.unwrap();

        let names: Vec<_> = meta
            .dependencies
            .in_order()
            .map(|r| (r.name.as_str(), r.origin.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("express", OriginKind::Config),
                ("helmet", OriginKind::Executable),
                ("body-parser", OriginKind::Template),
            ]
        );

        // Re-running yields the identical order
        let again = aggregator.resolve_app(framework, &BTreeMap::new()).await.unwrap();
        let names_again: Vec<_> = again
            .dependencies
            .in_order()
            .map(|r| (r.name.as_str(), r.origin.kind))
            .collect();
        assert_eq!(names, names_again);
    }

    #[tokio::test]
    async fn testing_lists_join_dev_dependencies_and_scripts() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(tmp.path(), "express", express_descriptor(), &[]);
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        let meta = aggregator
            .resolve_app(frameworks.get("express").unwrap(), &BTreeMap::new())
            .await
            .unwrap();

        let dev: Vec<_> = meta
            .dev_dependencies
            .in_order()
            .map(|r| (r.name.as_str(), r.origin.kind))
            .collect();
        assert_eq!(dev, vec![("jest", OriginKind::Testing)]);

        let scripts: Vec<_> = meta.scripts.in_order().map(|r| r.name.as_str()).collect();
        assert_eq!(scripts, vec!["test"]);
    }

    #[tokio::test]
    async fn shared_install_scopes_records_and_adds_synthetic_dependency() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(tmp.path(), "express", express_descriptor(), &[]);
        write_entity(tmp.path(), "db-access", db_descriptor(), &[]);
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let mut config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        config
            .selected_packages
            .push(SelectedPackage::shared("db-access", "db", "Data access"));
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        let meta = aggregator
            .resolve_app(frameworks.get("express").unwrap(), &BTreeMap::new())
            .await
            .unwrap();

        let pkg_names: Vec<_> = meta
            .dependencies
            .packages
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        // mongoose is shared-only and the add-on went shared: excluded.
        // db-client is app-scoped: kept. Synthetic record points at @shared/db.
        assert_eq!(pkg_names, vec!["db-client", "@shared/db"]);

        let synthetic = meta.dependencies.packages.last().unwrap();
        assert_eq!(synthetic.value, "1.2.0");
        assert_eq!(synthetic.origin.kind, OriginKind::Other);
    }

    #[tokio::test]
    async fn synthetic_dependency_follows_the_installed_shared_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(tmp.path(), "express", express_descriptor(), &[]);
        write_entity(tmp.path(), "db-access", db_descriptor(), &[]);
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let mut config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        config
            .selected_packages
            .push(SelectedPackage::shared("db-access", "db", "Data access"));
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        // The selection said "db" but the install landed under a new name
        let installed: BTreeMap<String, String> =
            [("db-access".to_string(), "db-2".to_string())].into();
        let meta = aggregator
            .resolve_app(frameworks.get("express").unwrap(), &installed)
            .await
            .unwrap();

        let synthetic = meta.dependencies.packages.last().unwrap();
        assert_eq!(synthetic.name, "@shared/db-2");
    }

    #[tokio::test]
    async fn direct_install_pulls_shared_records_into_the_app() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(tmp.path(), "express", express_descriptor(), &[]);
        write_entity(tmp.path(), "db-access", db_descriptor(), &[]);
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let mut config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        config
            .selected_packages
            .push(SelectedPackage::direct("db-access"));
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        let meta = aggregator
            .resolve_app(frameworks.get("express").unwrap(), &BTreeMap::new())
            .await
            .unwrap();

        let pkg_names: Vec<_> = meta
            .dependencies
            .packages
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(pkg_names, vec!["mongoose", "db-client"]);
    }

    #[tokio::test]
    async fn resolve_shared_keeps_only_shared_scoped_records() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(
            tmp.path(),
            "db-access",
            db_descriptor(),
            &[(".env.example.hbs", "DB_URL=\"mongodb://localhost\"\n# comment\n")],
        );
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        let meta = aggregator
            .resolve_shared(packages.get("db-access").unwrap())
            .await
            .unwrap();

        let names: Vec<_> = meta
            .dependencies
            .in_order()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["mongoose"]);

        let env: Vec<_> = meta
            .env_vars
            .in_order()
            .map(|r| (r.name.as_str(), r.value.as_str()))
            .collect();
        assert_eq!(env, vec![("DB_URL", "mongodb://localhost")]);
    }

    #[tokio::test]
    async fn malformed_manifest_template_surfaces_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_entity(
            tmp.path(),
            "express",
            express_descriptor(),
            &[("package.json.hbs", "{ not json at all")],
        );
        let (frameworks, packages) = catalogs(tmp.path()).await;
        let config = ConfigRegistry::new(
            "shop",
            "express",
            WorkspacePaths::conventional(tmp.path(), tmp.path()),
        );
        let hooks = HookRegistry::new();
        let renderer = TemplateRenderer::new();
        let aggregator = Aggregator::new(&config, &frameworks, &packages, &hooks, &renderer);

        let err = aggregator
            .resolve_app(frameworks.get("express").unwrap(), &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
    }

    #[test]
    fn env_parsing_skips_comments_and_strips_quotes() {
        let origin = Origin {
            scope: OriginScope::App,
            kind: OriginKind::Template,
        };
        let records = parse_env_lines("# header\n\nA=1\nB=\"two\"\nnot-a-pair\n", origin);
        let pairs: Vec<_> = records
            .iter()
            .map(|r| (r.name.as_str(), r.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "two")]);
    }
}
