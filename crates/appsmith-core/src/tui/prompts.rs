//! Interactive generation flow using cliclack.
//!
//! This is the only interactive surface. Every answer lands in the
//! [`ConfigRegistry`] before the builders run; the core itself never prompts
//! except through the [`CollisionPrompt`] capability implemented here.

use crate::catalog::{FrameworkCatalog, Package, PackageCatalog};
use crate::config::{
    is_valid_name, slugify, ConfigRegistry, SelectedPackage, WorkspacePaths,
};
use crate::create::{AbortOnCollision, AppCreator, CollisionPrompt, OverwriteChoice};
use crate::error::{Error, Result};
use crate::hooks::HookRegistry;
use crate::render::TemplateRenderer;
use crate::store::TrackingStore;
use std::path::{Path, PathBuf};

/// Arguments for the create flow, usually mapped from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Workspace root. Defaults to the current directory.
    pub workspace: Option<PathBuf>,
    /// Template catalog root. Defaults to `<workspace>/templates`.
    pub catalog_dir: Option<PathBuf>,
    /// Application name.
    pub name: Option<String>,
    /// Framework to scaffold.
    pub framework: Option<String>,
    /// Application description.
    pub description: Option<String>,
    /// Explicit port.
    pub port: Option<u16>,
    /// Add-on packages to preselect.
    pub packages: Option<Vec<String>>,
    /// Whether the caller intends to run the package-manager install step.
    pub install: bool,
    /// Auto-confirm all prompts (non-interactive mode).
    pub yes: bool,
}

/// Interactive overwrite prompt: exit, rename, or overwrite.
struct CliCollisionPrompt;

impl CollisionPrompt for CliCollisionPrompt {
    fn on_collision(&self, name: &str, destination: &Path) -> Result<OverwriteChoice> {
        cliclack::log::warning(format!(
            "Destination already exists: {}",
            destination.display()
        ))
        .map_err(|e| Error::Other(e.into()))?;

        let action: &str = cliclack::select(format!("Folder '{name}' exists. What now?"))
            .item("exit", "Exit without changes", "")
            .item("rename", "Choose a different name", "")
            .item("overwrite", "Delete the existing folder and continue", "")
            .interact()
            .map_err(|e| Error::Other(e.into()))?;

        match action {
            "rename" => {
                let new_name: String = cliclack::input("New name")
                    .validate(|value: &String| {
                        if is_valid_name(value) {
                            Ok(())
                        } else {
                            Err("Use lowercase letters, digits, '-' and '_'")
                        }
                    })
                    .interact()
                    .map_err(|e| Error::Other(e.into()))?;
                Ok(OverwriteChoice::Rename(new_name))
            }
            "overwrite" => Ok(OverwriteChoice::Overwrite),
            _ => Ok(OverwriteChoice::Exit),
        }
    }
}

/// Run the generation flow with interactive prompts.
pub async fn run(args: CreateArgs, hooks: &HookRegistry) -> Result<()> {
    cliclack::intro("appsmith").map_err(|e| Error::Other(e.into()))?;

    let workspace = match &args.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let catalog_dir = args
        .catalog_dir
        .clone()
        .unwrap_or_else(|| workspace.join("templates"));

    // Catalogs first: a missing catalog root must fail before any prompt
    let frameworks = FrameworkCatalog::load(&catalog_dir).await?;
    let packages = PackageCatalog::load(&catalog_dir).await?;
    if frameworks.is_empty() {
        return Err(Error::Other(anyhow::anyhow!(
            "no framework templates found under {}",
            catalog_dir.display()
        )));
    }

    let framework_name = select_framework(&frameworks, &args)?;
    let framework = frameworks.get(&framework_name)?;

    let app_name = match &args.name {
        Some(name) => slugify(name),
        None if args.yes => slugify(framework.default_app_name()),
        None => {
            let default = framework.default_app_name().to_string();
            cliclack::input("Application name")
                .default_input(&default)
                .validate(|value: &String| {
                    if is_valid_name(&slugify(value)) {
                        Ok(())
                    } else {
                        Err("Use lowercase letters, digits, '-' and '_'")
                    }
                })
                .interact()
                .map(|name: String| slugify(&name))
                .map_err(|e| Error::Other(e.into()))?
        }
    };

    let description = match &args.description {
        Some(desc) => desc.clone(),
        None if args.yes => framework.default_app_description().to_string(),
        None => cliclack::input("Description")
            .default_input(framework.default_app_description())
            .required(false)
            .interact()
            .map_err(|e| Error::Other(e.into()))?,
    };

    let store = TrackingStore::new(
        WorkspacePaths::conventional(&workspace, &catalog_dir).tracking_file(),
    );
    let selected_packages =
        select_packages(&packages, &framework_name, &args, &store).await?;

    let mut config = ConfigRegistry::new(
        app_name,
        framework_name,
        WorkspacePaths::conventional(&workspace, &catalog_dir),
    );
    config.app_description = description;
    config.port = args.port;
    config.auto_install = args.install;
    config.selected_packages = selected_packages;
    collect_answers(&packages, &mut config, args.yes)?;

    let renderer = TemplateRenderer::new();
    let interactive_prompt = CliCollisionPrompt;
    let abort_prompt = AbortOnCollision;
    let prompt: &dyn CollisionPrompt = if args.yes {
        // Non-interactive runs never delete an existing destination
        &abort_prompt
    } else {
        &interactive_prompt
    };

    let creator = AppCreator {
        config: &config,
        frameworks: &frameworks,
        packages: &packages,
        hooks,
        renderer: &renderer,
        store: &store,
        prompt,
        quiet: false,
    };
    let created = creator.create().await?;

    cliclack::log::success(format!(
        "Created {} on port {}",
        created.name, created.port
    ))
    .map_err(|e| Error::Other(e.into()))?;

    let mut steps = vec![format!("cd {}", created.dir.display())];
    if config.auto_install {
        steps.push("npm install".to_string());
    }
    steps.push("npm run dev".to_string());
    cliclack::outro(format!("Next steps:\n  {}", steps.join("\n  ")))
        .map_err(|e| Error::Other(e.into()))?;

    Ok(())
}

fn select_framework(frameworks: &FrameworkCatalog, args: &CreateArgs) -> Result<String> {
    if let Some(name) = &args.framework {
        // Validate eagerly so the error lists the options
        return frameworks.get(name).map(|f| f.name().to_string());
    }
    if args.yes {
        return Ok(frameworks.all()[0].name().to_string());
    }

    let mut select = cliclack::select("Which framework?");
    for fw in frameworks.all() {
        select = select.item(fw.name().to_string(), fw.display_name(), fw.description());
    }
    select
        .interact()
        .map_err(|e| Error::Other(e.into()))
}

/// Package selection plus the shared-vs-direct decision per shareable add-on.
async fn select_packages(
    packages: &PackageCatalog,
    framework: &str,
    args: &CreateArgs,
    store: &TrackingStore,
) -> Result<Vec<SelectedPackage>> {
    let compatible = packages.compatible_with(framework);
    if compatible.is_empty() {
        return Ok(Vec::new());
    }

    let chosen: Vec<&Package> = if let Some(names) = &args.packages {
        let mut chosen = Vec::new();
        for name in names {
            let package = packages.get(name)?;
            if !package.supports(framework) {
                return Err(Error::UnknownEntity {
                    kind: "package",
                    name: name.clone(),
                    available: compatible.iter().map(|p| p.name().to_string()).collect(),
                });
            }
            chosen.push(package);
        }
        chosen
    } else if args.yes {
        Vec::new()
    } else {
        let mut select = cliclack::multiselect("Add-on packages (space to toggle)");
        for pkg in &compatible {
            select = select.item(pkg.name().to_string(), pkg.display_name(), pkg.description());
        }
        let names: Vec<String> = select
            .required(false)
            .interact()
            .map_err(|e| Error::Other(e.into()))?;
        names
            .iter()
            .map(|n| packages.get(n))
            .collect::<Result<Vec<_>>>()?
    };

    let mut selections = Vec::new();
    for package in chosen {
        if !package.is_shareable() {
            selections.push(SelectedPackage::direct(package.name()));
            continue;
        }

        // An already-installed shared package is simply reused
        if let Some(existing) = store.find_shared_for_package(package.name()).await? {
            selections.push(SelectedPackage::shared(
                package.name(),
                existing.name,
                package.default_shared_description(),
            ));
            continue;
        }

        let as_shared = if args.yes {
            true
        } else {
            cliclack::confirm(format!(
                "Install {} as a shared workspace package?",
                package.display_name()
            ))
            .initial_value(true)
            .interact()
            .map_err(|e| Error::Other(e.into()))?
        };

        if !as_shared {
            selections.push(SelectedPackage::direct(package.name()));
            continue;
        }

        let shared_name = if args.yes {
            package.default_shared_name().to_string()
        } else {
            cliclack::input("Shared package name")
                .default_input(package.default_shared_name())
                .interact()
                .map(|name: String| slugify(&name))
                .map_err(|e| Error::Other(e.into()))?
        };
        selections.push(SelectedPackage::shared(
            package.name(),
            shared_name,
            package.default_shared_description(),
        ));
    }

    Ok(selections)
}

/// Ask each selected package's extra configuration questions.
fn collect_answers(
    packages: &PackageCatalog,
    config: &mut ConfigRegistry,
    yes: bool,
) -> Result<()> {
    let selected: Vec<String> = config
        .selected_packages
        .iter()
        .map(|s| s.name.clone())
        .collect();

    for name in selected {
        let package = packages.get(&name)?;
        for prompt in package.prompts() {
            let answer = if yes {
                prompt.default_value.clone()
            } else {
                cliclack::input(&prompt.label)
                    .default_input(&prompt.default_value)
                    .required(false)
                    .interact()
                    .map_err(|e| Error::Other(e.into()))?
            };
            config
                .answers
                .insert(prompt.key.clone(), serde_json::Value::String(answer));
        }
    }
    Ok(())
}
