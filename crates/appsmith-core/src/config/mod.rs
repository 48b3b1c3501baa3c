//! Resolved generation options for a single run.
//!
//! The [`ConfigRegistry`] is populated once (from CLI flags and/or the
//! interactive prompt layer) and then read by every other component. It never
//! changes during a run; derived metadata lives in
//! [`crate::metadata::ResolvedMetadata`], not here.

use std::path::PathBuf;

/// Default namespace prefix for workspace-internal shared packages.
pub const DEFAULT_SHARED_NAMESPACE: &str = "@shared";

/// First port handed out when the tracking store is empty.
pub const PORT_BASE: u16 = 3000;

/// Filesystem layout of the target workspace.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    /// Workspace root (holds the tracking store file).
    pub root: PathBuf,
    /// Directory that receives generated applications.
    pub apps_dir: PathBuf,
    /// Directory that receives generated shared packages.
    pub shared_dir: PathBuf,
    /// Read-only template catalog root.
    pub catalog_dir: PathBuf,
}

impl WorkspacePaths {
    /// Conventional layout: `apps/` and `packages/` under the workspace root.
    pub fn conventional(root: impl Into<PathBuf>, catalog_dir: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            apps_dir: root.join("apps"),
            shared_dir: root.join("packages"),
            catalog_dir: catalog_dir.into(),
            root,
        }
    }

    /// Path of the creation-tracking store file.
    pub fn tracking_file(&self) -> PathBuf {
        self.root.join(".appsmith.json")
    }
}

/// How a selected add-on package gets installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallKind {
    /// Dependencies land directly in the application manifest.
    Direct,
    /// The add-on is extracted into a reusable shared package with the given
    /// name and description; the application depends on it by namespace.
    Shared { name: String, description: String },
}

/// One add-on package chosen for this run, with its installation decision.
#[derive(Debug, Clone)]
pub struct SelectedPackage {
    pub name: String,
    pub install: InstallKind,
}

impl SelectedPackage {
    pub fn direct(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            install: InstallKind::Direct,
        }
    }

    pub fn shared(
        name: impl Into<String>,
        shared_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            install: InstallKind::Shared {
                name: shared_name.into(),
                description: description.into(),
            },
        }
    }

    /// Shared-package name when installed as shared.
    pub fn shared_name(&self) -> Option<&str> {
        match &self.install {
            InstallKind::Shared { name, .. } => Some(name),
            InstallKind::Direct => None,
        }
    }
}

/// Single source of truth for one generation run.
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    /// Application name (also the destination folder name).
    pub app_name: String,
    /// Human-readable application description.
    pub app_description: String,
    /// Name of the framework to scaffold.
    pub framework: String,
    /// Explicit port, if the user supplied one. Otherwise the tracking store
    /// allocates the next free port.
    pub port: Option<u16>,
    /// Prefix for workspace-internal shared package names.
    pub shared_namespace: String,
    /// Whether the caller intends to run the package-manager install step.
    pub auto_install: bool,
    /// Add-on packages chosen for this run, in selection order.
    pub selected_packages: Vec<SelectedPackage>,
    /// Answers to package-specific extra prompts, keyed by prompt key.
    pub answers: serde_json::Map<String, serde_json::Value>,
    /// Workspace layout.
    pub paths: WorkspacePaths,
}

impl ConfigRegistry {
    pub fn new(
        app_name: impl Into<String>,
        framework: impl Into<String>,
        paths: WorkspacePaths,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_description: String::new(),
            framework: framework.into(),
            port: None,
            shared_namespace: DEFAULT_SHARED_NAMESPACE.to_string(),
            auto_install: false,
            selected_packages: Vec::new(),
            answers: serde_json::Map::new(),
            paths,
        }
    }

    /// Fully-qualified name an application uses to depend on a shared package.
    pub fn namespaced(&self, shared_name: &str) -> String {
        format!("{}/{}", self.shared_namespace, shared_name)
    }

    /// Selected package entry by add-on name.
    pub fn selection(&self, package_name: &str) -> Option<&SelectedPackage> {
        self.selected_packages
            .iter()
            .find(|p| p.name == package_name)
    }

    /// Destination directory for the application, given a (possibly renamed)
    /// application name.
    pub fn app_dir(&self, app_name: &str) -> PathBuf {
        self.paths.apps_dir.join(app_name)
    }

    /// Destination directory for a shared package.
    pub fn shared_pkg_dir(&self, shared_name: &str) -> PathBuf {
        self.paths.shared_dir.join(shared_name)
    }

    /// Template directory of an entity inside the catalog.
    pub fn entity_dir(&self, entity_name: &str) -> PathBuf {
        self.paths.catalog_dir.join(entity_name)
    }
}

/// Derive a workspace-friendly folder name from a display name.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// True when `name` is usable as a folder/package name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        && !name.starts_with('-')
}
