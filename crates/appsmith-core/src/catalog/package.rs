//! Add-on package entities and their catalog.

use super::descriptor::{Descriptor, PackageDescriptor, PromptDef, FILES_DIR};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// One optional add-on (UI library, icon library, data library, ...).
///
/// Like [`crate::catalog::Framework`], entities are immutable after load; the
/// user's shared-vs-direct decision lives in the config registry, not here.
#[derive(Debug, Clone)]
pub struct Package {
    descriptor: PackageDescriptor,
    dir: PathBuf,
}

impl Package {
    pub fn new(descriptor: PackageDescriptor, dir: PathBuf) -> Self {
        Self { descriptor, dir }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    pub fn description(&self) -> &str {
        &self.descriptor.description
    }

    pub fn version(&self) -> &str {
        &self.descriptor.version
    }

    pub fn is_ui_library(&self) -> bool {
        self.descriptor.is_ui_library
    }

    pub fn is_icon_library(&self) -> bool {
        self.descriptor.is_icon_library
    }

    pub fn is_shareable(&self) -> bool {
        self.descriptor.shareable
    }

    /// Whether this add-on supports the given framework. An empty list means
    /// the add-on is framework-agnostic.
    pub fn supports(&self, framework: &str) -> bool {
        self.descriptor.frameworks.is_empty()
            || self.descriptor.frameworks.iter().any(|f| f == framework)
    }

    /// Suggested shared-package name when the user doesn't pick one.
    pub fn default_shared_name(&self) -> &str {
        if self.descriptor.default_shared_name.is_empty() {
            &self.descriptor.name
        } else {
            &self.descriptor.default_shared_name
        }
    }

    pub fn default_shared_description(&self) -> &str {
        &self.descriptor.default_shared_description
    }

    pub fn prompts(&self) -> &[PromptDef] {
        &self.descriptor.prompts
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files_dir(&self) -> PathBuf {
        self.dir.join(FILES_DIR)
    }
}

/// In-memory collection of all add-on packages under the catalog root.
#[derive(Debug, Clone, Default)]
pub struct PackageCatalog {
    packages: Vec<Package>,
}

impl PackageCatalog {
    /// Load every package descriptor under `root`.
    pub async fn load(root: &Path) -> Result<Self> {
        let mut packages = Vec::new();
        for (dir, descriptor) in super::scan_descriptors(root).await? {
            if let Descriptor::Package(pkg) = descriptor {
                packages.push(Package::new(pkg, dir));
            }
        }
        Ok(Self { packages })
    }

    pub fn get(&self, name: &str) -> Result<&Package> {
        self.packages
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::UnknownEntity {
                kind: "package",
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn all(&self) -> &[Package] {
        &self.packages
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn filter(&self, predicate: impl Fn(&Package) -> bool) -> Vec<&Package> {
        self.packages.iter().filter(|p| predicate(p)).collect()
    }

    /// Packages compatible with the given framework.
    pub fn compatible_with(&self, framework: &str) -> Vec<&Package> {
        self.filter(|p| p.supports(framework))
    }
}
