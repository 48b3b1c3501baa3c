//! Framework entities and their catalog.

use super::descriptor::{Descriptor, FrameworkDescriptor, FILES_DIR};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// One scaffoldable project type, loaded from a descriptor file.
///
/// Entities are immutable after catalog load; metadata resolved for a run
/// lives in [`crate::metadata::ResolvedMetadata`].
#[derive(Debug, Clone)]
pub struct Framework {
    descriptor: FrameworkDescriptor,
    /// Catalog directory this framework was loaded from.
    dir: PathBuf,
}

impl Framework {
    pub fn new(descriptor: FrameworkDescriptor, dir: PathBuf) -> Self {
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

    pub fn has_ui(&self) -> bool {
        self.descriptor.has_ui
    }

    /// Suggested application name when the user doesn't supply one.
    pub fn default_app_name(&self) -> &str {
        if self.descriptor.default_app_name.is_empty() {
            &self.descriptor.name
        } else {
            &self.descriptor.default_app_name
        }
    }

    pub fn default_app_description(&self) -> &str {
        &self.descriptor.default_app_description
    }

    pub fn descriptor(&self) -> &FrameworkDescriptor {
        &self.descriptor
    }

    /// Catalog directory holding `config.json` and the staging tree.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Root of the staging tree rendered/copied into the destination.
    pub fn files_dir(&self) -> PathBuf {
        self.dir.join(FILES_DIR)
    }
}

/// In-memory collection of all frameworks found under the catalog root.
#[derive(Debug, Clone, Default)]
pub struct FrameworkCatalog {
    frameworks: Vec<Framework>,
}

impl FrameworkCatalog {
    /// Load every framework descriptor under `root`. Package descriptors in
    /// the same catalog are ignored here.
    pub async fn load(root: &Path) -> Result<Self> {
        let mut frameworks = Vec::new();
        for (dir, descriptor) in super::scan_descriptors(root).await? {
            if let Descriptor::Framework(fw) = descriptor {
                frameworks.push(Framework::new(fw, dir));
            }
        }
        Ok(Self { frameworks })
    }

    /// Lookup by unique name.
    pub fn get(&self, name: &str) -> Result<&Framework> {
        self.frameworks
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::UnknownEntity {
                kind: "framework",
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.frameworks.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn all(&self) -> &[Framework] {
        &self.frameworks
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }

    /// Frameworks matching a caller-supplied predicate.
    pub fn filter(&self, predicate: impl Fn(&Framework) -> bool) -> Vec<&Framework> {
        self.frameworks.iter().filter(|f| predicate(f)).collect()
    }
}
