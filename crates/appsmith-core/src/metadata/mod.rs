//! Metadata records and per-run resolved metadata.
//!
//! Dependencies, scripts, and environment variables are all `{name, value}`
//! records tagged with a scope (application vs. shared package) and an origin
//! (which of the four sources produced them). Origins exist for diagnostics
//! and ordering only; the aggregator never deduplicates by name. The
//! renderer's serialization helpers apply last-writer-wins when a manifest is
//! emitted.

pub mod aggregator;

pub use aggregator::Aggregator;

use crate::catalog::RecordDef;
use serde::Serialize;

/// Which manifest section a collection run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Dependencies,
    DevDependencies,
    Scripts,
    EnvVars,
}

impl RecordKind {
    /// Key of the matching section in a rendered manifest file.
    pub fn manifest_section(&self) -> Option<&'static str> {
        match self {
            RecordKind::Dependencies => Some("dependencies"),
            RecordKind::DevDependencies => Some("devDependencies"),
            RecordKind::Scripts => Some("scripts"),
            RecordKind::EnvVars => None,
        }
    }
}

/// Where a record should be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub add_in_app: bool,
    pub add_in_shared: bool,
}

impl Scope {
    pub fn app_only() -> Self {
        Self {
            add_in_app: true,
            add_in_shared: false,
        }
    }

    pub fn shared_only() -> Self {
        Self {
            add_in_app: false,
            add_in_shared: true,
        }
    }

    pub fn both() -> Self {
        Self {
            add_in_app: true,
            add_in_shared: true,
        }
    }
}

/// Which level of aggregation produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginScope {
    App,
    Package,
}

/// Which of the sources produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    Config,
    Executable,
    Template,
    Testing,
    Other,
}

/// Diagnostic tag carried by every record entering the final manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub scope: OriginScope,
    pub kind: OriginKind,
}

/// A single dependency, script, or environment-variable contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub name: String,
    pub value: String,
    pub scope: Scope,
    pub origin: Origin,
}

impl Record {
    pub fn from_def(def: &RecordDef, origin: Origin) -> Self {
        Self {
            name: def.name.clone(),
            value: def.value.clone(),
            scope: Scope {
                add_in_app: def.add_in_app,
                add_in_shared: def.add_in_shared,
            },
            origin,
        }
    }
}

/// Records of one kind, kept apart by source so templates control ordering
/// and formatting themselves.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBundles {
    /// Declared directly on the catalog descriptor.
    pub config: Vec<Record>,
    /// Produced by the entity's executable hook.
    pub executable: Vec<Record>,
    /// Extracted from the entity's rendered manifest template.
    pub template: Vec<Record>,
    /// Contributed by selected add-on packages (application aggregation only).
    pub packages: Vec<Record>,
}

impl SourceBundles {
    /// All records in defined source order: config, executable, template,
    /// then per-package contributions in selection order.
    pub fn in_order(&self) -> impl Iterator<Item = &Record> {
        self.config
            .iter()
            .chain(self.executable.iter())
            .chain(self.template.iter())
            .chain(self.packages.iter())
    }

    pub fn len(&self) -> usize {
        self.config.len() + self.executable.len() + self.template.len() + self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the aggregator resolved for one entity in one run. Catalog
/// entities stay immutable; this value is passed explicitly to the renderer
/// and the file-structure builders.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    pub dependencies: SourceBundles,
    pub dev_dependencies: SourceBundles,
    pub scripts: SourceBundles,
    pub env_vars: SourceBundles,
    /// Open bag supplied by `template-context-vars` hooks.
    pub context_vars: serde_json::Map<String, serde_json::Value>,
}

impl ResolvedMetadata {
    pub fn bundles(&self, kind: RecordKind) -> &SourceBundles {
        match kind {
            RecordKind::Dependencies => &self.dependencies,
            RecordKind::DevDependencies => &self.dev_dependencies,
            RecordKind::Scripts => &self.scripts,
            RecordKind::EnvVars => &self.env_vars,
        }
    }

    pub(crate) fn bundles_mut(&mut self, kind: RecordKind) -> &mut SourceBundles {
        match kind {
            RecordKind::Dependencies => &mut self.dependencies,
            RecordKind::DevDependencies => &mut self.dev_dependencies,
            RecordKind::Scripts => &mut self.scripts,
            RecordKind::EnvVars => &mut self.env_vars,
        }
    }
}

/// The four kinds in collection order.
pub const RECORD_KINDS: [RecordKind; 4] = [
    RecordKind::Dependencies,
    RecordKind::DevDependencies,
    RecordKind::Scripts,
    RecordKind::EnvVars,
];
