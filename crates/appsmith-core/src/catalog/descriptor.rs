//! Descriptor file types and parsing.
//!
//! Every entity directory in the template catalog carries a `config.json`
//! descriptor declaring its static attributes. Descriptors self-identify as a
//! framework or an add-on package through the `type` field.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "0.0.1".to_string()
}

/// One dependency, script, or environment-variable declaration, plus the
/// scope flags deciding whether it lands in the application manifest, the
/// shared-package manifest, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDef {
    pub name: String,
    pub value: String,

    /// Add this record to the generated application.
    #[serde(default = "default_true")]
    pub add_in_app: bool,

    /// Add this record to the shared package (when the add-on is installed
    /// as shared).
    #[serde(default)]
    pub add_in_shared: bool,
}

/// Extra configuration question an add-on package asks during selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDef {
    /// Key under which the answer is stored in the config registry.
    pub key: String,
    /// Question shown to the user.
    pub label: String,
    #[serde(default)]
    pub default_value: String,
}

/// Descriptor contents shared by frameworks and packages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonFields {
    #[serde(default)]
    pub dependencies: Vec<RecordDef>,

    #[serde(default)]
    pub dev_dependencies: Vec<RecordDef>,

    #[serde(default)]
    pub scripts: Vec<RecordDef>,

    #[serde(default)]
    pub env_vars: Vec<RecordDef>,
}

/// Descriptor for one scaffoldable project type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkDescriptor {
    pub name: String,
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub default_app_name: String,

    #[serde(default)]
    pub default_app_description: String,

    /// Whether applications built on this framework serve a UI.
    #[serde(default)]
    pub has_ui: bool,

    #[serde(default)]
    pub testing_dependencies: Vec<RecordDef>,

    #[serde(default)]
    pub testing_scripts: Vec<RecordDef>,

    #[serde(flatten)]
    pub common: CommonFields,
}

/// Descriptor for one optional add-on package.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    pub name: String,
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Names of frameworks this add-on works with. Empty means all.
    #[serde(default)]
    pub frameworks: Vec<String>,

    #[serde(default)]
    pub is_ui_library: bool,

    #[serde(default)]
    pub is_icon_library: bool,

    /// Whether the add-on can be extracted into a reusable shared package.
    #[serde(default)]
    pub shareable: bool,

    #[serde(default)]
    pub default_shared_name: String,

    #[serde(default)]
    pub default_shared_description: String,

    #[serde(default)]
    pub prompts: Vec<PromptDef>,

    #[serde(flatten)]
    pub common: CommonFields,
}

/// A parsed descriptor file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Descriptor {
    #[serde(rename = "framework")]
    Framework(FrameworkDescriptor),
    #[serde(rename = "package")]
    Package(PackageDescriptor),
}

/// File name of a descriptor inside an entity directory.
pub const DESCRIPTOR_FILE: &str = "config.json";

/// Name of the staging subdirectory holding the template tree.
pub const FILES_DIR: &str = "files";
