//! Render context assembly.
//!
//! Two context shapes exist: the framework (application) context and the
//! package (shared package) context. Both carry identity fields, descriptive
//! entity fields, the four-source bundles untouched (templates decide ordering
//! and formatting), and the open `contextVars` bag from hook modules.

use crate::catalog::{Framework, Package};
use crate::config::ConfigRegistry;
use crate::metadata::ResolvedMetadata;
use serde::Serialize;

/// Descriptive fields of the chosen framework.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub has_ui: bool,
}

/// Descriptive fields of an add-on package.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
}

/// Context for rendering application templates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppContext<'a> {
    pub app_name: &'a str,
    pub app_description: &'a str,
    pub port: u16,
    pub shared_namespace: &'a str,
    pub framework: FrameworkInfo,
    #[serde(flatten)]
    pub metadata: &'a ResolvedMetadata,
}

/// Context for rendering shared-package templates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageContext<'a> {
    pub shared_name: &'a str,
    pub shared_description: &'a str,
    pub app_name: &'a str,
    pub shared_namespace: &'a str,
    pub package: PackageInfo,
    #[serde(flatten)]
    pub metadata: &'a ResolvedMetadata,
}

impl From<&Framework> for FrameworkInfo {
    fn from(fw: &Framework) -> Self {
        Self {
            name: fw.name().to_string(),
            display_name: fw.display_name().to_string(),
            description: fw.description().to_string(),
            has_ui: fw.has_ui(),
        }
    }
}

impl From<&Package> for PackageInfo {
    fn from(pkg: &Package) -> Self {
        Self {
            name: pkg.name().to_string(),
            display_name: pkg.display_name().to_string(),
            description: pkg.description().to_string(),
            version: pkg.version().to_string(),
        }
    }
}

/// Build the application render context. `app_name` and `port` are passed
/// explicitly because the destination may have been renamed at the overwrite
/// prompt and the port may have been allocated from the tracking store.
pub fn app_context<'a>(
    config: &'a ConfigRegistry,
    framework: &Framework,
    app_name: &'a str,
    port: u16,
    metadata: &'a ResolvedMetadata,
) -> AppContext<'a> {
    AppContext {
        app_name,
        app_description: &config.app_description,
        port,
        shared_namespace: &config.shared_namespace,
        framework: framework.into(),
        metadata,
    }
}

/// Build the shared-package render context.
pub fn package_context<'a>(
    config: &'a ConfigRegistry,
    package: &Package,
    shared_name: &'a str,
    shared_description: &'a str,
    metadata: &'a ResolvedMetadata,
) -> PackageContext<'a> {
    PackageContext {
        shared_name,
        shared_description,
        app_name: &config.app_name,
        shared_namespace: &config.shared_namespace,
        package: package.into(),
        metadata,
    }
}
