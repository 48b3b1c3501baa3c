//! Appsmith Core - Library for generating workspace applications from templates
//!
//! This library generates new applications inside a multi-package workspace
//! from a catalog of framework and add-on package templates: it resolves which
//! dependencies, scripts, environment variables, and files each application
//! (and optionally a shared, reusable package) receives, then renders the
//! templates to disk.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Catalog loading, metadata aggregation,
//!   template rendering, folder walking, the creation-tracking store
//! - **Layer 2: Workflow Orchestration** - `AppCreator` / `SharedPackageCreator`
//!   wired together through explicit dependency injection
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts
//!   (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompt module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use appsmith_core::catalog::{FrameworkCatalog, PackageCatalog};
//! use appsmith_core::config::{ConfigRegistry, WorkspacePaths};
//! use appsmith_core::create::{AbortOnCollision, AppCreator};
//!
//! let frameworks = FrameworkCatalog::load(&catalog_dir).await?;
//! let packages = PackageCatalog::load(&catalog_dir).await?;
//! let config = ConfigRegistry::new("shop", "express",
//!     WorkspacePaths::conventional(workspace, catalog_dir));
//! // ... assemble AppCreator and call create()
//! ```

pub mod catalog;
pub mod config;
pub mod create;
pub mod error;
pub mod hooks;
pub mod metadata;
pub mod render;
pub mod store;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use catalog::{Framework, FrameworkCatalog, Package, PackageCatalog};
pub use config::{ConfigRegistry, InstallKind, SelectedPackage, WorkspacePaths};
pub use create::{
    AbortOnCollision, AlwaysOverwrite, AppCreator, CollisionPrompt, CreatedApp,
    CreatedSharedPackage, FolderItem, OverwriteChoice, SharedPackageCreator,
};
pub use error::{Error, Result};
pub use hooks::{HookContext, HookKind, HookOutput, HookRegistry};
pub use metadata::{Aggregator, Record, RecordKind, ResolvedMetadata};
pub use render::TemplateRenderer;
pub use store::TrackingStore;

#[cfg(feature = "tui")]
pub use tui::{run, CreateArgs};
