//! Hook registry.
//!
//! The original generator loaded per-entity script modules at runtime. Here
//! hooks are plain functions registered up front, keyed by entity name and
//! hook kind, with the same `(config registry, catalogs) -> result` contract.
//! Hooks are the only point where generation-time computed records (for
//! example framework-conditional dependencies) are produced.
//!
//! A hook that returns an error aborts the whole generation run; hooks run
//! with full side-effect capability and nothing is rolled back.

use crate::catalog::{FrameworkCatalog, PackageCatalog};
use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::metadata::Record;
use std::collections::HashMap;
use std::fmt;

/// The defined points where an entity can contribute a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    PreInstall,
    PostInstall,
    Dependencies,
    DevDependencies,
    Scripts,
    EnvVars,
    ContextVars,
}

impl HookKind {
    pub fn name(&self) -> &'static str {
        match self {
            HookKind::PreInstall => "pre-install",
            HookKind::PostInstall => "post-install",
            HookKind::Dependencies => "dependencies",
            HookKind::DevDependencies => "dev-dependencies",
            HookKind::Scripts => "scripts",
            HookKind::EnvVars => "env-vars",
            HookKind::ContextVars => "template-context-vars",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything a hook gets to see.
pub struct HookContext<'a> {
    pub config: &'a ConfigRegistry,
    pub frameworks: &'a FrameworkCatalog,
    pub packages: &'a PackageCatalog,
}

/// What a hook may produce.
#[derive(Debug)]
pub enum HookOutput {
    /// Metadata records for the collection kinds.
    Records(Vec<Record>),
    /// Free-form variables merged into the render context.
    ContextVars(serde_json::Map<String, serde_json::Value>),
    /// Side effects only (pre/post install).
    Done,
}

type HookFn = Box<dyn Fn(&HookContext) -> anyhow::Result<HookOutput> + Send + Sync>;

/// Registry of hooks keyed by entity name + hook kind.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<(String, HookKind), HookFn>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for an entity. A later registration for the same
    /// entity and kind replaces the earlier one.
    pub fn register<F>(&mut self, entity: impl Into<String>, kind: HookKind, hook: F)
    where
        F: Fn(&HookContext) -> anyhow::Result<HookOutput> + Send + Sync + 'static,
    {
        self.hooks.insert((entity.into(), kind), Box::new(hook));
    }

    pub fn has(&self, entity: &str, kind: HookKind) -> bool {
        self.hooks.contains_key(&(entity.to_string(), kind))
    }

    /// Invoke the hook if one is registered. Returns `None` when absent; a
    /// hook error is fatal for the run.
    pub fn invoke(
        &self,
        entity: &str,
        kind: HookKind,
        ctx: &HookContext,
    ) -> Result<Option<HookOutput>> {
        match self.hooks.get(&(entity.to_string(), kind)) {
            None => Ok(None),
            Some(hook) => hook(ctx).map(Some).map_err(|e| Error::Hook {
                entity: entity.to_string(),
                hook: kind.name().to_string(),
                message: format!("{e:#}"),
            }),
        }
    }

    /// Invoke a record-producing hook, flattening absence to an empty list
    /// and rejecting non-record output.
    pub fn collect_records(
        &self,
        entity: &str,
        kind: HookKind,
        ctx: &HookContext,
    ) -> Result<Vec<Record>> {
        match self.invoke(entity, kind, ctx)? {
            None | Some(HookOutput::Done) => Ok(Vec::new()),
            Some(HookOutput::Records(records)) => Ok(records),
            Some(HookOutput::ContextVars(_)) => Err(Error::Hook {
                entity: entity.to_string(),
                hook: kind.name().to_string(),
                message: "hook returned context vars where records were expected".to_string(),
            }),
        }
    }

    /// Invoke the context-vars hook, flattening absence to an empty bag.
    pub fn collect_context_vars(
        &self,
        entity: &str,
        ctx: &HookContext,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        match self.invoke(entity, HookKind::ContextVars, ctx)? {
            None | Some(HookOutput::Done) => Ok(serde_json::Map::new()),
            Some(HookOutput::ContextVars(vars)) => Ok(vars),
            Some(HookOutput::Records(_)) => Err(Error::Hook {
                entity: entity.to_string(),
                hook: HookKind::ContextVars.name().to_string(),
                message: "hook returned records where context vars were expected".to_string(),
            }),
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("registered", &self.hooks.len())
            .finish()
    }
}
