//! Error types for the generation pipeline.
//!
//! Errors from catalog loading and metadata aggregation bubble unchanged to
//! the top-level run wrapper, which prints a single formatted message and
//! exits non-zero. There are no automatic retries anywhere in the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for appsmith operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The template catalog root directory is missing. Fatal before any write.
    #[error("Template catalog not found: {path}")]
    CatalogRootMissing { path: PathBuf },

    /// A descriptor file could not be read or parsed.
    #[error("Invalid descriptor at {path}: {message}")]
    Descriptor { path: PathBuf, message: String },

    /// Lookup of a framework or package by name failed.
    #[error("Unknown {kind} '{name}'. Valid options: {}", available.join(", "))]
    UnknownEntity {
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },

    /// A hook module threw. Hooks run with full side-effect capability, so
    /// the whole generation run aborts without rollback.
    #[error("Hook '{hook}' for '{entity}' failed: {message}")]
    Hook {
        entity: String,
        hook: String,
        message: String,
    },

    /// The backing file for a template render is missing.
    #[error("Template file not found: {path}")]
    TemplateNotFound { path: PathBuf },

    /// The template engine rejected a template (malformed placeholder syntax).
    #[error("Failed to render {name}: {message}")]
    Render { name: String, message: String },

    /// A rendered manifest template did not produce valid JSON.
    #[error("Manifest template '{name}' is not valid JSON: {message}")]
    ManifestParse { name: String, message: String },

    /// The creation-tracking store could not be read or written.
    #[error("Tracking store error at {path}: {message}")]
    Store { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The user chose to exit at the overwrite prompt. Maps to exit code 0.
    #[error("Aborted by user")]
    Aborted,

    /// Generic wrapped error for anyhow interop (hook payloads, prompt layer).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for appsmith operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error represents a user-initiated abort rather than a
    /// failure. The CLI exits 0 for these.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_lists_valid_options() {
        let err = Error::UnknownEntity {
            kind: "framework",
            name: "angular".into(),
            available: vec!["express".into(), "nest".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("angular"));
        assert!(msg.contains("express, nest"));
    }

    #[test]
    fn catalog_root_missing_displays_path() {
        let err = Error::CatalogRootMissing {
            path: PathBuf::from("/missing/templates"),
        };
        assert!(err.to_string().contains("/missing/templates"));
    }

    #[test]
    fn hook_error_names_entity_and_hook() {
        let err = Error::Hook {
            entity: "express".into(),
            hook: "dependencies".into(),
            message: "boom".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("express"));
        assert!(msg.contains("dependencies"));
    }

    #[test]
    fn aborted_is_abort() {
        assert!(Error::Aborted.is_abort());
        assert!(!Error::TemplateNotFound { path: "x".into() }.is_abort());
    }
}
