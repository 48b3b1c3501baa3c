//! Template rendering.
//!
//! One handlebars instance per run, with HTML escaping disabled (we generate
//! code and config, not markup) and helpers registered for serializing the
//! aggregated dependency/script/env bundles into manifest-formatted text.
//!
//! The helpers are where the manifest-merge policy lives: they walk the four
//! source bundles in order (config, executable, template, packages) and apply
//! last-writer-wins per name, so a rendered manifest never contains duplicate
//! keys while the raw bundles keep every contribution for diagnostics.

pub mod context;

pub use context::{app_context, package_context, AppContext, PackageContext};

use crate::error::{Error, Result};
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::fs;

/// Suffix marking a file as a template.
pub const TEMPLATE_SUFFIX: &str = ".hbs";

/// Flatten bundles (or a plain record list) into `(name, value)` pairs,
/// keeping first-seen order and the last-written value per name.
fn flatten_last_wins(value: &Value) -> Vec<(String, String)> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: std::collections::HashMap<String, String> = std::collections::HashMap::new();

    let mut absorb = |records: &Value| {
        if let Some(items) = records.as_array() {
            for item in items {
                let (Some(name), Some(val)) = (
                    item.get("name").and_then(Value::as_str),
                    item.get("value").and_then(Value::as_str),
                ) else {
                    continue;
                };
                if !latest.contains_key(name) {
                    order.push(name.to_string());
                }
                latest.insert(name.to_string(), val.to_string());
            }
        }
    };

    match value {
        Value::Array(_) => absorb(value),
        Value::Object(map) => {
            // Source order defines override order
            for key in ["config", "executable", "template", "packages"] {
                if let Some(records) = map.get(key) {
                    absorb(records);
                }
            }
        }
        _ => {}
    }

    order
        .into_iter()
        .map(|name| {
            let value = latest.remove(&name).unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Serialize records as manifest entries: `"name": "value"` lines, indented,
/// comma-separated, without a trailing comma.
fn manifest_entries(value: &Value) -> String {
    flatten_last_wins(value)
        .into_iter()
        .map(|(name, val)| format!("    \"{}\": \"{}\"", escape_json(&name), escape_json(&val)))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Serialize records as an environment-variable block: `NAME="value"` lines.
fn env_entries(value: &Value) -> String {
    flatten_last_wins(value)
        .into_iter()
        .map(|(name, val)| format!("{}=\"{}\"", name, val.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

handlebars_helper!(dependency_block: |bundles: Json| manifest_entries(bundles));
handlebars_helper!(script_block: |bundles: Json| manifest_entries(bundles));
handlebars_helper!(env_block: |bundles: Json| env_entries(bundles));

/// Renderer for template files discovered during the folder walk and for
/// manifest templates consulted during aggregation.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Generated files are code and config, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("dependencyBlock", Box::new(dependency_block));
        handlebars.register_helper("scriptBlock", Box::new(script_block));
        handlebars.register_helper("envBlock", Box::new(env_block));
        Self { handlebars }
    }

    /// Render template text against a context. `name` only labels errors.
    pub fn render_str<T: Serialize>(&self, template: &str, ctx: &T, name: &str) -> Result<String> {
        self.handlebars
            .render_template(template, ctx)
            .map_err(|e| Error::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Render a template file. A missing backing file is an error; malformed
    /// placeholder syntax surfaces as a render error, never retried.
    pub async fn render_file<T: Serialize>(&self, path: &Path, ctx: &T) -> Result<String> {
        if !path.is_file() {
            return Err(Error::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }
        let template = fs::read_to_string(path).await?;
        self.render_str(&template, ctx, &path.display().to_string())
    }
}
