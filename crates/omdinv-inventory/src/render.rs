//! Output renderers
//!
//! Three forms: the full dynamic-inventory document, the variables of a
//! single host, and a static INI-style inventory file.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::error::InventoryError;
use crate::types::{HostVars, Inventory, META_KEY};

/// JSON rendering options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Indent with four spaces instead of compact output
    pub pretty: bool,
    /// Sort object keys at every level
    pub sort_keys: bool,
}

impl RenderOptions {
    /// Compact output in build order
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable indentation
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enable or disable key sorting
    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }
}

/// Render the whole inventory: every group plus `_meta.hostvars`
///
/// # Errors
/// Returns `InventoryError::Render` if serialization fails
pub fn render_list(
    inventory: &Inventory,
    options: RenderOptions,
) -> Result<String, InventoryError> {
    to_json(inventory, options)
}

/// Render the variables of one host
///
/// An unknown host renders as an empty object; the orchestrator asks about
/// arbitrary names and always expects a document back.
///
/// # Errors
/// Returns `InventoryError::Render` if serialization fails
pub fn render_host(
    inventory: &Inventory,
    id: &str,
    options: RenderOptions,
) -> Result<String, InventoryError> {
    match inventory.host_vars(id) {
        Some(vars) => to_json(vars, options),
        None => to_json(&HostVars::new(), options),
    }
}

/// Render a static inventory file
///
/// ```text
/// # File created: 2026-10-19 12:00:00
///
/// [web]
/// web1	ansible_host="10.0.0.1" omd_alias="Web One"
/// ```
#[must_use]
pub fn render_static(inventory: &Inventory, generated_at: Option<DateTime<Local>>) -> String {
    let mut lines = Vec::new();

    if let Some(ts) = generated_at {
        lines.push(format!("# File created: {}", ts.format("%Y-%m-%d %H:%M:%S")));
    }

    for (group, hosts) in inventory.groups() {
        if group == META_KEY {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("[{group}]"));

        for host in hosts {
            let vars = inventory
                .host_vars(host)
                .map(|vars| {
                    vars.iter()
                        .map(|(name, value)| {
                            format!("{name}=\"{}\"", escape(&natural_string(value)))
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            lines.push(format!("{host}\t{vars}"));
        }
    }

    lines.join("\n")
}

/// Strings as-is, everything else as JSON text
fn natural_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Keep a value inside its double quotes
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn to_json<T: Serialize + ?Sized>(
    value: &T,
    options: RenderOptions,
) -> Result<String, InventoryError> {
    if options.sort_keys {
        let sorted = sort_keys(serde_json::to_value(value)?);
        write_json(&sorted, options.pretty)
    } else {
        write_json(value, options.pretty)
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, InventoryError> {
    if !pretty {
        return Ok(serde_json::to_string(value)?);
    }

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Rebuild every object with its keys in sorted order; arrays keep their order
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
