//! CLI command implementations.

pub mod check;
pub mod run;
pub mod types;

pub use check::check_manifest;
pub use run::{run_manifest, RunOptions};
pub use types::list_types;

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use weft_core::{Component, InstanceConfig, Manifest, Registry};
use weft_reactive::Scheduler;
use weft_types::Value;

/// Split `name=json` into a name and a value
///
/// Text that does not parse as JSON is taken as a plain string, so
/// `--set label=hello` works without quoting.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=VALUE, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Missing name in {:?}", raw));
    }

    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(value),
    };
    Ok((name.to_string(), value))
}

/// Load a manifest and instantiate it with the builtin registry
pub(crate) fn load_component(
    path: &Path,
    set: &[String],
    scheduler: &Scheduler,
) -> Result<(Manifest, Component)> {
    let manifest = Manifest::from_file(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;

    let config = set
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<InstanceConfig>>()?;

    let registry = Registry::with_builtins();
    let component = manifest
        .instantiate(&registry, scheduler, &config)
        .with_context(|| format!("Failed to instantiate {}", manifest.name))?;

    tracing::debug!(manifest = %manifest.name, component = %component.id(), "manifest instantiated");
    Ok((manifest, component))
}
