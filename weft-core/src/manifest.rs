//! Declarative component manifests
//!
//! A manifest describes a composite component in YAML:
//!
//! ```yaml
//! name: running-total
//! config:
//!   start:
//!     type: number
//!     default: 0
//! components:
//!   sum:
//!     type: collate
//!     config:
//!       seed: 0
//!       op: { $fn: add }
//! inputs:
//!   value: sum.input
//! outputs:
//!   total: sum.output
//! connections:
//!   restart: [this.load, sum.reset]
//! ```
//!
//! Component types and `$fn` function references resolve through a
//! [`Registry`].

use crate::component::Component;
use crate::def::{create_component, ComponentDef};
use crate::error::WireError;
use crate::registry::Registry;
use crate::schema::{ConfigOption, Expect, InstanceConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use weft_reactive::Scheduler;
use weft_types::Value;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown component type: {0}")]
    UnknownType(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown value type {kind:?} for option {option}")]
    UnknownValueType { option: String, kind: String },

    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,

    #[serde(default)]
    pub config: IndexMap<String, OptionManifest>,

    #[serde(default)]
    pub components: IndexMap<String, ChildManifest>,

    /// Input name to `"<component>.<port>"`
    #[serde(default)]
    pub inputs: IndexMap<String, String>,

    #[serde(default)]
    pub outputs: IndexMap<String, OutputManifest>,

    #[serde(default)]
    pub connections: IndexMap<String, ConnectionManifest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionManifest {
    #[serde(default)]
    pub optional: bool,

    /// A `null` default reads as no default
    #[serde(default)]
    pub default: Option<Value>,

    /// A value kind name, or `any`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub constant: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildManifest {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub config: InstanceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputManifest {
    /// `true` declares a relay; `false` declares nothing
    Relay(bool),
    Path(String),
}

/// `[source, sink]` or `[source, [sink, ...]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionManifest(pub String, pub SinkManifest);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SinkManifest {
    One(String),
    Many(Vec<String>),
}

impl Manifest {
    pub fn from_yaml(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Build the component definition this manifest describes
    pub fn to_def(&self, registry: &Registry) -> Result<ComponentDef, ManifestError> {
        let mut def = create_component(&self.name);

        for (name, option) in &self.config {
            def = def.config(name, option.to_option(name, registry)?);
        }

        for (name, child) in &self.components {
            let kind = registry
                .kind(&child.kind)
                .ok_or_else(|| ManifestError::UnknownType(child.kind.clone()))?;
            def = def.child(name, kind, registry.resolve_config(&child.config)?);
        }

        for (name, path) in &self.inputs {
            def = def.input_path(name, path);
        }

        for (name, output) in &self.outputs {
            def = match output {
                OutputManifest::Relay(true) => def.relay_output(name),
                OutputManifest::Relay(false) => def,
                OutputManifest::Path(path) => def.output_path(name, path),
            };
        }

        for (name, ConnectionManifest(source, sink)) in &self.connections {
            def = match sink {
                SinkManifest::One(sink) => def.connect(name, source, sink),
                SinkManifest::Many(sinks) => def.fan_out(name, source, sinks.iter().cloned()),
            };
        }

        Ok(def)
    }

    /// Build and instantiate in one step, resolving `$fn` references in `config`
    pub fn instantiate(
        &self,
        registry: &Registry,
        scheduler: &Scheduler,
        config: &InstanceConfig,
    ) -> Result<Component, ManifestError> {
        let def = self.to_def(registry)?;
        let config = registry.resolve_config(config)?;
        Ok(def.instantiate(scheduler, config)?)
    }
}

impl OptionManifest {
    fn to_option(&self, name: &str, registry: &Registry) -> Result<ConfigOption, ManifestError> {
        let mut option = if self.optional {
            ConfigOption::optional()
        } else {
            ConfigOption::required()
        };

        if let Some(default) = &self.default {
            option = option.with_default(registry.resolve_value(default.clone())?);
        }

        if let Some(kind) = &self.kind {
            option.expect = Some(kind.parse::<Expect>().map_err(|_| ManifestError::UnknownValueType {
                option: name.to_string(),
                kind: kind.clone(),
            })?);
        }

        option.constant = self.constant;
        Ok(option)
    }
}
