//! Instantiate a manifest and report its ports.

use super::load_component;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use weft_core::{Component, Node};
use weft_reactive::Scheduler;

#[derive(Serialize)]
struct PortSummary {
    name: String,
    id: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    components: Vec<ChildSummary>,
    connections: Vec<String>,
}

#[derive(Serialize)]
struct ChildSummary {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

impl PortSummary {
    fn new(name: &str, component: &Component) -> Self {
        let components = component
            .child_names()
            .into_iter()
            .filter_map(|child| {
                let kind = component.child(&child)?.type_name().to_string();
                Some(ChildSummary { name: child, kind })
            })
            .collect();

        Self {
            name: name.to_string(),
            id: component.id().to_string(),
            inputs: component.input_names(),
            outputs: component.output_names(),
            components,
            connections: component.connection_names(),
        }
    }
}

/// Build the component graph without feeding it and print the port summary.
pub fn check_manifest(path: &Path, set: &[String], json: bool) -> Result<()> {
    let scheduler = Scheduler::new();
    let (manifest, component) = load_component(path, set, &scheduler)?;
    let summary = PortSummary::new(&manifest.name, &component);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} ({}): ok", summary.name, summary.id);
        println!("  inputs: {}", summary.inputs.join(", "));
        println!("  outputs: {}", summary.outputs.join(", "));
        for child in &summary.components {
            println!("  component {}: {}", child.name, child.kind);
        }
        if !summary.connections.is_empty() {
            println!("  connections: {}", summary.connections.join(", "));
        }
    }

    component.disconnect_all();
    Ok(())
}
