//! Sub-component graphs

use crate::error::{WireError, WireResult};
use crate::node::{Construct, Node};
use crate::schema::{ConfigMap, InstanceConfig};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use weft_reactive::Scheduler;

/// A component type paired with the config to build it with
#[derive(Clone)]
pub struct ChildSpec {
    pub kind: Arc<dyn Construct>,
    pub config: InstanceConfig,
}

impl ChildSpec {
    pub fn new(kind: Arc<dyn Construct>, config: InstanceConfig) -> Self {
        Self { kind, config }
    }
}

impl fmt::Debug for ChildSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSpec")
            .field("kind", &self.kind.type_name())
            .field("config", &self.config)
            .finish()
    }
}

/// Derives a child spec from the owner's resolved config
pub type ChildFactory = Arc<dyn Fn(&ConfigMap) -> ChildSpec + Send + Sync>;

#[derive(Clone)]
pub enum ComponentDecl {
    Static(ChildSpec),
    Factory(ChildFactory),
}

/// Construct every declared sub-component in declaration order
///
/// The first failure aborts the whole graph.
pub(crate) fn build_components(
    decls: &IndexMap<String, ComponentDecl>,
    config: &ConfigMap,
    scheduler: &Scheduler,
) -> WireResult<IndexMap<String, Arc<dyn Node>>> {
    let mut nodes = IndexMap::with_capacity(decls.len());

    for (name, decl) in decls {
        let spec = match decl {
            ComponentDecl::Static(spec) => spec.clone(),
            ComponentDecl::Factory(factory) => factory(config),
        };

        let node = spec
            .kind
            .construct(scheduler, spec.config)
            .map_err(|source| WireError::Child {
                name: name.clone(),
                source: Box::new(source),
            })?;
        tracing::trace!(child = %name, kind = spec.kind.type_name(), "sub-component constructed");
        nodes.insert(name.clone(), node);
    }

    Ok(nodes)
}
