//! Connection wiring
//!
//! A connection subscribes a sink input to a source output. Sources are
//! looked up among outputs and sinks among inputs, on the instance itself
//! for `this` and on the named sub-component otherwise.

use crate::component::Component;
use crate::def::{ConnectionDecl, Sink};
use crate::error::{Direction, WireError, WireResult};
use crate::node::{InputPort, Node, OutputPort};
use crate::path::{PortOwner, PortPath};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use weft_reactive::Subscription;

/// A live link between two ports
pub struct Connection {
    name: String,
    source: PortPath,
    sink: PortPath,
    subscription: Subscription,
}

impl Connection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &PortPath {
        &self.source
    }

    pub fn sink(&self) -> &PortPath {
        &self.sink
    }

    pub fn dispose(&self) {
        self.subscription.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.is_disposed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({}: {} -> {})", self.name, self.source, self.sink)
    }
}

/// Wire every declared connection; fan-out entries are named `name[i]`
pub(crate) fn wire(component: &Component, decls: &IndexMap<String, ConnectionDecl>) -> WireResult<()> {
    let mut wired = IndexMap::new();

    if let Err(err) = wire_into(component, decls, &mut wired) {
        for connection in wired.values() {
            connection.dispose();
        }
        return Err(err);
    }

    *component.inner.connections.lock() = wired;
    Ok(())
}

fn wire_into(
    component: &Component,
    decls: &IndexMap<String, ConnectionDecl>,
    wired: &mut IndexMap<String, Connection>,
) -> WireResult<()> {
    for (name, decl) in decls {
        match &decl.sink {
            Sink::One(sink) => {
                let connection = connect(component, name, &decl.source, sink)?;
                wired.insert(name.clone(), connection);
            }
            Sink::Many(sinks) => {
                for (i, sink) in sinks.iter().enumerate() {
                    let entry = format!("{name}[{i}]");
                    let connection = connect(component, &entry, &decl.source, sink)?;
                    wired.insert(entry, connection);
                }
            }
        }
    }
    Ok(())
}

fn connect(component: &Component, name: &str, source: &str, sink: &str) -> WireResult<Connection> {
    let source: PortPath = source.parse()?;
    let sink: PortPath = sink.parse()?;

    let output = resolve_output(component, &source)?;
    let input = resolve_input(component, &sink)?;
    let subscription = output.subscribe(input.observer().clone());

    tracing::trace!(component = %component.id(), connection = name, source = %source, sink = %sink, "connected");
    Ok(Connection {
        name: name.to_string(),
        source,
        sink,
        subscription,
    })
}

fn child_node(component: &Component, name: &str) -> WireResult<Arc<dyn Node>> {
    component
        .child(name)
        .ok_or_else(|| WireError::UnresolvedComponent(name.to_string()))
}

fn unresolved(owner: &str, direction: Direction, port: &str) -> WireError {
    WireError::UnresolvedPort {
        component: owner.to_string(),
        direction,
        port: port.to_string(),
    }
}

pub(crate) fn resolve_input(component: &Component, path: &PortPath) -> WireResult<InputPort> {
    match &path.owner {
        PortOwner::This => component
            .input(&path.port)
            .ok_or_else(|| unresolved(component.type_name(), Direction::Input, &path.port)),
        PortOwner::Child(_) => resolve_child_input(component, path),
    }
}

pub(crate) fn resolve_output(component: &Component, path: &PortPath) -> WireResult<OutputPort> {
    match &path.owner {
        PortOwner::This => component
            .output(&path.port)
            .ok_or_else(|| unresolved(component.type_name(), Direction::Output, &path.port)),
        PortOwner::Child(_) => resolve_child_output(component, path),
    }
}

/// Resolve an input on a sub-component, asking it to allocate the port first
///
/// `this` is not a sub-component and does not resolve here.
pub(crate) fn resolve_child_input(component: &Component, path: &PortPath) -> WireResult<InputPort> {
    let owner = path.owner.name();
    let node = child_node(component, owner)?;
    node.allocate_input(&path.port);
    node.input(&path.port)
        .ok_or_else(|| unresolved(owner, Direction::Input, &path.port))
}

/// Resolve an output on a sub-component
///
/// The sub-component gets its connect hook, then an allocation request,
/// before the lookup.
pub(crate) fn resolve_child_output(component: &Component, path: &PortPath) -> WireResult<OutputPort> {
    let owner = path.owner.name();
    let node = child_node(component, owner)?;
    node.before_output_connect(&path.port);
    node.allocate_output(&path.port);
    node.output(&path.port)
        .ok_or_else(|| unresolved(owner, Direction::Output, &path.port))
}
