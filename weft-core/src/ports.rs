//! Port table construction
//!
//! Inputs are resolved in declaration order: handler inputs wrap their
//! callbacks, path inputs re-export a sub-component's port, and everything
//! else is backed by the behavior of the same name. Reconfigurable options
//! then get setter inputs, and `props` is added unless declared. Outputs
//! follow the same pattern, with the latched `load` port always added.

use crate::component::{Component, LOAD, PROPS};
use crate::connection;
use crate::def::{ComponentDef, InputDecl, InputHandlers, OutputDecl, StreamFn};
use crate::engine;
use crate::error::{Direction, WireError, WireResult};
use crate::node::{InputPort, OutputPort};
use crate::path::PortPath;
use indexmap::IndexMap;
use weft_reactive::{Dispatcher, Observer, Relay, Signal};

/// Sub-component that receives `props` when present
pub const ROOT: &str = "root";

pub(crate) fn build_inputs(component: &Component, def: &ComponentDef) -> WireResult<()> {
    let mut inputs = IndexMap::new();
    let mut slots = IndexMap::new();

    for (name, decl) in &def.inputs {
        let port = match decl {
            InputDecl::Handlers(handlers) => handler_port(component, handlers),
            InputDecl::Path(path) => {
                let path: PortPath = path.parse()?;
                connection::resolve_child_input(component, &path)?
            }
            InputDecl::Behavior => {
                let behavior = def
                    .beh
                    .get(name)
                    .cloned()
                    .ok_or_else(|| WireError::MissingBehavior(name.clone()))?;
                let (port, slot) = engine::behavior_port(component, name, behavior);
                slots.insert(name.clone(), slot);
                port
            }
        };
        inputs.insert(name.clone(), port);
    }

    for (name, option) in def.schema.iter() {
        if option.is_reconfigurable() && !def.beh.contains_key(name) && !inputs.contains_key(name) {
            inputs.insert(name.clone(), setter_port(component, name));
        }
    }

    if !inputs.contains_key(PROPS) {
        inputs.insert(PROPS.to_string(), props_port(component)?);
    }

    let mut ports = component.inner.ports.write();
    ports.inputs = inputs;
    ports.slots = slots;
    Ok(())
}

pub(crate) fn build_outputs(component: &Component, def: &ComponentDef) -> WireResult<()> {
    let scheduler = component.scheduler().clone();
    let mut outputs = IndexMap::new();
    let mut error_routes = Vec::new();

    for (name, decl) in &def.outputs {
        let port = match decl {
            OutputDecl::Relay => {
                error_routes.push(name.clone());
                OutputPort::Relay(Relay::deferred(&scheduler))
            }
            OutputDecl::Stream(stream) => stream_port(component, stream.clone()),
            OutputDecl::Path(path) => {
                let path: PortPath = path.parse()?;
                connection::resolve_child_output(component, &path)?
            }
        };
        outputs.insert(name.clone(), port);
    }

    outputs.insert(LOAD.to_string(), OutputPort::Relay(Relay::latched(&scheduler)));
    error_routes.retain(|name| name != LOAD);

    let mut ports = component.inner.ports.write();
    ports.outputs = outputs;
    ports.error_routes = error_routes;
    Ok(())
}

fn handler_port(component: &Component, handlers: &InputHandlers) -> InputPort {
    let owner = component.downgrade();

    let next = handlers.next.clone();
    let next_owner = owner.clone();
    let mut observer = Observer::new(move |value| {
        if let Some(component) = Component::upgrade(&next_owner) {
            next(&component, value);
        }
    });

    if let Some(error) = handlers.error.clone() {
        let owner = owner.clone();
        observer = observer.with_error(move |value| {
            if let Some(component) = Component::upgrade(&owner) {
                error(&component, value);
            }
        });
    }

    if let Some(complete) = handlers.complete.clone() {
        observer = observer.with_complete(move || {
            if let Some(component) = Component::upgrade(&owner) {
                complete(&component);
            }
        });
    }

    InputPort::deferred(observer, component.scheduler())
}

fn setter_port(component: &Component, option: &str) -> InputPort {
    let owner = component.downgrade();
    let option = option.to_string();

    let observer = Observer::new(move |value| {
        if let Some(component) = Component::upgrade(&owner) {
            tracing::debug!(component = %component.id(), option = %option, value = %value, "config option updated");
            component.set_config_value(&option, value);
        }
    });
    InputPort::deferred(observer, component.scheduler())
}

fn props_port(component: &Component) -> WireResult<InputPort> {
    if let Some(root) = component.child(ROOT) {
        root.allocate_input(PROPS);
        return root.input(PROPS).ok_or_else(|| WireError::UnresolvedPort {
            component: ROOT.to_string(),
            direction: Direction::Input,
            port: PROPS.to_string(),
        });
    }

    let owner = component.downgrade();
    let observer = Observer::new(move |partial| {
        if let Some(component) = Component::upgrade(&owner) {
            component.merge_config_value(PROPS, &partial);
            component.update_view_field(PROPS, &partial);
        }
    });
    Ok(InputPort::deferred(observer, component.scheduler()))
}

fn stream_port(component: &Component, stream: StreamFn) -> OutputPort {
    let owner = component.downgrade();
    let dispatcher = Dispatcher::new(component.scheduler(), move |observer| {
        let component = Component::upgrade(&owner)?;
        stream(&component, observer)
    });
    OutputPort::Stream(dispatcher.into_observable())
}

/// Push each input-backed config value through a single-use relay
pub(crate) fn send_initial_packets(component: &Component) {
    for (name, value) in component.config() {
        let port = component.inner.ports.read().inputs.get(&name).cloned();
        let Some(port) = port else {
            continue;
        };

        let relay = Relay::deferred(component.scheduler());
        let subscription = relay.subscribe(port.observer().clone());
        relay.write(Signal::Success(value));
        subscription.dispose();
        tracing::trace!(component = %component.id(), port = %name, "initial packet queued");
    }
}

pub(crate) fn signal_load(component: &Component) {
    let load = component.inner.ports.read().outputs.get(LOAD).cloned();
    if let Some(load) = load {
        load.write(Signal::ready());
    }
}
