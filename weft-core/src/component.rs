//! Live component instances
//!
//! A [`Component`] is a cheap handle to one constructed instance: its
//! resolved config, its sub-component graph, its port tables and its wired
//! connections. Handles are clones of one shared instance; behaviors and
//! synthesized ports hold weak references back to it.

use crate::behavior::{Behavior, BehaviorSlot};
use crate::connection::Connection;
use crate::node::{InputPort, Node, OutputPort};
use crate::schema::ConfigMap;
use crate::view::VisualState;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use weft_reactive::Scheduler;
use weft_types::{InstanceId, Value};

/// Name of the implicit ready port
pub const LOAD: &str = "load";

/// Name of the implicit partial-properties input
pub const PROPS: &str = "props";

/// Ports of one instance
#[derive(Default)]
pub(crate) struct PortTable {
    pub(crate) inputs: IndexMap<String, InputPort>,
    pub(crate) outputs: IndexMap<String, OutputPort>,
    pub(crate) slots: IndexMap<String, Arc<BehaviorSlot>>,
    /// Locally declared relay outputs that receive behavior failures
    pub(crate) error_routes: Vec<String>,
}

pub(crate) struct ComponentInner {
    pub(crate) id: InstanceId,
    pub(crate) type_name: String,
    pub(crate) scheduler: Scheduler,
    pub(crate) config: RwLock<ConfigMap>,
    pub(crate) components: IndexMap<String, Arc<dyn Node>>,
    pub(crate) ports: RwLock<PortTable>,
    pub(crate) connections: Mutex<IndexMap<String, Connection>>,
    pub(crate) visual: Option<VisualState>,
    pub(crate) base: Option<Arc<dyn Node>>,
}

#[derive(Clone)]
pub struct Component {
    pub(crate) inner: Arc<ComponentInner>,
}

impl Component {
    pub(crate) fn from_inner(inner: Arc<ComponentInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ComponentInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<ComponentInner>) -> Option<Self> {
        weak.upgrade().map(Self::from_inner)
    }

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Snapshot of the resolved config
    pub fn config(&self) -> ConfigMap {
        self.inner.config.read().clone()
    }

    /// Current value of one config option
    pub fn config_value(&self, name: &str) -> Option<Value> {
        self.inner.config.read().get(name).cloned()
    }

    pub(crate) fn set_config_value(&self, name: &str, value: Value) {
        self.inner.config.write().insert(name.to_string(), value);
    }

    /// Shallow-merge a partial map into a map-valued option, creating it if absent
    pub(crate) fn merge_config_value(&self, name: &str, partial: &Value) {
        let mut config = self.inner.config.write();
        let entry = config.entry(name.to_string()).or_insert_with(Value::map);
        if !entry.merge(partial) {
            *entry = partial.clone();
        }
    }

    pub fn input(&self, port: &str) -> Option<InputPort> {
        let local = self.inner.ports.read().inputs.get(port).cloned();
        local.or_else(|| self.inner.base.as_ref().and_then(|base| base.input(port)))
    }

    pub fn output(&self, port: &str) -> Option<OutputPort> {
        let local = self.inner.ports.read().outputs.get(port).cloned();
        local.or_else(|| self.inner.base.as_ref().and_then(|base| base.output(port)))
    }

    pub fn input_names(&self) -> Vec<String> {
        self.inner.ports.read().inputs.keys().cloned().collect()
    }

    pub fn output_names(&self) -> Vec<String> {
        self.inner.ports.read().outputs.keys().cloned().collect()
    }

    /// A sub-component by name
    pub fn child(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.inner.components.get(name).cloned()
    }

    /// A composite sub-component by name
    pub fn child_component(&self, name: &str) -> Option<Component> {
        self.child(name).and_then(|node| node.as_component().cloned())
    }

    pub fn child_names(&self) -> Vec<String> {
        self.inner.components.keys().cloned().collect()
    }

    /// The instance built for `extends`, if any
    pub fn base(&self) -> Option<Arc<dyn Node>> {
        self.inner.base.clone()
    }

    /// Replace the behavior behind an input port
    ///
    /// Returns false if the port is not behavior-backed.
    pub fn rebind(&self, port: &str, behavior: Behavior) -> bool {
        let slot = self.inner.ports.read().slots.get(port).cloned();
        match slot {
            Some(slot) => {
                slot.rebind(behavior);
                tracing::debug!(component = %self.inner.id, port, "behavior rebound");
                true
            }
            None => {
                tracing::trace!(component = %self.inner.id, port, "rebind skipped for port without a behavior");
                false
            }
        }
    }

    /// How many times the behavior behind `port` has been replaced
    pub fn rebind_count(&self, port: &str) -> Option<u64> {
        self.inner.ports.read().slots.get(port).map(|slot| slot.generation())
    }

    pub fn connection_names(&self) -> Vec<String> {
        self.inner.connections.lock().keys().cloned().collect()
    }

    /// Dispose one wired connection
    ///
    /// Returns false if no live connection has that name.
    pub fn disconnect(&self, name: &str) -> bool {
        let connection = self.inner.connections.lock().shift_remove(name);
        match connection {
            Some(connection) => {
                connection.dispose();
                tracing::debug!(component = %self.inner.id, connection = name, "connection disposed");
                true
            }
            None => false,
        }
    }

    /// Dispose every wired connection
    pub fn disconnect_all(&self) {
        let connections: Vec<Connection> = self.inner.connections.lock().drain(..).map(|(_, c)| c).collect();
        for connection in connections {
            connection.dispose();
        }
    }

    pub fn is_view(&self) -> bool {
        self.inner.visual.is_some()
    }
}

impl Node for Component {
    fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    fn input(&self, port: &str) -> Option<InputPort> {
        Component::input(self, port)
    }

    fn output(&self, port: &str) -> Option<OutputPort> {
        Component::output(self, port)
    }

    fn allocate_input(&self, port: &str) {
        if let Some(base) = &self.inner.base {
            if !self.inner.ports.read().inputs.contains_key(port) {
                base.allocate_input(port);
            }
        }
    }

    fn allocate_output(&self, port: &str) {
        if let Some(base) = &self.inner.base {
            if !self.inner.ports.read().outputs.contains_key(port) {
                base.allocate_output(port);
            }
        }
    }

    fn before_output_connect(&self, port: &str) {
        if let Some(base) = &self.inner.base {
            base.before_output_connect(port);
        }
    }

    fn as_component(&self) -> Option<&Component> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.inner.id)
            .field("type", &self.inner.type_name)
            .field("inputs", &self.input_names())
            .field("outputs", &self.output_names())
            .finish()
    }
}
