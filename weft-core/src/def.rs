//! Component definitions
//!
//! A [`ComponentDef`] is the declarative description of a component type:
//! its config schema, sub-components, ports, connections and behaviors.
//! [`ComponentDef::instantiate`] turns it into a live [`Component`].
//!
//! # Construction order
//!
//! 1. the `extends` base, if any
//! 2. config validation
//! 3. sub-components
//! 4. inputs, then outputs (including the implicit `props` and `load`)
//! 5. connections
//! 6. one initial packet per config option that has a matching input
//! 7. the `construct` hook
//! 8. the `load` signal

use crate::behavior::Behavior;
use crate::component::{Component, ComponentInner, PortTable, PROPS};
use crate::connection;
use crate::error::{WireError, WireResult};
use crate::graph::{self, ChildFactory, ChildSpec, ComponentDecl};
use crate::node::{Construct, Node};
use crate::ports;
use crate::schema::{ConfigMap, ConfigOption, ConfigSchema, InstanceConfig};
use crate::view::{PictureFn, Render, VisualState};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use weft_reactive::{Observer, Scheduler, Teardown};
use weft_types::{InstanceId, Map, Value};

pub type PortHandler = Arc<dyn Fn(&Component, Value) + Send + Sync>;
pub type StreamFn = Arc<dyn Fn(&Component, Observer) -> Option<Teardown> + Send + Sync>;
pub type ConstructHook = Arc<dyn Fn(&Component, &InstanceConfig) -> WireResult<()> + Send + Sync>;
pub type ParentConfigFn = Arc<dyn Fn(&InstanceConfig) -> InstanceConfig + Send + Sync>;

/// Callbacks for an input that is wired straight to the instance
#[derive(Clone)]
pub struct InputHandlers {
    pub(crate) next: PortHandler,
    pub(crate) error: Option<PortHandler>,
    pub(crate) complete: Option<Arc<dyn Fn(&Component) + Send + Sync>>,
}

impl InputHandlers {
    pub fn new(next: impl Fn(&Component, Value) + Send + Sync + 'static) -> Self {
        Self {
            next: Arc::new(next),
            error: None,
            complete: None,
        }
    }

    pub fn with_error(mut self, error: impl Fn(&Component, Value) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(error));
        self
    }

    pub fn with_complete(mut self, complete: impl Fn(&Component) + Send + Sync + 'static) -> Self {
        self.complete = Some(Arc::new(complete));
        self
    }
}

#[derive(Clone)]
pub enum InputDecl {
    Handlers(InputHandlers),
    /// `"<component>.<port>"`, re-exporting a sub-component input
    Path(String),
    /// Backed by the behavior of the same name
    Behavior,
}

#[derive(Clone)]
pub enum OutputDecl {
    /// A writable relay
    Relay,
    /// A lazily started stream
    Stream(StreamFn),
    /// `"<component>.<port>"`, re-exporting a sub-component output
    Path(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sink {
    One(String),
    /// Fan-out; entry `i` is registered as `name[i]`
    Many(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionDecl {
    pub source: String,
    pub sink: Sink,
}

#[derive(Clone)]
enum Variant {
    Component,
    View {
        picture: PictureFn,
        renderer: Option<Arc<dyn Render>>,
    },
}

#[derive(Clone)]
pub struct ComponentDef {
    pub(crate) name: String,
    variant: Variant,
    pub(crate) schema: ConfigSchema,
    components: IndexMap<String, ComponentDecl>,
    pub(crate) inputs: IndexMap<String, InputDecl>,
    pub(crate) outputs: IndexMap<String, OutputDecl>,
    connections: IndexMap<String, ConnectionDecl>,
    pub(crate) beh: IndexMap<String, Behavior>,
    construct: Option<ConstructHook>,
    extends: Option<Arc<dyn Construct>>,
    parent_config: Option<ParentConfigFn>,
}

/// Start a component definition
pub fn create_component(name: impl Into<String>) -> ComponentDef {
    ComponentDef::new(name.into(), Variant::Component)
}

/// Start a view definition
///
/// Views accept an optional `props` map and keep a view state that
/// `picture` evaluates into a picture.
pub fn create_view(name: impl Into<String>, picture: impl Fn(&Map) -> Value + Send + Sync + 'static) -> ComponentDef {
    ComponentDef::new(
        name.into(),
        Variant::View {
            picture: Arc::new(picture),
            renderer: None,
        },
    )
}

impl ComponentDef {
    fn new(name: String, variant: Variant) -> Self {
        Self {
            name,
            variant,
            schema: ConfigSchema::new(),
            components: IndexMap::new(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            connections: IndexMap::new(),
            beh: IndexMap::new(),
            construct: None,
            extends: None,
            parent_config: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_view(&self) -> bool {
        matches!(self.variant, Variant::View { .. })
    }

    pub fn config(mut self, name: impl Into<String>, option: ConfigOption) -> Self {
        self.schema.insert(name, option);
        self
    }

    pub fn schema(mut self, schema: ConfigSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Declare a sub-component with a fixed config
    pub fn child(mut self, name: impl Into<String>, kind: Arc<dyn Construct>, config: InstanceConfig) -> Self {
        self.components
            .insert(name.into(), ComponentDecl::Static(ChildSpec::new(kind, config)));
        self
    }

    /// Declare a sub-component derived from the resolved config
    pub fn child_with(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&ConfigMap) -> ChildSpec + Send + Sync + 'static,
    ) -> Self {
        let factory: ChildFactory = Arc::new(factory);
        self.components.insert(name.into(), ComponentDecl::Factory(factory));
        self
    }

    pub fn input(mut self, name: impl Into<String>, decl: InputDecl) -> Self {
        self.inputs.insert(name.into(), decl);
        self
    }

    pub fn input_path(self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.input(name, InputDecl::Path(path.into()))
    }

    pub fn input_handlers(self, name: impl Into<String>, handlers: InputHandlers) -> Self {
        self.input(name, InputDecl::Handlers(handlers))
    }

    /// Declare a behavior-backed input together with its behavior
    pub fn behavior(mut self, name: impl Into<String>, behavior: Behavior) -> Self {
        let name = name.into();
        self.inputs.insert(name.clone(), InputDecl::Behavior);
        self.beh.insert(name, behavior);
        self
    }

    /// Register a behavior without declaring an input
    ///
    /// This also suppresses the setter input of a reconfigurable option of
    /// the same name.
    pub fn beh(mut self, name: impl Into<String>, behavior: Behavior) -> Self {
        self.beh.insert(name.into(), behavior);
        self
    }

    pub fn output(mut self, name: impl Into<String>, decl: OutputDecl) -> Self {
        self.outputs.insert(name.into(), decl);
        self
    }

    pub fn relay_output(self, name: impl Into<String>) -> Self {
        self.output(name, OutputDecl::Relay)
    }

    pub fn output_path(self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.output(name, OutputDecl::Path(path.into()))
    }

    pub fn stream_output(
        self,
        name: impl Into<String>,
        stream: impl Fn(&Component, Observer) -> Option<Teardown> + Send + Sync + 'static,
    ) -> Self {
        self.output(name, OutputDecl::Stream(Arc::new(stream)))
    }

    pub fn connect(mut self, name: impl Into<String>, source: impl Into<String>, sink: impl Into<String>) -> Self {
        self.connections.insert(
            name.into(),
            ConnectionDecl {
                source: source.into(),
                sink: Sink::One(sink.into()),
            },
        );
        self
    }

    pub fn fan_out<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        sinks: impl IntoIterator<Item = S>,
    ) -> Self {
        self.connections.insert(
            name.into(),
            ConnectionDecl {
                source: source.into(),
                sink: Sink::Many(sinks.into_iter().map(Into::into).collect()),
            },
        );
        self
    }

    /// Run `hook` after wiring, before `load` fires
    pub fn on_construct(
        mut self,
        hook: impl Fn(&Component, &InstanceConfig) -> WireResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.construct = Some(Arc::new(hook));
        self
    }

    /// Build on top of another component type
    ///
    /// The base is constructed first; ports this definition does not declare
    /// are looked up on the base.
    pub fn extends(mut self, base: Arc<dyn Construct>) -> Self {
        self.extends = Some(base);
        self
    }

    pub fn parent_config(
        mut self,
        derive: impl Fn(&InstanceConfig) -> InstanceConfig + Send + Sync + 'static,
    ) -> Self {
        self.parent_config = Some(Arc::new(derive));
        self
    }

    /// Attach a renderer to a view; ignored for plain components
    pub fn renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        if let Variant::View { renderer: slot, .. } = &mut self.variant {
            *slot = Some(renderer);
        }
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The schema actually validated; views gain an optional `props` map
    fn effective_schema(&self) -> ConfigSchema {
        let mut schema = self.schema.clone();
        if self.is_view() && !schema.contains(PROPS) {
            schema.insert(PROPS, ConfigOption::optional().with_default(Value::map()));
        }
        schema
    }

    /// Build a live instance
    pub fn instantiate(&self, scheduler: &Scheduler, config: InstanceConfig) -> WireResult<Component> {
        let span = tracing::debug_span!("instantiate", component = %self.name);
        let _enter = span.enter();

        let base = self.build_base(scheduler, &config)?;
        let resolved = self.effective_schema().validate(&config)?;

        let visual = match &self.variant {
            Variant::Component => None,
            Variant::View { picture, renderer } => {
                Some(VisualState::new(picture.clone(), renderer.clone(), resolved.clone()))
            }
        };

        let components = graph::build_components(&self.components, &resolved, scheduler)?;

        let component = Component::from_inner(Arc::new(ComponentInner {
            id: InstanceId::new(),
            type_name: self.name.clone(),
            scheduler: scheduler.clone(),
            config: RwLock::new(resolved),
            components,
            ports: RwLock::new(PortTable::default()),
            connections: Mutex::new(IndexMap::new()),
            visual,
            base,
        }));

        ports::build_inputs(&component, self)?;
        ports::build_outputs(&component, self)?;
        connection::wire(&component, &self.connections)?;
        ports::send_initial_packets(&component);

        if let Some(hook) = &self.construct {
            hook(&component, &config).map_err(|err| match err {
                err @ WireError::Hook(_) => err,
                other => WireError::Hook(other.to_string()),
            })?;
        }

        ports::signal_load(&component);
        tracing::debug!(component = %component.id(), kind = %self.name, "component ready");

        Ok(component)
    }

    fn build_base(&self, scheduler: &Scheduler, config: &InstanceConfig) -> WireResult<Option<Arc<dyn Node>>> {
        let Some(base) = &self.extends else {
            return Ok(None);
        };

        let base_config = match &self.parent_config {
            Some(derive) => derive(config),
            None => config.clone(),
        };
        base.construct(scheduler, base_config)
            .map(Some)
            .map_err(|source| WireError::Child {
                name: base.type_name().to_string(),
                source: Box::new(source),
            })
    }
}

impl Construct for ComponentDef {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn construct(&self, scheduler: &Scheduler, config: InstanceConfig) -> WireResult<Arc<dyn Node>> {
        Ok(Arc::new(self.instantiate(scheduler, config)?))
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("view", &self.is_view())
            .field("config", &self.schema.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("connections", &self.connections)
            .finish()
    }
}
