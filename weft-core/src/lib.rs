//! weft-core - the component wiring engine
//!
//! This crate turns declarative component definitions into live, wired
//! instances whose ports are backed by `weft-reactive` primitives.
//!
//! # Core Concepts
//!
//! ## Definitions and instances
//!
//! A [`ComponentDef`] declares a config schema, sub-components, inputs,
//! outputs, connections and behaviors. [`ComponentDef::instantiate`] checks
//! the config, builds the sub-component graph, resolves every port, wires
//! the connections and returns a [`Component`]. Any failure aborts the whole
//! construction with a [`WireError`].
//!
//! ## Ports and paths
//!
//! Inputs are observers, outputs are relays or lazy streams. Ports of
//! sub-components are addressed as `"<component>.<port>"`, and `this` names
//! the instance itself. Every instance has a `props` input and a latched
//! `load` output that fires once construction completes.
//!
//! ## Behaviors
//!
//! A behavior-backed input runs a [`Behavior`] for every value it receives.
//! The behavior returns [`Outputs`]: values to emit, and optionally the
//! behavior that handles the next value. State machines are written by
//! rebinding rather than by mutating fields.
//!
//! ## Initial packets
//!
//! After wiring, every resolved config option that has an input of the same
//! name is delivered to that input once, through the scheduler.
//! [`InputPort::send`] on an instance's ports goes through the same queue,
//! so a write made right after construction lands after those packets.
//!
//! # Example
//!
//! ```rust
//! use weft_core::{create_component, Behavior, ConfigOption, InstanceConfig, Outputs};
//! use weft_reactive::{Recorder, Scheduler};
//! use weft_types::{Value, ValueKind};
//!
//! let doubler = create_component("doubler")
//!     .config("factor", ConfigOption::optional().of_type(ValueKind::Number).with_default(2))
//!     .behavior("input", Behavior::new(|this, value| {
//!         let factor = this.config_value("factor").and_then(|f| f.as_f64()).unwrap_or(1.0);
//!         let value = value.as_f64().ok_or_else(|| Value::from("not a number"))?;
//!         Ok(Outputs::new().emit("output", value * factor))
//!     }))
//!     .relay_output("output");
//!
//! let scheduler = Scheduler::new();
//! let instance = doubler.instantiate(&scheduler, InstanceConfig::new()).unwrap();
//! let recorder = Recorder::new();
//! let _sub = instance.output("output").unwrap().subscribe(recorder.observer());
//!
//! instance.input("input").unwrap().send(21);
//! scheduler.run_until_idle();
//! assert_eq!(recorder.values(), vec![Value::from(42)]);
//! ```

pub mod behavior;
pub mod component;
pub mod connection;
pub mod def;
mod engine;
pub mod error;
pub mod graph;
pub mod library;
pub mod manifest;
pub mod node;
mod ports;
pub mod path;
pub mod registry;
pub mod schema;
pub mod view;

pub use behavior::{Behavior, BehaviorResult, Emission, Outputs, Rebind};
pub use component::{Component, LOAD, PROPS};
pub use connection::Connection;
pub use def::{
    create_component, create_view, ComponentDef, ConnectionDecl, InputDecl, InputHandlers, OutputDecl,
    Sink,
};
pub use error::{Direction, WireError, WireResult};
pub use graph::{ChildSpec, ComponentDecl};
pub use manifest::{Manifest, ManifestError};
pub use node::{Construct, InputPort, Node, OutputPort};
pub use path::{PortOwner, PortPath, THIS};
pub use ports::ROOT;
pub use registry::{Registry, FN_KEY};
pub use schema::{ConfigMap, ConfigOption, ConfigSchema, Expect, InstanceConfig};
pub use view::{Render, PICTURE};
