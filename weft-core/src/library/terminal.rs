//! A leaf node with lazily allocated ports
//!
//! A terminal declares no ports up front. Whenever a parent resolves one of
//! its ports, the port is allocated on the spot: inputs record whatever they
//! receive, outputs are relays the host writes into with [`Terminal::emit`].

use crate::error::WireResult;
use crate::node::{Construct, InputPort, Node, OutputPort};
use crate::schema::InstanceConfig;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use weft_reactive::{Recorder, Relay, Scheduler, Signal};
use weft_types::Value;

pub const TYPE_NAME: &str = "terminal";

pub struct Terminal {
    scheduler: Scheduler,
    config: InstanceConfig,
    inputs: Mutex<IndexMap<String, Recorder>>,
    outputs: Mutex<IndexMap<String, Relay>>,
    connected: Mutex<Vec<String>>,
}

impl Terminal {
    pub fn new(scheduler: &Scheduler, config: InstanceConfig) -> Self {
        Self {
            scheduler: scheduler.clone(),
            config,
            inputs: Mutex::new(IndexMap::new()),
            outputs: Mutex::new(IndexMap::new()),
            connected: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// Values received on an allocated input
    pub fn received(&self, port: &str) -> Vec<Value> {
        self.inputs
            .lock()
            .get(port)
            .map(Recorder::values)
            .unwrap_or_default()
    }

    /// Write a value into an allocated output
    pub fn emit(&self, port: &str, value: impl Into<Value>) -> bool {
        let relay = self.outputs.lock().get(port).cloned();
        match relay {
            Some(relay) => relay.write(Signal::Success(value.into())),
            None => {
                tracing::trace!(port, "terminal output was never allocated");
                false
            }
        }
    }

    pub fn input_names(&self) -> Vec<String> {
        self.inputs.lock().keys().cloned().collect()
    }

    pub fn output_names(&self) -> Vec<String> {
        self.outputs.lock().keys().cloned().collect()
    }

    /// Outputs a parent announced it was about to connect, in order
    pub fn connected_outputs(&self) -> Vec<String> {
        self.connected.lock().clone()
    }
}

impl Node for Terminal {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn input(&self, port: &str) -> Option<InputPort> {
        self.inputs
            .lock()
            .get(port)
            .map(|recorder| InputPort::deferred(recorder.observer(), &self.scheduler))
    }

    fn output(&self, port: &str) -> Option<OutputPort> {
        self.outputs.lock().get(port).cloned().map(OutputPort::Relay)
    }

    fn allocate_input(&self, port: &str) {
        self.inputs.lock().entry(port.to_string()).or_insert_with(|| {
            tracing::trace!(port, "terminal input allocated");
            Recorder::new()
        });
    }

    fn allocate_output(&self, port: &str) {
        let scheduler = &self.scheduler;
        self.outputs.lock().entry(port.to_string()).or_insert_with(|| {
            tracing::trace!(port, "terminal output allocated");
            Relay::deferred(scheduler)
        });
    }

    fn before_output_connect(&self, port: &str) {
        self.connected.lock().push(port.to_string());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The terminal component type
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalKind;

impl Construct for TerminalKind {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn construct(&self, scheduler: &Scheduler, config: InstanceConfig) -> WireResult<Arc<dyn Node>> {
        Ok(Arc::new(Terminal::new(scheduler, config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_exist_only_after_allocation() {
        let scheduler = Scheduler::new();
        let terminal = Terminal::new(&scheduler, InstanceConfig::new());

        assert!(terminal.input("keys").is_none());
        terminal.allocate_input("keys");
        terminal.allocate_input("keys");
        assert_eq!(terminal.input_names(), vec!["keys"]);

        terminal.input("keys").unwrap().send("q");
        scheduler.run_until_idle();
        assert_eq!(terminal.received("keys"), vec![Value::from("q")]);
    }

    #[test]
    fn test_emit_requires_allocated_output() {
        let scheduler = Scheduler::new();
        let terminal = Terminal::new(&scheduler, InstanceConfig::new());
        assert!(!terminal.emit("clicks", 1));

        terminal.allocate_output("clicks");
        let recorder = Recorder::new();
        let _sub = terminal.output("clicks").unwrap().subscribe(recorder.observer());
        assert!(terminal.emit("clicks", 1));
        scheduler.run_until_idle();

        assert_eq!(recorder.values(), vec![Value::from(1)]);
    }
}
