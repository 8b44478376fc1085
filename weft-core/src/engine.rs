//! Behavior execution
//!
//! Each behavior-backed input is an observer whose callbacks look up the
//! port's current behavior, run it, and apply the returned [`Outputs`]:
//! rebinding first, then emissions in declaration order. A failing behavior
//! has its error routed to the instance's relay outputs.

use crate::behavior::{Behavior, BehaviorSlot, Emission, Outputs, Producer, Rebind};
use crate::component::{Component, ComponentInner};
use crate::node::{InputPort, OutputPort};
use crate::view::PICTURE;
use std::sync::{Arc, Weak};
use weft_reactive::{Observable, Observer, Signal};
use weft_types::Value;

enum Phase {
    Next(Value),
    Error(Value),
    Complete,
}

/// Create an input port backed by a replaceable behavior
pub(crate) fn behavior_port(component: &Component, port: &str, behavior: Behavior) -> (InputPort, Arc<BehaviorSlot>) {
    let slot = Arc::new(BehaviorSlot::new(port, behavior));
    let owner = component.downgrade();

    let next = (owner.clone(), slot.clone());
    let error = (owner.clone(), slot.clone());
    let complete = (owner, slot.clone());
    let observer = Observer::new(move |value| run(&next.0, &next.1, Phase::Next(value)))
        .with_error(move |value| run(&error.0, &error.1, Phase::Error(value)))
        .with_complete(move || run(&complete.0, &complete.1, Phase::Complete));

    (InputPort::rebindable(observer, component.scheduler()), slot)
}

fn run(owner: &Weak<ComponentInner>, slot: &BehaviorSlot, phase: Phase) {
    let Some(component) = Component::upgrade(owner) else {
        tracing::trace!(port = slot.port(), "delivery to a dropped component");
        return;
    };

    let behavior = slot.current();
    let result = match phase {
        Phase::Next(value) => (behavior.success())(&component, value),
        Phase::Error(error) => match behavior.error() {
            Some(handler) => handler(&component, error),
            None => {
                tracing::debug!(
                    component = %component.id(),
                    port = slot.port(),
                    error = %error,
                    "error signal ignored by behavior without an error handler"
                );
                return;
            }
        },
        Phase::Complete => match behavior.complete() {
            Some(handler) => handler(&component),
            None => return,
        },
    };

    match result {
        Ok(outputs) => component.apply(slot.port(), outputs),
        Err(error) => component.fail(slot.port(), error),
    }
}

impl Component {
    /// Apply the result of a behavior that ran on `port`
    pub(crate) fn apply(&self, port: &str, outputs: Outputs) {
        let (emissions, next) = outputs.into_parts();

        match next {
            Some(Rebind::This(behavior)) => {
                self.rebind(port, behavior);
            }
            Some(Rebind::Ports(ports)) => {
                for (name, behavior) in ports {
                    self.rebind(&name, behavior);
                }
            }
            None => {}
        }

        for (name, emission) in emissions {
            match emission {
                Emission::Value(value) => self.emit(&name, value),
                Emission::Producer(producer) => self.pipe(&name, producer),
            }
        }
    }

    /// Write a success signal to an output port
    ///
    /// On a view, `picture` merges into the view state and schedules an
    /// update instead. Emissions to missing or read-only ports are dropped.
    pub fn emit(&self, port: &str, value: impl Into<Value>) {
        let value = value.into();

        if port == PICTURE && self.is_view() {
            self.update_view_state(&value);
            return;
        }

        match self.output(port) {
            Some(output) => {
                if !output.write(Signal::Success(value)) {
                    tracing::trace!(component = %self.id(), port, "emission not delivered");
                }
            }
            None => {
                tracing::trace!(component = %self.id(), port, "emission to undeclared output dropped");
            }
        }
    }

    /// Subscribe a producer once and deliver everything it pushes to `port`
    fn pipe(&self, port: &str, producer: Producer) {
        let source = Observable::new(move |observer| {
            producer(observer);
            None
        });

        let owner = self.downgrade();
        let port = port.to_string();
        // the subscription is never disposed; the producer owns the stream's lifetime
        let _subscription = source.subscribe(Observer::new(move |value| {
            if let Some(component) = Component::upgrade(&owner) {
                component.emit(&port, value);
            }
        }));
    }

    /// Route a behavior failure to every locally declared relay output
    pub(crate) fn fail(&self, port: &str, error: Value) {
        tracing::error!(component = %self.id(), port, error = %error, "behavior failed");

        let routes: Vec<OutputPort> = {
            let ports = self.inner.ports.read();
            ports
                .error_routes
                .iter()
                .filter_map(|name| ports.outputs.get(name).cloned())
                .collect()
        };
        for output in routes {
            output.write(Signal::Error(error.clone()));
        }
    }
}
