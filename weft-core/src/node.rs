//! Anything that can sit in a component graph
//!
//! Composite components implement [`Node`], and so can hand-written leaves
//! such as a lazily allocating terminal. [`Construct`] is the factory side:
//! a component type that builds nodes from an instance config.

use crate::component::Component;
use crate::error::WireResult;
use crate::schema::InstanceConfig;
use std::any::Any;
use std::sync::Arc;
use weft_reactive::{Observable, Observer, Relay, Scheduler, Signal, Subscription};
use weft_types::Value;

/// An input port: an observer, plus whether its behavior can be replaced
///
/// Ports built by an instance carry its scheduler, so [`InputPort::send`]
/// queues behind initial packets and `load` instead of overtaking them.
#[derive(Clone, Debug)]
pub struct InputPort {
    observer: Observer,
    rebindable: bool,
    scheduler: Option<Scheduler>,
}

impl InputPort {
    /// A port that delivers synchronously
    pub fn new(observer: Observer) -> Self {
        Self {
            observer,
            rebindable: false,
            scheduler: None,
        }
    }

    /// A port whose writes go through `scheduler`
    pub fn deferred(observer: Observer, scheduler: &Scheduler) -> Self {
        Self {
            scheduler: Some(scheduler.clone()),
            ..Self::new(observer)
        }
    }

    pub(crate) fn rebindable(observer: Observer, scheduler: &Scheduler) -> Self {
        Self {
            rebindable: true,
            ..Self::deferred(observer, scheduler)
        }
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Whether a behavior is bound behind this port
    pub fn is_rebindable(&self) -> bool {
        self.rebindable
    }

    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    /// Deliver a value
    ///
    /// On a deferred port the delivery joins the back of the scheduler
    /// queue; otherwise it runs now.
    pub fn send(&self, value: impl Into<Value>) {
        let value = value.into();
        match &self.scheduler {
            Some(scheduler) => {
                let observer = self.observer.clone();
                scheduler.defer(move || observer.on_next(value));
            }
            None => self.observer.on_next(value),
        }
    }

    /// Deliver a value on the calling stack, skipping the queue
    pub fn send_now(&self, value: impl Into<Value>) {
        self.observer.on_next(value.into());
    }
}

impl From<Observer> for InputPort {
    fn from(observer: Observer) -> Self {
        Self::new(observer)
    }
}

/// An output port: a writable relay or a read-only stream
#[derive(Clone, Debug)]
pub enum OutputPort {
    Relay(Relay),
    Stream(Observable),
}

impl OutputPort {
    pub fn subscribe(&self, observer: Observer) -> Subscription {
        match self {
            OutputPort::Relay(relay) => relay.subscribe(observer),
            OutputPort::Stream(observable) => observable.subscribe(observer),
        }
    }

    /// Write a signal; streams cannot be written and return false
    pub fn write(&self, signal: Signal) -> bool {
        match self {
            OutputPort::Relay(relay) => relay.write(signal),
            OutputPort::Stream(_) => false,
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, OutputPort::Relay(_))
    }

    pub fn has_observers(&self) -> bool {
        match self {
            OutputPort::Relay(relay) => relay.has_observers(),
            OutputPort::Stream(observable) => observable.has_observers(),
        }
    }
}

/// A participant in a component graph
pub trait Node: Send + Sync {
    fn type_name(&self) -> &str;

    fn input(&self, port: &str) -> Option<InputPort>;

    fn output(&self, port: &str) -> Option<OutputPort>;

    /// Called before an input port is looked up by a connection or path
    fn allocate_input(&self, _port: &str) {}

    /// Called before an output port is looked up by a connection or path
    fn allocate_output(&self, _port: &str) {}

    /// Called before `allocate_output` when a parent connects from this node
    fn before_output_connect(&self, _port: &str) {}

    fn as_component(&self) -> Option<&Component> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A component type
pub trait Construct: Send + Sync {
    fn type_name(&self) -> &str;

    fn construct(&self, scheduler: &Scheduler, config: InstanceConfig) -> WireResult<Arc<dyn Node>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_reactive::Recorder;

    #[test]
    fn test_stream_ports_are_read_only() {
        let port = OutputPort::Stream(Observable::new(|_| None));
        assert!(!port.is_writable());
        assert!(!port.write(Signal::ready()));
    }

    #[test]
    fn test_input_port_send() {
        let recorder = Recorder::new();
        let port = InputPort::from(recorder.observer());

        port.send(5);
        assert!(!port.is_rebindable());
        assert_eq!(recorder.values(), vec![Value::from(5)]);
    }

    #[test]
    fn test_deferred_port_queues_sends() {
        let scheduler = Scheduler::new();
        let recorder = Recorder::new();
        let port = InputPort::deferred(recorder.observer(), &scheduler);

        port.send(1);
        port.send_now(2);
        assert_eq!(recorder.values(), vec![Value::from(2)]);
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_until_idle();
        assert_eq!(recorder.values(), vec![Value::from(2), Value::from(1)]);
    }
}
