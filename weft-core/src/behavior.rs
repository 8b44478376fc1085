//! Behaviors
//!
//! A behavior is what runs when a value reaches a behavior-backed input. It
//! returns an [`Outputs`] describing what to emit, and optionally which
//! behavior should handle the next delivery. That rebinding is how stateful
//! components carry state without mutable fields.

use crate::component::Component;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use weft_reactive::Observer;
use weft_types::Value;

/// What a behavior invocation yields; `Err` is routed to the error outputs
pub type BehaviorResult = Result<Outputs, Value>;

pub type Handler = Arc<dyn Fn(&Component, Value) -> BehaviorResult + Send + Sync>;
pub type CompleteHandler = Arc<dyn Fn(&Component) -> BehaviorResult + Send + Sync>;

/// Pushes values into an output observer, one subscription at a time
pub type Producer = Arc<dyn Fn(Observer) + Send + Sync>;

/// A function bound to an input port
///
/// Built from a single success handler it acts like a plain function.
/// Adding error or complete handlers makes it observer-shaped: error and
/// completion signals then run through the same output processing.
#[derive(Clone)]
pub struct Behavior {
    success: Handler,
    error: Option<Handler>,
    complete: Option<CompleteHandler>,
}

impl Behavior {
    pub fn new(success: impl Fn(&Component, Value) -> BehaviorResult + Send + Sync + 'static) -> Self {
        Self {
            success: Arc::new(success),
            error: None,
            complete: None,
        }
    }

    pub fn with_error(mut self, error: impl Fn(&Component, Value) -> BehaviorResult + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(error));
        self
    }

    pub fn with_complete(mut self, complete: impl Fn(&Component) -> BehaviorResult + Send + Sync + 'static) -> Self {
        self.complete = Some(Arc::new(complete));
        self
    }

    /// A behavior that accepts values and does nothing
    pub fn ignore() -> Self {
        Self::new(|_, _| Ok(Outputs::new()))
    }

    pub fn is_observer_shaped(&self) -> bool {
        self.error.is_some() || self.complete.is_some()
    }

    pub(crate) fn success(&self) -> &Handler {
        &self.success
    }

    pub(crate) fn error(&self) -> Option<&Handler> {
        self.error.as_ref()
    }

    pub(crate) fn complete(&self) -> Option<&CompleteHandler> {
        self.complete.as_ref()
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

/// A value headed for one output port
#[derive(Clone)]
pub enum Emission {
    Value(Value),
    /// Subscribed once; every value it pushes is delivered to the port
    Producer(Producer),
}

impl fmt::Debug for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emission::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Emission::Producer(_) => f.write_str("Producer"),
        }
    }
}

/// Behavior replacement requested by a behavior
#[derive(Clone, Debug)]
pub enum Rebind {
    /// Replace the behavior of the port that just ran
    This(Behavior),
    /// Replace the behaviors of the named ports
    Ports(IndexMap<String, Behavior>),
}

/// The result map of one behavior invocation
#[derive(Clone, Debug, Default)]
pub struct Outputs {
    emissions: IndexMap<String, Emission>,
    next: Option<Rebind>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a value on an output port
    ///
    /// The `picture` key on a view merges into its view state instead.
    pub fn emit(mut self, port: impl Into<String>, value: impl Into<Value>) -> Self {
        self.emissions.insert(port.into(), Emission::Value(value.into()));
        self
    }

    pub fn produce(mut self, port: impl Into<String>, producer: impl Fn(Observer) + Send + Sync + 'static) -> Self {
        self.emissions.insert(port.into(), Emission::Producer(Arc::new(producer)));
        self
    }

    /// Handle the next delivery on this port with `behavior`
    pub fn next(mut self, behavior: Behavior) -> Self {
        self.next = Some(Rebind::This(behavior));
        self
    }

    /// Replace the behavior of another port
    ///
    /// Replaces a pending [`Outputs::next`]; several `rebind` calls
    /// accumulate.
    pub fn rebind(mut self, port: impl Into<String>, behavior: Behavior) -> Self {
        match &mut self.next {
            Some(Rebind::Ports(ports)) => {
                ports.insert(port.into(), behavior);
            }
            _ => {
                let mut ports = IndexMap::new();
                ports.insert(port.into(), behavior);
                self.next = Some(Rebind::Ports(ports));
            }
        }
        self
    }

    pub fn get(&self, port: &str) -> Option<&Emission> {
        self.emissions.get(port)
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty() && self.next.is_none()
    }

    pub fn into_parts(self) -> (IndexMap<String, Emission>, Option<Rebind>) {
        (self.emissions, self.next)
    }
}

/// The replaceable behavior behind one input port
pub(crate) struct BehaviorSlot {
    port: String,
    current: Mutex<Behavior>,
    generation: AtomicU64,
}

impl BehaviorSlot {
    pub(crate) fn new(port: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            port: port.into(),
            current: Mutex::new(behavior),
            generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn port(&self) -> &str {
        &self.port
    }

    pub(crate) fn current(&self) -> Behavior {
        self.current.lock().clone()
    }

    pub(crate) fn rebind(&self, behavior: Behavior) {
        *self.current.lock() = behavior;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of times the behavior was replaced
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebind_accumulates_and_replaces_next() {
        let outputs = Outputs::new()
            .next(Behavior::ignore())
            .rebind("input", Behavior::ignore())
            .rebind("reset", Behavior::ignore());

        match outputs.into_parts().1 {
            Some(Rebind::Ports(ports)) => {
                assert_eq!(ports.keys().collect::<Vec<_>>(), vec!["input", "reset"]);
            }
            other => panic!("unexpected rebind: {other:?}"),
        }
    }

    #[test]
    fn test_emit_keeps_declaration_order() {
        let outputs = Outputs::new().emit("b", 1).emit("a", 2);
        let (emissions, next) = outputs.into_parts();

        assert_eq!(emissions.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(next.is_none());
    }

    #[test]
    fn test_slot_generation() {
        let slot = BehaviorSlot::new("input", Behavior::ignore());
        assert_eq!(slot.port(), "input");
        assert_eq!(slot.generation(), 0);

        slot.rebind(Behavior::ignore().with_complete(|_| Ok(Outputs::new())));
        assert_eq!(slot.generation(), 1);
        assert!(slot.current().is_observer_shaped());
    }
}
