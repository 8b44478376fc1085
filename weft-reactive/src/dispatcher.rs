//! Deferred broadcast
//!
//! A dispatcher wraps a single subscribe function, invokes it only for the
//! first observer, and fans every pushed value out to all current observers
//! through the scheduler. Because delivery always goes through the back of
//! the queue, subscribing and then pushing in the same call stack never
//! re-enters the observer.

use crate::observable::{Delivery, Observable, Subscription, Teardown};
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::types::Notification;
use weft_types::Value;

#[derive(Clone, Debug)]
pub struct Dispatcher {
    observable: Observable,
}

impl Dispatcher {
    pub fn new(
        scheduler: &Scheduler,
        subscribe: impl Fn(Observer) -> Option<Teardown> + Send + Sync + 'static,
    ) -> Self {
        Self {
            observable: Observable::with_delivery(Delivery::Deferred(scheduler.clone()), subscribe),
        }
    }

    pub fn subscribe(&self, observer: Observer) -> Subscription {
        self.observable.subscribe(observer)
    }

    /// Push a value to every observer attached right now
    pub fn push(&self, value: Value) {
        self.observable.core.emit(Notification::Next(value));
    }

    pub fn has_observers(&self) -> bool {
        self.observable.has_observers()
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    pub fn into_observable(self) -> Observable {
        self.observable
    }
}

impl From<Dispatcher> for Observable {
    fn from(dispatcher: Dispatcher) -> Self {
        dispatcher.observable
    }
}
