//! Lazy push sources
//!
//! An [`Observable`] wraps a subscribe function. The function runs when the
//! first observer attaches and receives a fan-out observer; everything pushed
//! into the fan-out reaches every observer attached at push time. When the
//! last observer disposes, the teardown returned by the subscribe function
//! runs, and a later subscriber starts the source again.

use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::types::{Notification, SubscriptionId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Cleanup returned by a subscribe function
pub type Teardown = Box<dyn FnOnce() + Send>;

type SourceFn = dyn Fn(Observer) -> Option<Teardown> + Send + Sync;

/// How the fan-out reaches observers
#[derive(Clone)]
pub(crate) enum Delivery {
    /// Within the pushing call stack
    Immediate,
    /// Through the back of a scheduler queue
    Deferred(Scheduler),
}

struct BroadcastState {
    observers: Vec<(SubscriptionId, Observer)>,
    active: bool,
    teardown: Option<Teardown>,
}

pub(crate) struct Broadcast {
    source: Box<SourceFn>,
    delivery: Delivery,
    state: Mutex<BroadcastState>,
}

impl Broadcast {
    fn observers(&self) -> Vec<Observer> {
        self.state
            .lock()
            .observers
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }

    /// Deliver a notification to one observer using this source's delivery mode
    pub(crate) fn deliver(&self, observer: Observer, notification: Notification) {
        match &self.delivery {
            Delivery::Immediate => observer.notify(notification),
            Delivery::Deferred(scheduler) => scheduler.defer(move || observer.notify(notification)),
        }
    }

    /// Fan a notification out to the observers attached right now
    pub(crate) fn emit(&self, notification: Notification) {
        for observer in self.observers() {
            self.deliver(observer, notification.clone());
        }
    }
}

fn fan_out(core: &Arc<Broadcast>) -> Observer {
    let next = core.clone();
    let error = core.clone();
    let complete = core.clone();
    Observer::new(move |value| next.emit(Notification::Next(value)))
        .with_error(move |value| error.emit(Notification::Error(value)))
        .with_complete(move || complete.emit(Notification::Complete))
}

/// A lazily started, shared push source
#[derive(Clone)]
pub struct Observable {
    pub(crate) core: Arc<Broadcast>,
}

impl Observable {
    /// Create an observable that delivers synchronously
    pub fn new(subscribe: impl Fn(Observer) -> Option<Teardown> + Send + Sync + 'static) -> Self {
        Self::with_delivery(Delivery::Immediate, subscribe)
    }

    pub(crate) fn with_delivery(
        delivery: Delivery,
        subscribe: impl Fn(Observer) -> Option<Teardown> + Send + Sync + 'static,
    ) -> Self {
        Self {
            core: Arc::new(Broadcast {
                source: Box::new(subscribe),
                delivery,
                state: Mutex::new(BroadcastState {
                    observers: Vec::new(),
                    active: false,
                    teardown: None,
                }),
            }),
        }
    }

    /// Attach an observer
    ///
    /// The first observer starts the source. The returned subscription is the
    /// only way to detach; dropping it leaves the observer attached.
    pub fn subscribe(&self, observer: Observer) -> Subscription {
        let id = SubscriptionId::new();
        let start = {
            let mut state = self.core.state.lock();
            state.observers.push((id, observer));
            if state.active {
                false
            } else {
                state.active = true;
                true
            }
        };

        if start {
            tracing::trace!(subscription = %id, "starting observable source");
            let teardown = (self.core.source)(fan_out(&self.core));
            let mut state = self.core.state.lock();
            if state.active {
                state.teardown = teardown;
            } else if let Some(teardown) = teardown {
                // every observer left while the source was starting
                drop(state);
                teardown();
            }
        }

        Subscription {
            core: Arc::downgrade(&self.core),
            id,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.core.state.lock().observers.len()
    }

    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    /// Whether the subscribe function is currently running
    pub fn is_active(&self) -> bool {
        self.core.state.lock().active
    }

    pub fn ptr_eq(&self, other: &Observable) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deferred = matches!(self.core.delivery, Delivery::Deferred(_));
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .field("active", &self.is_active())
            .field("deferred", &deferred)
            .finish()
    }
}

/// Disposer for one attached observer
pub struct Subscription {
    core: Weak<Broadcast>,
    id: SubscriptionId,
    disposed: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Detach the observer; idempotent
    ///
    /// Detaching the last observer runs the source's teardown.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(core) = self.core.upgrade() else {
            return;
        };

        let teardown = {
            let mut state = core.state.lock();
            state.observers.retain(|(id, _)| *id != self.id);
            if state.observers.is_empty() && state.active {
                state.active = false;
                state.teardown.take()
            } else {
                None
            }
        };

        if let Some(teardown) = teardown {
            tracing::trace!(subscription = %self.id, "last observer left, tearing down source");
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
