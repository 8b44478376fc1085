//! Writable ports
//!
//! A relay is an observable whose subscribe function keeps hold of its
//! fan-out observer, so `write` can dispatch `success`/`error` signals to
//! whoever is attached. Writes with nobody attached are dropped and reported
//! through the return value.

use crate::observable::{Delivery, Observable, Subscription, Teardown};
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::types::Signal;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Relay {
    observable: Observable,
    writer: Arc<Mutex<Option<Observer>>>,
    latch: Option<Arc<Mutex<Option<Signal>>>>,
}

impl Relay {
    /// A relay delivering synchronously within `write`
    pub fn immediate() -> Self {
        Self::build(Delivery::Immediate, false)
    }

    /// A dispatcher-backed relay
    pub fn deferred(scheduler: &Scheduler) -> Self {
        Self::build(Delivery::Deferred(scheduler.clone()), false)
    }

    /// A dispatcher-backed relay that remembers its last write
    ///
    /// Observers attaching after a write receive the remembered signal once.
    pub fn latched(scheduler: &Scheduler) -> Self {
        Self::build(Delivery::Deferred(scheduler.clone()), true)
    }

    fn build(delivery: Delivery, latch: bool) -> Self {
        let writer: Arc<Mutex<Option<Observer>>> = Arc::new(Mutex::new(None));
        let slot = writer.clone();
        let observable = Observable::with_delivery(delivery, move |emitter| {
            *slot.lock() = Some(emitter);
            let slot = slot.clone();
            Some(Box::new(move || {
                slot.lock().take();
            }) as Teardown)
        });

        Self {
            observable,
            writer,
            latch: latch.then(|| Arc::new(Mutex::new(None))),
        }
    }

    /// Dispatch a signal to the attached observers
    ///
    /// Returns false when nobody was attached to receive it.
    pub fn write(&self, signal: Signal) -> bool {
        if let Some(latch) = &self.latch {
            *latch.lock() = Some(signal.clone());
        }
        let writer = self.writer.lock().clone();
        match writer {
            Some(writer) => {
                writer.notify(signal.into());
                true
            }
            None => false,
        }
    }

    pub fn subscribe(&self, observer: Observer) -> Subscription {
        let replay = self.latch.as_ref().and_then(|latch| latch.lock().clone());
        let subscription = self.observable.subscribe(observer.clone());
        if let Some(signal) = replay {
            self.observable.core.deliver(observer, signal.into());
        }
        subscription
    }

    /// The remembered signal of a latched relay
    pub fn latched_signal(&self) -> Option<Signal> {
        self.latch.as_ref().and_then(|latch| latch.lock().clone())
    }

    pub fn has_observers(&self) -> bool {
        self.observable.has_observers()
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    pub fn ptr_eq(&self, other: &Relay) -> bool {
        self.observable.ptr_eq(&other.observable)
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("observable", &self.observable)
            .field("latched", &self.latch.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Recorder;
    use weft_types::Value;

    #[test]
    fn test_write_without_observers_is_dropped() {
        let relay = Relay::immediate();
        assert!(!relay.write(Signal::Success(Value::from(1))));
    }

    #[test]
    fn test_write_dispatches_success_and_error() {
        let relay = Relay::immediate();
        let recorder = Recorder::new();
        let _sub = relay.subscribe(recorder.observer());

        assert!(relay.write(Signal::Success(Value::from(1))));
        assert!(relay.write(Signal::Error(Value::from("oops"))));

        assert_eq!(recorder.values(), vec![Value::from(1)]);
        assert_eq!(recorder.errors(), vec![Value::from("oops")]);
    }

    #[test]
    fn test_teardown_detaches_writer() {
        let relay = Relay::immediate();
        let sub = relay.subscribe(Observer::noop());
        sub.dispose();

        assert!(!relay.write(Signal::ready()));
    }

    #[test]
    fn test_deferred_relay_waits_for_scheduler() {
        let scheduler = Scheduler::new();
        let relay = Relay::deferred(&scheduler);
        let recorder = Recorder::new();
        let _sub = relay.subscribe(recorder.observer());

        relay.write(Signal::Success(Value::from(2)));
        assert!(recorder.is_empty());

        scheduler.run_until_idle();
        assert_eq!(recorder.values(), vec![Value::from(2)]);
    }

    #[test]
    fn test_latched_relay_replays_to_late_observers_once() {
        let scheduler = Scheduler::new();
        let relay = Relay::latched(&scheduler);
        let early = Recorder::new();
        let late = Recorder::new();

        let _a = relay.subscribe(early.observer());
        relay.write(Signal::ready());
        let _b = relay.subscribe(late.observer());
        scheduler.run_until_idle();

        assert_eq!(early.len(), 1);
        assert_eq!(late.len(), 1);
        assert_eq!(relay.latched_signal(), Some(Signal::ready()));
    }
}
