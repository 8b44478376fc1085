//! weft-reactive - push-based reactive ports
//!
//! This crate provides the reactive primitive every weft port is built on.
//!
//! # Core Concepts
//!
//! ## Observers
//!
//! An [`Observer`] is a sink with three callbacks: `onNext`, `onError` and
//! `onComplete`. Input ports are observers.
//!
//! ## Observables
//!
//! An [`Observable`] is a lazy push source. Its subscribe function runs once
//! while at least one observer is attached; pushes fan out to all attached
//! observers. Output ports are observables.
//!
//! ## Dispatchers and the scheduler
//!
//! A [`Dispatcher`] is an observable whose fan-out goes through the back of a
//! [`Scheduler`] queue instead of the pushing call stack. Hosts drive the
//! queue explicitly (`tick`, `run_until_idle`), which keeps delivery
//! asynchronous but single-threaded and deterministic.
//!
//! ## Relays
//!
//! A [`Relay`] is a writable observable: `write(Signal::Success(v))` reaches
//! every attached observer's `onNext`, `write(Signal::Error(e))` its
//! `onError`.
//!
//! # Example
//!
//! ```rust
//! use weft_reactive::{Recorder, Relay, Scheduler, Signal};
//! use weft_types::Value;
//!
//! let scheduler = Scheduler::new();
//! let relay = Relay::deferred(&scheduler);
//! let recorder = Recorder::new();
//!
//! let subscription = relay.subscribe(recorder.observer());
//! relay.write(Signal::Success(Value::from(42)));
//!
//! // nothing is delivered until the queue runs
//! assert!(recorder.is_empty());
//! scheduler.run_until_idle();
//! assert_eq!(recorder.values(), vec![Value::from(42)]);
//!
//! subscription.dispose();
//! ```

pub mod dispatcher;
pub mod observable;
pub mod observer;
pub mod relay;
pub mod scheduler;
pub mod types;

pub use dispatcher::Dispatcher;
pub use observable::{Observable, Subscription, Teardown};
pub use observer::{Observer, Recorder};
pub use relay::Relay;
pub use scheduler::{RunReport, Scheduler};
pub use types::{Notification, Signal, SubscriptionId};
