//! Three-callback sinks

use crate::types::Notification;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use weft_types::Value;

type NextFn = dyn Fn(Value) + Send + Sync;
type CompleteFn = dyn Fn() + Send + Sync;

/// A sink with `onNext`, `onError` and `onComplete` callbacks
///
/// Observers are cheap to clone; clones share the same callbacks. Only the
/// `onNext` callback is mandatory. Errors delivered to an observer without an
/// error callback are logged, completions without a callback are ignored.
#[derive(Clone)]
pub struct Observer {
    next: Arc<NextFn>,
    error: Option<Arc<NextFn>>,
    complete: Option<Arc<CompleteFn>>,
}

impl Observer {
    pub fn new(on_next: impl Fn(Value) + Send + Sync + 'static) -> Self {
        Self {
            next: Arc::new(on_next),
            error: None,
            complete: None,
        }
    }

    pub fn with_error(mut self, on_error: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(on_error));
        self
    }

    pub fn with_complete(mut self, on_complete: impl Fn() + Send + Sync + 'static) -> Self {
        self.complete = Some(Arc::new(on_complete));
        self
    }

    /// An observer that ignores everything
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn on_next(&self, value: Value) {
        (self.next)(value)
    }

    pub fn on_error(&self, error: Value) {
        match &self.error {
            Some(on_error) => on_error(error),
            None => tracing::debug!(error = %error, "error signal reached an observer without an error callback"),
        }
    }

    pub fn on_complete(&self) {
        if let Some(on_complete) = &self.complete {
            on_complete();
        }
    }

    pub fn notify(&self, notification: Notification) {
        match notification {
            Notification::Next(value) => self.on_next(value),
            Notification::Error(error) => self.on_error(error),
            Notification::Complete => self.on_complete(),
        }
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

/// An observer that collects everything it receives, for tests and hosts
#[derive(Clone, Default)]
pub struct Recorder {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer feeding this recorder
    pub fn observer(&self) -> Observer {
        let next = self.received.clone();
        let error = self.received.clone();
        let complete = self.received.clone();
        Observer::new(move |value| next.lock().push(Notification::Next(value)))
            .with_error(move |value| error.lock().push(Notification::Error(value)))
            .with_complete(move || complete.lock().push(Notification::Complete))
    }

    /// All notifications received so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// The `onNext` values received so far
    pub fn values(&self) -> Vec<Value> {
        self.received
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Next(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// The `onError` values received so far
    pub fn errors(&self) -> Vec<Value> {
        self.received
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Error(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().is_empty()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }
}
