//! Core signal and identity types for reactive ports

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_types::Value;

/// Subscription identifier
///
/// Returned inside every [`crate::Subscription`], used to later remove the
/// observer from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

static SUBSCRIPTION_COUNTER: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    /// Create a new unique subscription ID
    pub fn new() -> Self {
        Self(SUBSCRIPTION_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// A single delivery to an observer
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A value (`onNext`)
    Next(Value),
    /// An error value (`onError`)
    Error(Value),
    /// End of stream (`onComplete`)
    Complete,
}

impl Notification {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Notification::Next(value) | Notification::Error(value) => Some(value),
            Notification::Complete => None,
        }
    }

    pub fn is_next(&self) -> bool {
        matches!(self, Notification::Next(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }
}

/// A write into a relay port
///
/// Relays only carry `success` and `error` writes; completion belongs to
/// the source side of a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Success(Value),
    Error(Value),
}

impl Signal {
    /// The `success` signal without a payload
    pub fn ready() -> Self {
        Signal::Success(Value::Null)
    }
}

impl From<Signal> for Notification {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Success(value) => Notification::Next(value),
            Signal::Error(value) => Notification::Error(value),
        }
    }
}
