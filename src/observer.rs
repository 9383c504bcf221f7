//! Diagnostic observers for resolution traceability.
//!
//! Observers are notified when a container starts and finishes resolving a
//! key that was not already cached, and whenever it constructs a component.
//! Hooks run on the resolving thread with no container state borrowed.

use std::rc::Rc;
use std::time::Duration;

use crate::descriptors::ServiceType;
use crate::key::ServiceKey;

/// Hooks into container resolution events.
///
/// All methods have empty default bodies; implement the ones you need.
///
/// # Examples
///
/// ```
/// use bodi::{Container, ContainerObserver, ServiceKey, ServiceType};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     created: Cell<usize>,
/// }
///
/// impl ContainerObserver for CountingObserver {
///     fn object_created(&self, _key: &ServiceKey, _implementation: &ServiceType) {
///         self.created.set(self.created.get() + 1);
///     }
/// }
///
/// let container = Container::new();
/// let observer = Rc::new(CountingObserver::default());
/// container.add_observer(observer.clone());
/// ```
pub trait ContainerObserver {
    /// Called before a registration produces the object for `key`.
    fn resolving(&self, key: &ServiceKey) {
        let _ = key;
    }

    /// Called after the object for `key` was produced.
    fn resolved(&self, key: &ServiceKey, duration: Duration) {
        let _ = (key, duration);
    }

    /// Called after a component was constructed for `key`.
    fn object_created(&self, key: &ServiceKey, implementation: &ServiceType) {
        let _ = (key, implementation);
    }
}

/// Observer that forwards every event to `tracing` at debug level.
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "bodi".to_string(),
        }
    }

    /// Creates a logging observer whose events carry a custom prefix field.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for LoggingObserver {
    fn resolving(&self, key: &ServiceKey) {
        tracing::debug!(prefix = %self.prefix, key = %key, "resolving");
    }

    fn resolved(&self, key: &ServiceKey, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, key = %key, ?duration, "resolved");
    }

    fn object_created(&self, key: &ServiceKey, implementation: &ServiceType) {
        tracing::debug!(prefix = %self.prefix, key = %key, implementation = %implementation, "object created");
    }
}

/// Observer list of one container.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Rc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Rc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, key: &ServiceKey) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &ServiceKey, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn object_created(&self, key: &ServiceKey, implementation: &ServiceType) {
        for observer in &self.observers {
            observer.object_created(key, implementation);
        }
    }
}
