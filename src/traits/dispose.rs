//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for components that need structured teardown (e.g.,
/// flushing caches, closing connections) and opt in from
/// [`Component::describe`](crate::Component::describe) with
/// [`ComponentBuilder::disposable`](crate::ComponentBuilder::disposable).
/// Pooled instances are disposed exactly once, in LIFO order, when their
/// owning container is disposed.
///
/// # Examples
///
/// ```
/// use bodi::{Component, ComponentBuilder, Constructor, Container, Dispose};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Cache {
///     flushed: AtomicBool,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// impl Component for Cache {
///     fn describe(c: &mut ComponentBuilder<Self>) {
///         c.constructor(Constructor::new([], |_| Ok(Cache::default())))
///             .disposable();
///     }
/// }
///
/// let container = Container::new();
/// let cache = container.resolve::<Cache>().unwrap();
/// container.dispose();
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
