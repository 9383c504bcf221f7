//! The object container and its public surface.

mod resolver;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::component::{Component, Factory};
use crate::config::RegistrationProvider;
use crate::descriptors::{Instance, Service, ServiceType};
use crate::internal::{Disposer, InstanceCache, ResolutionPath};
use crate::key::ServiceKey;
use crate::observer::{ContainerObserver, Observers};
use crate::registration::{FactoryRegistration, InstanceRegistration, Registration, Registry, TypeRegistration};
use crate::{DiError, DiResult};

pub(crate) use resolver::Resolver;

/// Hierarchical dependency injection container.
///
/// A container owns its registrations, a cache of every object it has
/// resolved, and a pool of the objects it has constructed. Child containers
/// see their parent's registrations and override them with their own;
/// objects resolved through a parent-owned registration are shared with the
/// parent.
///
/// `Container` is a cheap handle (`Clone` shares the same container). It is
/// neither `Send` nor `Sync`: each container belongs to one thread.
///
/// # Examples
///
/// ```rust
/// use bodi::{Component, ComponentBuilder, Constructor, Container};
/// use std::sync::Arc;
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// bodi::interface!(dyn Greeter);
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// impl Component for English {
///     fn describe(c: &mut ComponentBuilder<Self>) {
///         c.constructor(Constructor::new([], |_| Ok(English)))
///             .implements::<dyn Greeter>(|english| english);
///     }
/// }
///
/// let container = Container::new();
/// container.register_type_as::<English, dyn Greeter>(None).unwrap();
///
/// let greeter = container.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// assert!(Arc::ptr_eq(&greeter, &container.resolve::<dyn Greeter>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

struct ContainerInner {
    parent: Option<Container>,
    registry: RefCell<Registry>,
    resolved: RefCell<InstanceCache>,
    pool: RefCell<InstanceCache>,
    observers: RefCell<Observers>,
    disposed: Cell<bool>,
}

impl Container {
    /// Creates a root container.
    pub fn new() -> Self {
        Self::create(None)
    }

    /// Creates a container whose lookups fall back to `parent`.
    pub fn with_parent(parent: &Container) -> Self {
        Self::create(Some(parent.clone()))
    }

    /// Creates a child of this container.
    pub fn create_child(&self) -> Self {
        let child = Self::with_parent(self);
        debug!(depth = child.stack().len() - 1, "created child container");
        child
    }

    fn create(parent: Option<Container>) -> Self {
        let observers = parent
            .as_ref()
            .map(|parent| parent.observers())
            .unwrap_or_default();
        Self {
            inner: Rc::new(ContainerInner {
                parent,
                registry: RefCell::new(Registry::new()),
                resolved: RefCell::new(InstanceCache::default()),
                pool: RefCell::new(InstanceCache::default()),
                observers: RefCell::new(observers),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// Returns `true` if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Registers a hook notified about resolutions in this container and
    /// in children created afterwards.
    pub fn add_observer(&self, observer: Rc<dyn ContainerObserver>) {
        self.inner.observers.borrow_mut().add(observer);
    }

    // Registration

    /// Maps `service` (optionally named) to `implementation`.
    ///
    /// Fails with [`DiError::InvalidTypeMapping`] when `implementation` does
    /// not satisfy `service`, and with [`DiError::AlreadyResolved`] when the
    /// key has already been resolved from this container.
    pub fn register_type(&self, implementation: &ServiceType, service: &ServiceType, name: Option<&str>) -> DiResult<()> {
        self.assert_not_disposed()?;
        if !is_valid_mapping(implementation, service) {
            return Err(DiError::InvalidTypeMapping {
                implementation: implementation.to_string(),
                service: service.to_string(),
            });
        }
        let key = ServiceKey::new(service.clone(), name);
        self.add_registration(Rc::new(TypeRegistration::new(key, implementation.clone())))
    }

    pub fn register_type_as<C: Component, S: Service + ?Sized>(&self, name: Option<&str>) -> DiResult<()> {
        self.register_type(&C::service_type(), &S::service_type(), name)
    }

    /// Registers a pre-built component under the service `S`.
    ///
    /// The instance is also pooled under its own type, so resolving `C` with
    /// the same name returns it, unless that pool slot already holds an
    /// object; pooled objects are never replaced. Unless `suppress_disposal` is set, a
    /// disposable instance is disposed together with this container.
    pub fn register_instance_as<S: Service + ?Sized, C: Component>(
        &self,
        instance: Arc<C>,
        name: Option<&str>,
        suppress_disposal: bool,
    ) -> DiResult<()> {
        let shown = instance.clone();
        self.add_instance(
            &S::service_type(),
            instance,
            &C::service_type(),
            name,
            suppress_disposal,
            Box::new(move || shown.render()),
        )
    }

    /// Registers a pre-built component as itself.
    pub fn register_instance<C: Component>(&self, instance: Arc<C>) -> DiResult<()> {
        self.register_instance_as::<C, C>(instance, None, false)
    }

    /// Type-erased form of [`register_instance_as`](Self::register_instance_as).
    ///
    /// `instance` must be the concrete representation of `concrete`.
    pub fn register_instance_with(
        &self,
        service: &ServiceType,
        instance: Instance,
        concrete: &ServiceType,
        name: Option<&str>,
        suppress_disposal: bool,
    ) -> DiResult<()> {
        let shown = concrete.to_string();
        self.add_instance(service, instance, concrete, name, suppress_disposal, Box::new(move || shown.clone()))
    }

    fn add_instance(
        &self,
        service: &ServiceType,
        instance: Instance,
        concrete: &ServiceType,
        name: Option<&str>,
        suppress_disposal: bool,
        render: Box<dyn Fn() -> String>,
    ) -> DiResult<()> {
        self.assert_not_disposed()?;
        let activator = concrete.activator();
        let registered = if service == concrete {
            instance.clone()
        } else {
            activator
                .as_ref()
                .and_then(|activator| activator.cast(instance.clone(), service.identity()))
                .ok_or_else(|| DiError::InvalidTypeMapping {
                    implementation: concrete.to_string(),
                    service: service.to_string(),
                })?
        };

        let key = ServiceKey::new(service.clone(), name);
        self.assert_not_resolved(&key)?;

        let disposer = if suppress_disposal {
            None
        } else {
            activator.and_then(|activator| activator.disposer())
        };
        let pool_key = ServiceKey::new(concrete.clone(), name);
        let pooled = self
            .inner
            .pool
            .borrow_mut()
            .insert_or_retain(pool_key.clone(), instance, disposer);
        if !pooled {
            debug!(key = %pool_key, "pool slot already taken; instance kept for disposal only");
        }
        self.add_registration(Rc::new(InstanceRegistration::new(key, registered, render)))
    }

    /// Registers a factory for the service `S`.
    pub fn register_factory<S: Service + ?Sized>(&self, factory: Factory<S>, name: Option<&str>) -> DiResult<()> {
        self.assert_not_disposed()?;
        let key = ServiceKey::new(S::service_type(), name);
        let (parameters, build) = factory.erase();
        self.add_registration(Rc::new(FactoryRegistration::new(key, parameters, build)))
    }

    /// Registers every mapping supplied by `provider`, in order.
    pub fn register_from(&self, provider: &dyn RegistrationProvider) -> DiResult<()> {
        for mapping in provider.registrations()? {
            self.register_type(&mapping.implementation, &mapping.service, mapping.name.as_deref())?;
        }
        Ok(())
    }

    fn add_registration(&self, registration: Rc<dyn Registration>) -> DiResult<()> {
        self.assert_not_resolved(registration.key())?;
        debug!(key = %registration.key(), target = %registration, "registered");
        self.inner.registry.borrow_mut().add(registration);
        Ok(())
    }

    /// Returns `true` if this container itself has a registration for the key.
    ///
    /// Parent registrations are not considered.
    pub fn is_registered<S: Service + ?Sized>(&self, name: Option<&str>) -> DiResult<bool> {
        self.is_registered_type(&S::service_type(), name)
    }

    pub fn is_registered_type(&self, service: &ServiceType, name: Option<&str>) -> DiResult<bool> {
        self.assert_not_disposed()?;
        Ok(self.inner.registry.borrow().contains(&ServiceKey::new(service.clone(), name)))
    }

    // Resolution

    pub fn resolve<S: Service + ?Sized>(&self) -> DiResult<Arc<S>> {
        self.resolve_as::<S>(None)
    }

    pub fn resolve_named<S: Service + ?Sized>(&self, name: &str) -> DiResult<Arc<S>> {
        self.resolve_as::<S>(Some(name))
    }

    fn resolve_as<S: Service + ?Sized>(&self, name: Option<&str>) -> DiResult<Arc<S>> {
        let instance = self.resolve_type(&S::service_type(), name)?;
        S::from_instance(instance).ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<S>().to_string()))
    }

    /// Type-erased resolution.
    pub fn resolve_type(&self, service: &ServiceType, name: Option<&str>) -> DiResult<Instance> {
        let key = ServiceKey::new(service.clone(), name);
        Resolver::new(self).resolve(&key, &ResolutionPath::new())
    }

    /// Resolves every registration of exactly `S`, across names and the container chain.
    ///
    /// Registrations shadowed by a child's registration with the same key
    /// are skipped. Results follow registration order, this container first.
    pub fn resolve_all<S: Service + ?Sized>(&self) -> DiResult<Vec<Arc<S>>> {
        Resolver::new(self)
            .resolve_all(&S::service_type())?
            .into_iter()
            .map(|instance| {
                S::from_instance(instance).ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<S>().to_string()))
            })
            .collect()
    }

    // Disposal

    /// Disposes every disposable object this container pooled, exactly once,
    /// then drops all registrations and cached objects.
    ///
    /// Parent containers are unaffected. Calling `dispose` again is a no-op;
    /// any other call on a disposed container fails with
    /// [`DiError::ContainerDisposed`].
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let pool = std::mem::take(&mut *self.inner.pool.borrow_mut());
        let disposables = pool.into_disposables();
        debug!(disposables = disposables.len(), "disposing container");
        for (instance, disposer) in disposables {
            disposer(&instance);
        }
        self.inner.registry.borrow_mut().clear();
        let resolved = std::mem::take(&mut *self.inner.resolved.borrow_mut());
        drop(resolved);
    }

    // Crate-internal plumbing used by the resolver and registrations.

    pub(crate) fn assert_not_disposed(&self) -> DiResult<()> {
        if self.inner.disposed.get() {
            Err(DiError::ContainerDisposed)
        } else {
            Ok(())
        }
    }

    fn assert_not_resolved(&self, key: &ServiceKey) -> DiResult<()> {
        if self.inner.resolved.borrow().contains(key) {
            return Err(DiError::AlreadyResolved(key.to_string()));
        }
        Ok(())
    }

    /// This container followed by its ancestors, nearest first.
    pub(crate) fn stack(&self) -> Vec<Container> {
        std::iter::successors(Some(self.clone()), |container| container.parent().cloned()).collect()
    }

    pub(crate) fn registration(&self, key: &ServiceKey) -> Option<Rc<dyn Registration>> {
        self.inner.registry.borrow().get(key)
    }

    pub(crate) fn registrations_of(&self, service: &ServiceType) -> Vec<Rc<dyn Registration>> {
        self.inner.registry.borrow().all_of(service)
    }

    pub(crate) fn cached(&self, key: &ServiceKey) -> Option<Instance> {
        self.inner.resolved.borrow().get(key)
    }

    pub(crate) fn cache(&self, key: ServiceKey, instance: Instance) -> Instance {
        self.inner.resolved.borrow_mut().get_or_insert(key, instance, None)
    }

    pub(crate) fn pooled(&self, key: &ServiceKey) -> Option<Instance> {
        self.inner.pool.borrow().get(key)
    }

    pub(crate) fn pool(&self, key: ServiceKey, instance: Instance, disposer: Option<Disposer>) -> Instance {
        self.inner.pool.borrow_mut().get_or_insert(key, instance, disposer)
    }

    pub(crate) fn observers(&self) -> Observers {
        self.inner.observers.borrow().clone()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that `implementation` can stand in for `service`.
fn is_valid_mapping(implementation: &ServiceType, service: &ServiceType) -> bool {
    if implementation == service {
        return true;
    }
    if implementation.is_open_generic() {
        return service.is_open_generic() && implementation.implements_definition(service.identity());
    }
    if service.is_open_generic() {
        return false;
    }
    implementation
        .activator()
        .map(|activator| activator.implements(service.identity()))
        .unwrap_or(false)
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(registry) = self.inner.registry.try_borrow() else {
            return f.write_str("<registry in use>");
        };
        for registration in registry.all().filter(|registration| !registration.is_synthesized()) {
            writeln!(f, "{} -> {}", registration.key(), registration)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("depth", &(self.stack().len() - 1))
            .field("registrations", &self.inner.registry.try_borrow().map(|r| r.len()).ok())
            .field("pooled", &self.inner.pool.try_borrow().map(|p| p.len()).ok())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if Rc::strong_count(&self.inner) == 1 && !self.inner.disposed.get() {
            let undisposed = self
                .inner
                .pool
                .try_borrow()
                .map(|pool| pool.has_disposables())
                .unwrap_or(false);
            if undisposed {
                warn!("container dropped with undisposed instances; call dispose() before dropping");
            }
        }
    }
}
