//! Constructor tables for concrete components.
//!
//! A component describes itself once through [`Component::describe`]: the
//! constructors it offers, the interfaces it can be viewed as, and whether
//! the container should dispose it. The container picks a constructor,
//! resolves its parameters, and calls it.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::container::Container;
use crate::descriptors::{GenericShape, Instance, Service, ServiceType, TypeIdentity};
use crate::internal::Disposer;
use crate::traits::Dispose;
use crate::{DiError, DiResult};

/// A concrete type the container can construct.
///
/// ```rust
/// use bodi::{Arguments, Component, ComponentBuilder, Constructor, Parameter};
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// bodi::interface!(dyn Clock);
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// impl Component for FixedClock {
///     fn describe(c: &mut ComponentBuilder<Self>) {
///         c.constructor(Constructor::new([], |_| Ok(FixedClock)))
///             .implements::<dyn Clock>(|clock| clock);
///     }
/// }
///
/// struct Scheduler {
///     clock: std::sync::Arc<dyn Clock>,
/// }
///
/// impl Component for Scheduler {
///     fn describe(c: &mut ComponentBuilder<Self>) {
///         c.constructor(Constructor::new([Parameter::service::<dyn Clock>()], |args: &Arguments| {
///             Ok(Scheduler { clock: args.service::<dyn Clock>(0)? })
///         }));
///     }
/// }
/// ```
pub trait Component: Send + Sync + Sized + 'static {
    /// Primitive components are values; requesting one is always an error.
    const PRIMITIVE: bool = false;

    fn describe(component: &mut ComponentBuilder<Self>);

    /// Generic shape of this type when it is a closed form of an open definition.
    fn generic() -> Option<GenericShape> {
        None
    }

    /// Text used when an instance of this type is rendered in diagnostics.
    fn render(&self) -> String {
        type_name::<Self>().to_string()
    }
}

/// Whether a constructor is part of a component's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
}

/// A constructor or factory parameter.
#[derive(Clone, Copy)]
pub enum Parameter {
    /// A dependency resolved from the container (unnamed).
    Service(fn() -> ServiceType),
    /// The name the current object is being resolved under, if any.
    RegisteredName,
    /// The container performing the resolution.
    Container,
}

impl Parameter {
    pub fn service<S: Service + ?Sized>() -> Self {
        Parameter::Service(S::service_type)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Service(describe) => write!(f, "Service({})", describe()),
            Parameter::RegisteredName => f.write_str("RegisteredName"),
            Parameter::Container => f.write_str("Container"),
        }
    }
}

pub(crate) enum Argument {
    Service(Instance),
    RegisteredName(Option<String>),
    Container(Container),
}

/// Resolved arguments handed to a constructor or factory, in parameter order.
pub struct Arguments {
    values: SmallVec<[Argument; 4]>,
}

impl Arguments {
    pub(crate) fn new(values: SmallVec<[Argument; 4]>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The service resolved for the parameter at `index`.
    pub fn service<S: Service + ?Sized>(&self, index: usize) -> DiResult<Arc<S>> {
        match self.values.get(index) {
            Some(Argument::Service(instance)) => {
                S::from_instance(instance.clone()).ok_or_else(|| DiError::TypeMismatch(type_name::<S>().to_string()))
            }
            _ => Err(DiError::TypeMismatch(format!("argument {index} is not {}", type_name::<S>()))),
        }
    }

    /// The registered name for a [`Parameter::RegisteredName`] at `index`.
    pub fn registered_name(&self, index: usize) -> DiResult<Option<&str>> {
        match self.values.get(index) {
            Some(Argument::RegisteredName(name)) => Ok(name.as_deref()),
            _ => Err(DiError::TypeMismatch(format!("argument {index} is not the registered name"))),
        }
    }

    /// The resolving container for a [`Parameter::Container`] at `index`.
    pub fn container(&self, index: usize) -> DiResult<Container> {
        match self.values.get(index) {
            Some(Argument::Container(container)) => Ok(container.clone()),
            _ => Err(DiError::TypeMismatch(format!("argument {index} is not the container"))),
        }
    }
}

type Build<T> = Box<dyn Fn(&Arguments) -> DiResult<T> + Send + Sync>;
type Caster = Box<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// One way of building a `T`.
pub struct Constructor<T> {
    parameters: Vec<Parameter>,
    visibility: Visibility,
    build: Build<T>,
}

impl<T: Send + Sync + 'static> Constructor<T> {
    pub fn new<F>(parameters: impl IntoIterator<Item = Parameter>, build: F) -> Self
    where
        F: Fn(&Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into_iter().collect(),
            visibility: Visibility::Public,
            build: Box::new(build),
        }
    }

    /// Marks this constructor as non-public; it is only considered when no public one exists.
    pub fn non_public(mut self) -> Self {
        self.visibility = Visibility::NonPublic;
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// Collects the constructor table of a component.
pub struct ComponentBuilder<T: Component> {
    constructors: Vec<Constructor<T>>,
    casts: Vec<(TypeIdentity, Caster)>,
    disposer: Option<Disposer>,
}

impl<T: Component> ComponentBuilder<T> {
    fn new() -> Self {
        Self {
            constructors: Vec::new(),
            casts: Vec::new(),
            disposer: None,
        }
    }

    pub fn constructor(&mut self, constructor: Constructor<T>) -> &mut Self {
        self.constructors.push(constructor);
        self
    }

    /// Declares that `T` can be viewed as the service `I`.
    pub fn implements<I: Service + ?Sized>(&mut self, cast: fn(Arc<T>) -> Arc<I>) -> &mut Self {
        let caster = move |instance: Instance| -> Option<Instance> {
            let concrete = instance.downcast::<T>().ok()?;
            Some(I::into_instance(cast(concrete)))
        };
        let caster: Caster = Box::new(caster);
        self.casts.push((I::service_type().identity(), caster));
        self
    }

    /// Asks the owning container to dispose pooled instances of `T`.
    pub fn disposable(&mut self) -> &mut Self
    where
        T: Dispose,
    {
        let disposer: Disposer = Arc::new(|instance: &Instance| {
            if let Some(component) = instance.downcast_ref::<T>() {
                component.dispose();
            }
        });
        self.disposer = Some(disposer);
        self
    }

    pub(crate) fn activator() -> Activator {
        let mut builder = Self::new();
        T::describe(&mut builder);
        builder.finish()
    }

    fn finish(self) -> Activator {
        let selection = select(self.constructors);
        Activator {
            type_name: type_name::<T>(),
            selection,
            casts: self.casts,
            disposer: self.disposer,
        }
    }
}

/// Picks the constructor with the most parameters, public ones first.
fn select<T: Send + Sync + 'static>(constructors: Vec<Constructor<T>>) -> Selection {
    let has_public = constructors.iter().any(|c| c.visibility == Visibility::Public);
    let candidates: Vec<Constructor<T>> = constructors
        .into_iter()
        .filter(|c| !has_public || c.visibility == Visibility::Public)
        .collect();

    let Some(max) = candidates.iter().map(|c| c.parameters.len()).max() else {
        return Selection::Missing;
    };
    let mut widest = candidates.into_iter().filter(|c| c.parameters.len() == max);
    match (widest.next(), widest.next()) {
        (Some(chosen), None) => {
            let build = chosen.build;
            Selection::Selected(ErasedConstructor {
                parameters: chosen.parameters,
                build: Box::new(move |args: &Arguments| build(args).map(|value| Arc::new(value) as Instance)),
            })
        }
        _ => Selection::Ambiguous,
    }
}

pub(crate) struct ErasedConstructor {
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) build: Build<Instance>,
}

pub(crate) enum Selection {
    Selected(ErasedConstructor),
    Ambiguous,
    Missing,
}

/// The type-erased constructor table of one component.
pub(crate) struct Activator {
    type_name: &'static str,
    selection: Selection,
    casts: Vec<(TypeIdentity, Caster)>,
    disposer: Option<Disposer>,
}

impl Activator {
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn selection(&self) -> &Selection {
        &self.selection
    }

    pub(crate) fn implements(&self, service: TypeIdentity) -> bool {
        self.casts.iter().any(|(identity, _)| *identity == service)
    }

    /// Converts a concrete instance into the representation of `service`.
    pub(crate) fn cast(&self, instance: Instance, service: TypeIdentity) -> Option<Instance> {
        let (_, caster) = self.casts.iter().find(|(identity, _)| *identity == service)?;
        caster(instance)
    }

    pub(crate) fn disposer(&self) -> Option<Disposer> {
        self.disposer.clone()
    }
}

/// A factory producing an `S` from resolved arguments.
///
/// Factory results are cached per container under the requested key but are
/// not pooled, so they are never disposed by the container.
pub struct Factory<S: ?Sized> {
    parameters: Vec<Parameter>,
    build: Box<dyn Fn(&Arguments) -> DiResult<Arc<S>>>,
}

impl<S: Service + ?Sized> Factory<S> {
    pub fn new<F>(parameters: impl IntoIterator<Item = Parameter>, build: F) -> Self
    where
        F: Fn(&Arguments) -> DiResult<Arc<S>> + 'static,
    {
        Self {
            parameters: parameters.into_iter().collect(),
            build: Box::new(build),
        }
    }

    /// A parameterless factory.
    pub fn from_fn<F>(build: F) -> Self
    where
        F: Fn() -> Arc<S> + 'static,
    {
        Self::new([], move |_| Ok(build()))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn erase(self) -> (Vec<Parameter>, Box<dyn Fn(&Arguments) -> DiResult<Instance>>) {
        let build = self.build;
        (
            self.parameters,
            Box::new(move |args: &Arguments| build(args).map(S::into_instance)),
        )
    }
}
