//! Service type descriptors.
//!
//! Rust has no runtime reflection, so every type the container can map,
//! construct, or close over generic arguments is described by a
//! [`ServiceType`]. Descriptors are cheap to clone and compare by identity.

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::component::{Activator, Component, ComponentBuilder};
use crate::named::{KeyKind, NamedInstances, NamedKey, NAMED_INSTANCES};
use crate::DiResult;

/// Type-erased, shareable service instance.
///
/// Concrete components are stored as `Arc<C>`. Trait-object services are
/// stored as `Arc<Arc<dyn Trait>>` so they can travel through `dyn Any`.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Closes an open generic implementation over concrete type arguments.
pub type GenericCloser = Arc<dyn Fn(&[ServiceType]) -> Option<ServiceType> + Send + Sync>;

/// Identity of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeIdentity {
    /// A real Rust type.
    Type(TypeId),
    /// An open generic definition, identified by its unique name.
    Open(&'static str),
}

/// An open generic definition such as `Repository<>` or `dyn Repo<>`.
///
/// Definitions are declared once as statics and referenced by the closed
/// descriptors built from them:
///
/// ```rust
/// use bodi::GenericDefinition;
///
/// static REPOSITORY: GenericDefinition = GenericDefinition::new("app::Repository<>", 1);
/// assert_eq!(REPOSITORY.arity(), 1);
/// ```
#[derive(Debug)]
pub struct GenericDefinition {
    name: &'static str,
    arity: usize,
}

impl GenericDefinition {
    pub const fn new(name: &'static str, arity: usize) -> Self {
        Self { name, arity }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn identity(&self) -> TypeIdentity {
        TypeIdentity::Open(self.name)
    }
}

/// Coarse classification of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Values and strings; never auto-constructed.
    Primitive,
    /// Traits and other types that need a mapping before they can be built.
    Abstract,
    /// Components with a constructor table.
    Concrete,
    /// An open generic definition, abstract or implementing.
    OpenGeneric,
}

/// Generic shape of a closed descriptor: its definition plus arguments.
#[derive(Clone)]
pub struct GenericShape {
    pub definition: &'static GenericDefinition,
    pub arguments: Vec<ServiceType>,
}

impl GenericShape {
    pub fn new(definition: &'static GenericDefinition, arguments: Vec<ServiceType>) -> Self {
        Self {
            definition,
            arguments,
        }
    }
}

#[derive(Clone)]
struct OpenImplementation {
    closer: Option<GenericCloser>,
    implements: Vec<&'static GenericDefinition>,
}

// Constructor tables are built once per type and shared by all descriptors of it.
static ACTIVATORS: Lazy<RwLock<HashMap<TypeId, Arc<Activator>>>> = Lazy::new(Default::default);

/// Shape of a `NamedInstances<K, S>` descriptor.
#[derive(Clone)]
pub(crate) struct DictionaryShape {
    pub(crate) key_kind: KeyKind,
    pub(crate) key_type: &'static str,
    pub(crate) value_type: ServiceType,
    pub(crate) text_keyed: fn() -> ServiceType,
    pub(crate) assemble: fn(Vec<(String, Instance)>) -> DiResult<Instance>,
}

#[derive(Clone)]
struct TypeInfo {
    identity: TypeIdentity,
    name: Cow<'static, str>,
    kind: TypeKind,
    generic: Option<GenericShape>,
    open: Option<OpenImplementation>,
    activator: Option<fn() -> Activator>,
    named_instances: Option<fn() -> ServiceType>,
    dictionary: Option<DictionaryShape>,
}

impl TypeInfo {
    fn new(identity: TypeIdentity, name: Cow<'static, str>, kind: TypeKind) -> Self {
        Self {
            identity,
            name,
            kind,
            generic: None,
            open: None,
            activator: None,
            named_instances: None,
            dictionary: None,
        }
    }
}

/// Runtime description of a service or implementation type.
///
/// Equality and hashing follow [`TypeIdentity`]; two descriptors of the same
/// Rust type are interchangeable no matter how they were built.
#[derive(Clone)]
pub struct ServiceType {
    info: Arc<TypeInfo>,
}

impl ServiceType {
    /// Describes a component. Its constructor table is built lazily on first use.
    pub fn of<T: Component>() -> Self {
        let kind = if T::PRIMITIVE {
            TypeKind::Primitive
        } else {
            TypeKind::Concrete
        };
        let mut info = TypeInfo::new(
            TypeIdentity::Type(TypeId::of::<T>()),
            Cow::Borrowed(type_name::<T>()),
            kind,
        );
        info.generic = T::generic();
        if !T::PRIMITIVE {
            info.activator = Some(ComponentBuilder::<T>::activator);
            info.named_instances = Some(ServiceType::named_instances::<String, T>);
        }
        Self::from_info(info)
    }

    /// Describes an abstract service, typically a trait object.
    pub fn interface<I: crate::Service + ?Sized>() -> Self {
        let mut info = TypeInfo::new(
            TypeIdentity::Type(TypeId::of::<I>()),
            Cow::Borrowed(type_name::<I>()),
            TypeKind::Abstract,
        );
        info.named_instances = Some(ServiceType::named_instances::<String, I>);
        Self::from_info(info)
    }

    /// Describes a plain value type with no constructor table.
    pub fn value<T: ?Sized + 'static>() -> Self {
        Self::from_info(TypeInfo::new(
            TypeIdentity::Type(TypeId::of::<T>()),
            Cow::Borrowed(type_name::<T>()),
            TypeKind::Primitive,
        ))
    }

    /// Describes an open generic definition.
    ///
    /// On its own this is an abstract open service such as `dyn Repo<>`;
    /// add [`closing_with`](Self::closing_with) to make it an implementation.
    pub fn open(definition: &'static GenericDefinition) -> Self {
        let mut info = TypeInfo::new(
            definition.identity(),
            Cow::Borrowed(definition.name()),
            TypeKind::OpenGeneric,
        );
        info.open = Some(OpenImplementation {
            closer: None,
            implements: Vec::new(),
        });
        Self::from_info(info)
    }

    /// Describes the dictionary of named `S` instances keyed by `K`.
    pub fn named_instances<K: NamedKey, S: crate::Service + ?Sized>() -> Self {
        let mut info = TypeInfo::new(
            TypeIdentity::Type(TypeId::of::<NamedInstances<K, S>>()),
            Cow::Owned(format!(
                "NamedInstances<{}, {}>",
                type_name::<K>(),
                type_name::<S>()
            )),
            TypeKind::Abstract,
        );
        let value_type = S::service_type();
        info.generic = Some(GenericShape::new(
            &NAMED_INSTANCES,
            vec![ServiceType::value::<K>(), value_type.clone()],
        ));
        info.dictionary = Some(DictionaryShape {
            key_kind: K::KIND,
            key_type: type_name::<K>(),
            value_type,
            text_keyed: ServiceType::named_instances::<String, S>,
            assemble: NamedInstances::<K, S>::assemble,
        });
        Self::from_info(info)
    }

    /// Marks this descriptor as a closed form of `definition`.
    pub fn with_generic(self, definition: &'static GenericDefinition, arguments: Vec<ServiceType>) -> Self {
        self.rebuild(|info| info.generic = Some(GenericShape::new(definition, arguments)))
    }

    /// Supplies the closer used to build closed implementations of an open definition.
    pub fn closing_with<F>(self, closer: F) -> Self
    where
        F: Fn(&[ServiceType]) -> Option<ServiceType> + Send + Sync + 'static,
    {
        let closer: GenericCloser = Arc::new(closer);
        self.rebuild(move |info| {
            if let Some(open) = info.open.as_mut() {
                open.closer = Some(closer);
            }
        })
    }

    /// Declares that this open implementation implements another open definition.
    pub fn implementing(self, definition: &'static GenericDefinition) -> Self {
        self.rebuild(|info| {
            if let Some(open) = info.open.as_mut() {
                open.implements.push(definition);
            }
        })
    }

    fn rebuild(self, change: impl FnOnce(&mut TypeInfo)) -> Self {
        let mut info = Arc::try_unwrap(self.info).unwrap_or_else(|shared| (*shared).clone());
        change(&mut info);
        Self::from_info(info)
    }

    fn from_info(info: TypeInfo) -> Self {
        Self {
            info: Arc::new(info),
        }
    }

    pub fn identity(&self) -> TypeIdentity {
        self.info.identity
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn kind(&self) -> TypeKind {
        self.info.kind
    }

    pub fn is_primitive(&self) -> bool {
        self.info.kind == TypeKind::Primitive
    }

    pub fn is_abstract(&self) -> bool {
        self.info.kind == TypeKind::Abstract
    }

    pub fn is_open_generic(&self) -> bool {
        self.info.kind == TypeKind::OpenGeneric
    }

    /// Returns `true` if this descriptor describes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.info.identity == TypeIdentity::Type(TypeId::of::<T>())
    }

    /// The type group: the open definition for closed generics, otherwise the type itself.
    pub fn group(&self) -> TypeIdentity {
        match &self.info.generic {
            Some(shape) => shape.definition.identity(),
            None => self.info.identity,
        }
    }

    pub fn generic_definition(&self) -> Option<&'static GenericDefinition> {
        self.info.generic.as_ref().map(|shape| shape.definition)
    }

    pub fn generic_arguments(&self) -> &[ServiceType] {
        self.info
            .generic
            .as_ref()
            .map(|shape| shape.arguments.as_slice())
            .unwrap_or(&[])
    }

    /// Closes an open implementation over `arguments`.
    ///
    /// Returns `None` for non-generic descriptors, when the argument count
    /// does not match, or when the closer rejects the arguments.
    pub fn close(&self, arguments: &[ServiceType]) -> Option<ServiceType> {
        let closer = self.info.open.as_ref()?.closer.as_ref()?;
        if let TypeIdentity::Open(_) = self.info.identity {
            closer(arguments)
        } else {
            None
        }
    }

    /// Returns `true` if this open implementation implements `definition`.
    pub fn implements_definition(&self, definition: TypeIdentity) -> bool {
        self.info.identity == definition
            || self
                .info
                .open
                .as_ref()
                .map(|open| open.implements.iter().any(|d| d.identity() == definition))
                .unwrap_or(false)
    }

    /// The descriptor of the text-keyed dictionary of named instances of this type.
    pub fn named_instances_type(&self) -> Option<ServiceType> {
        self.info.named_instances.map(|describe| describe())
    }

    pub(crate) fn dictionary_shape(&self) -> Option<&DictionaryShape> {
        self.info.dictionary.as_ref()
    }

    pub(crate) fn activator(&self) -> Option<Arc<Activator>> {
        let build = self.info.activator?;
        let TypeIdentity::Type(id) = self.info.identity else {
            return None;
        };
        if let Some(activator) = ACTIVATORS.read().unwrap_or_else(|e| e.into_inner()).get(&id) {
            return Some(activator.clone());
        }
        // Built without the lock held: describing a component may describe others.
        let built = Arc::new(build());
        let mut activators = ACTIVATORS.write().unwrap_or_else(|e| e.into_inner());
        Some(activators.entry(id).or_insert(built).clone())
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.info.identity == other.info.identity
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.identity.hash(state);
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.name)
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceType")
            .field("name", &self.info.name)
            .field("kind", &self.info.kind)
            .finish()
    }
}

/// A type that can be requested from the container.
///
/// Every [`Component`] is a service. Trait objects become services through
/// the [`interface!`](crate::interface) macro, or by implementing this trait
/// by hand when they are closed forms of a generic definition.
pub trait Service: Send + Sync + 'static {
    fn service_type() -> ServiceType;

    /// Erases a shared handle into the representation stored by the container.
    fn into_instance(service: Arc<Self>) -> Instance;

    /// Recovers a shared handle from its erased representation.
    fn from_instance(instance: Instance) -> Option<Arc<Self>>;
}

impl<T: Component> Service for T {
    fn service_type() -> ServiceType {
        ServiceType::of::<T>()
    }

    fn into_instance(service: Arc<Self>) -> Instance {
        service
    }

    fn from_instance(instance: Instance) -> Option<Arc<Self>> {
        instance.downcast::<T>().ok()
    }
}

/// Erases a trait-object handle. Used by [`interface!`](crate::interface).
pub fn interface_into_instance<I: ?Sized + Send + Sync + 'static>(service: Arc<I>) -> Instance {
    Arc::new(service)
}

/// Recovers a trait-object handle. Used by [`interface!`](crate::interface).
pub fn interface_from_instance<I: ?Sized + Send + Sync + 'static>(instance: Instance) -> Option<Arc<I>> {
    instance.downcast_ref::<Arc<I>>().cloned()
}

/// Declares trait objects as abstract services.
///
/// ```rust
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// bodi::interface!(dyn Clock);
/// ```
#[macro_export]
macro_rules! interface {
    ($($service:ty),+ $(,)?) => {
        $(
            impl $crate::Service for $service {
                fn service_type() -> $crate::ServiceType {
                    $crate::ServiceType::interface::<Self>()
                }

                fn into_instance(service: ::std::sync::Arc<Self>) -> $crate::Instance {
                    $crate::descriptors::interface_into_instance(service)
                }

                fn from_instance(instance: $crate::Instance) -> ::core::option::Option<::std::sync::Arc<Self>> {
                    $crate::descriptors::interface_from_instance(instance)
                }
            }
        )+
    };
}

macro_rules! primitive_components {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Component for $ty {
                const PRIMITIVE: bool = true;

                fn describe(_: &mut ComponentBuilder<Self>) {}
            }
        )+
    };
}

primitive_components!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    &'static str,
);
