//! Named-instance dictionaries.
//!
//! Every named registration of a service `S` can be collected into a single
//! [`NamedInstances<K, S>`] keyed by the registration names. Keys are text
//! (`String`) or an enumeration whose variants are the registered names.

use std::any::type_name;
use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::descriptors::{GenericDefinition, Instance, Service, ServiceType};
use crate::{DiError, DiResult};

/// Open definition shared by all `NamedInstances<K, S>` descriptors.
pub static NAMED_INSTANCES: GenericDefinition = GenericDefinition::new("bodi::NamedInstances<,>", 2);

/// How a dictionary key is derived from a registered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The name itself.
    Text,
    /// An enumeration variant matched by name, ignoring case.
    Enum,
    /// Anything else; dictionaries with these keys cannot be resolved.
    Other,
}

/// A type usable as the key of a [`NamedInstances`] dictionary.
pub trait NamedKey: Eq + Hash + Send + Sync + Sized + 'static {
    const KIND: KeyKind;

    fn from_registered_name(name: &str) -> Option<Self>;
}

impl NamedKey for String {
    const KIND: KeyKind = KeyKind::Text;

    fn from_registered_name(name: &str) -> Option<Self> {
        Some(name.to_string())
    }
}

/// Matches `name` against enumeration variants, ignoring case.
///
/// ```rust
/// use bodi::{named::parse_variant, KeyKind, NamedKey};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Region { North, South }
///
/// impl NamedKey for Region {
///     const KIND: KeyKind = KeyKind::Enum;
///
///     fn from_registered_name(name: &str) -> Option<Self> {
///         parse_variant(&[("North", Region::North), ("South", Region::South)], name)
///     }
/// }
///
/// assert_eq!(Region::from_registered_name("north"), Some(Region::North));
/// assert_eq!(Region::from_registered_name("east"), None);
/// ```
pub fn parse_variant<E: Copy>(variants: &[(&str, E)], name: &str) -> Option<E> {
    variants
        .iter()
        .find(|(variant, _)| variant.to_lowercase() == name.to_lowercase())
        .map(|(_, value)| *value)
}

/// All named instances of `S`, keyed by `K`.
pub struct NamedInstances<K, S: ?Sized> {
    entries: HashMap<K, Arc<S>>,
}

impl<K: NamedKey, S: Service + ?Sized> NamedInstances<K, S> {
    pub fn get(&self, key: &K) -> Option<&Arc<S>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, Arc<S>> {
        self.entries.keys()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, Arc<S>> {
        self.entries.iter()
    }

    pub(crate) fn assemble(entries: Vec<(String, Instance)>) -> DiResult<Instance> {
        let mut map = HashMap::with_capacity(entries.len());
        for (name, instance) in entries {
            let key = K::from_registered_name(&name).ok_or_else(|| {
                DiError::TypeMismatch(format!("'{name}' is not a valid {}", type_name::<K>()))
            })?;
            let value = S::from_instance(instance).ok_or_else(|| DiError::TypeMismatch(type_name::<S>().to_string()))?;
            map.insert(key, value);
        }
        let dictionary: Instance = Arc::new(Self { entries: map });
        Ok(dictionary)
    }
}

impl<K: NamedKey + fmt::Debug, S: ?Sized> fmt::Debug for NamedInstances<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl<K: NamedKey, S: Service + ?Sized> Service for NamedInstances<K, S> {
    fn service_type() -> ServiceType {
        ServiceType::named_instances::<K, S>()
    }

    fn into_instance(service: Arc<Self>) -> Instance {
        service
    }

    fn from_instance(instance: Instance) -> Option<Arc<Self>> {
        instance.downcast::<Self>().ok()
    }
}
