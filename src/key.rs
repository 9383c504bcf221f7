//! Service key types for the dependency injection container.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::descriptors::{Service, ServiceType};

/// Hash map keyed by [`ServiceKey`].
#[cfg(feature = "ahash")]
pub type KeyMap<V> = HashMap<ServiceKey, V, ahash::RandomState>;

/// Hash map keyed by [`ServiceKey`].
#[cfg(not(feature = "ahash"))]
pub type KeyMap<V> = HashMap<ServiceKey, V>;

/// Key for registration storage and lookup: a service type plus an optional name.
///
/// Names compare case-insensitively. Types compare exactly, except that an
/// open generic definition equals every closed form built from it; this is
/// what lets a single open registration serve all closed requests.
///
/// # Examples
///
/// ```rust
/// use bodi::{Component, ComponentBuilder, ServiceKey};
///
/// struct Mailer;
/// impl Component for Mailer {
///     fn describe(_: &mut ComponentBuilder<Self>) {}
/// }
///
/// assert_eq!(ServiceKey::named::<Mailer>("Smtp"), ServiceKey::named::<Mailer>("SMTP"));
/// assert_ne!(ServiceKey::named::<Mailer>("smtp"), ServiceKey::of::<Mailer>());
/// assert_eq!(ServiceKey::named::<Mailer>("smtp").to_string(), format!("{}('smtp')", std::any::type_name::<Mailer>()));
/// ```
#[derive(Clone)]
pub struct ServiceKey {
    service_type: ServiceType,
    name: Option<String>,
}

impl ServiceKey {
    pub fn new(service_type: ServiceType, name: Option<&str>) -> Self {
        Self {
            service_type,
            name: name.map(str::to_string),
        }
    }

    pub fn unnamed(service_type: ServiceType) -> Self {
        Self::new(service_type, None)
    }

    pub fn of<S: Service + ?Sized>() -> Self {
        Self::unnamed(S::service_type())
    }

    pub fn named<S: Service + ?Sized>(name: &str) -> Self {
        Self::new(S::service_type(), Some(name))
    }

    pub fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Returns a key for the same name with a different type.
    pub fn with_type(&self, service_type: ServiceType) -> Self {
        Self {
            service_type,
            name: self.name.clone(),
        }
    }
}

fn names_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        if !names_match(self.name(), other.name()) {
            return false;
        }
        self.service_type == other.service_type
            || other.service_type.group() == self.service_type.identity()
            || other.service_type.identity() == self.service_type.group()
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.service_type.group().hash(state);
        self.name.as_ref().map(|name| name.to_lowercase()).hash(state);
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}('{}')", self.service_type, name),
            None => write!(f, "{}", self.service_type),
        }
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({self})")
    }
}
