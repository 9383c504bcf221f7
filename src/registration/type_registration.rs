use std::fmt;

use super::Registration;
use crate::container::{Container, Resolver};
use crate::descriptors::{Instance, ServiceType};
use crate::internal::ResolutionPath;
use crate::key::ServiceKey;
use crate::{DiError, DiResult};

/// Maps a key to an implementation type that the container constructs.
///
/// Constructed objects go to the owning container's pool under the
/// implementation type and registered name, so every key mapped to the same
/// implementation shares one object.
pub(crate) struct TypeRegistration {
    key: ServiceKey,
    implementation: ServiceType,
}

impl TypeRegistration {
    pub(crate) fn new(key: ServiceKey, implementation: ServiceType) -> Self {
        Self { key, implementation }
    }

    fn type_to_construct(&self, key_to_resolve: &ServiceKey) -> Option<ServiceType> {
        if self.implementation.is_open_generic() {
            self.implementation
                .close(key_to_resolve.service_type().generic_arguments())
        } else {
            Some(self.implementation.clone())
        }
    }
}

impl Registration for TypeRegistration {
    fn key(&self) -> &ServiceKey {
        &self.key
    }

    fn resolve(&self, container: &Container, key_to_resolve: &ServiceKey, path: &ResolutionPath) -> DiResult<Instance> {
        let cannot_resolve = || DiError::InterfaceCannotBeResolved {
            key: key_to_resolve.to_string(),
            path: path.type_names(),
        };
        let implementation = self.type_to_construct(key_to_resolve).ok_or_else(cannot_resolve)?;
        let pool_key = key_to_resolve.with_type(implementation.clone());

        let instance = match container.pooled(&pool_key) {
            Some(instance) => instance,
            None => {
                if implementation.is_abstract() || implementation.is_open_generic() {
                    return Err(cannot_resolve());
                }
                let (instance, disposer) =
                    Resolver::new(container).construct(&implementation, key_to_resolve, path)?;
                container.pool(pool_key, instance, disposer)
            }
        };

        let requested = key_to_resolve.service_type();
        if *requested == implementation {
            return Ok(instance);
        }
        implementation
            .activator()
            .and_then(|activator| activator.cast(instance, requested.identity()))
            .ok_or_else(|| DiError::TypeMismatch(format!("{implementation} as {requested}")))
    }
}

impl fmt::Display for TypeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type: {}", self.implementation)
    }
}
