use std::fmt;

use super::Registration;
use crate::container::{Container, Resolver};
use crate::descriptors::Instance;
use crate::internal::ResolutionPath;
use crate::key::ServiceKey;
use crate::named::KeyKind;
use crate::{DiError, DiResult};

/// Builds the dictionary of all named instances of a service.
pub(crate) struct NamedInstanceDictionaryRegistration {
    key: ServiceKey,
}

impl NamedInstanceDictionaryRegistration {
    pub(crate) fn new(key: ServiceKey) -> Self {
        Self { key }
    }
}

impl Registration for NamedInstanceDictionaryRegistration {
    fn key(&self) -> &ServiceKey {
        &self.key
    }

    fn resolve(&self, container: &Container, key_to_resolve: &ServiceKey, path: &ResolutionPath) -> DiResult<Instance> {
        let requested = key_to_resolve.service_type();
        let shape = requested
            .dictionary_shape()
            .ok_or_else(|| DiError::TypeMismatch(requested.to_string()))?;
        if shape.key_kind == KeyKind::Other {
            return Err(DiError::UnsupportedDictionaryKey(shape.key_type.to_string()));
        }

        let entries = Resolver::new(container).resolve_named_instances(&shape.value_type, path)?;
        (shape.assemble)(entries)
    }

    fn is_synthesized(&self) -> bool {
        true
    }
}

impl fmt::Display for NamedInstanceDictionaryRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Named instances: {}", self.key.service_type())
    }
}
