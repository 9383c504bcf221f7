use std::fmt;

use super::Registration;
use crate::component::{Arguments, Parameter};
use crate::container::{Container, Resolver};
use crate::descriptors::Instance;
use crate::internal::ResolutionPath;
use crate::key::ServiceKey;
use crate::DiResult;

pub(crate) type ErasedFactory = Box<dyn Fn(&Arguments) -> DiResult<Instance>>;

/// Invokes a user-supplied factory with resolved arguments.
pub(crate) struct FactoryRegistration {
    key: ServiceKey,
    parameters: Vec<Parameter>,
    build: ErasedFactory,
}

impl FactoryRegistration {
    pub(crate) fn new(key: ServiceKey, parameters: Vec<Parameter>, build: ErasedFactory) -> Self {
        Self {
            key,
            parameters,
            build,
        }
    }
}

impl Registration for FactoryRegistration {
    fn key(&self) -> &ServiceKey {
        &self.key
    }

    fn resolve(&self, container: &Container, key_to_resolve: &ServiceKey, path: &ResolutionPath) -> DiResult<Instance> {
        Resolver::new(container).invoke_factory(&self.parameters, self.build.as_ref(), key_to_resolve, path)
    }
}

impl fmt::Display for FactoryRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factory: {} ({} parameters)", self.key.service_type(), self.parameters.len())
    }
}
