//! Resolution engine: chain lookup, construction and cycle detection.

use std::rc::Rc;
use std::time::Instant;

use smallvec::SmallVec;
use tracing::trace;

use super::Container;
use crate::component::{Argument, Arguments, Parameter, Selection};
use crate::descriptors::{Instance, ServiceType};
use crate::internal::{Disposer, ResolutionPath};
use crate::key::ServiceKey;
use crate::named::KeyKind;
use crate::registration::{NamedInstanceDictionaryRegistration, Registration, TypeRegistration};
use crate::{DiError, DiResult};

/// A registration together with the container that owns it.
struct OwnedRegistration {
    owner: Container,
    registration: Rc<dyn Registration>,
}

/// Resolves keys on behalf of one container.
///
/// No registry or cache borrow is held while registrations, constructors
/// or factories run, so they may resolve and register re-entrantly.
pub(crate) struct Resolver<'c> {
    container: &'c Container,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self { container }
    }

    pub(crate) fn resolve(&self, key: &ServiceKey, path: &ResolutionPath) -> DiResult<Instance> {
        self.container.assert_not_disposed()?;

        let service = key.service_type();
        if service.is_primitive() {
            return Err(DiError::PrimitiveTypeNotResolvable {
                type_name: service.to_string(),
                path: path.type_names(),
            });
        }

        if let Some(instance) = self.container.cached(key) {
            trace!(key = %key, "resolved from cache");
            return Ok(instance);
        }

        let owned = self.owned_registration(key)?;
        let fresh;
        let path = if owned.owner.ptr_eq(self.container) {
            path
        } else {
            fresh = ResolutionPath::new();
            &fresh
        };

        let observers = self.container.observers();
        if !observers.has_observers() {
            let instance = owned.registration.resolve(&owned.owner, key, path)?;
            return Ok(self.container.cache(key.clone(), instance));
        }
        observers.resolving(key);
        let started = Instant::now();
        let instance = owned.registration.resolve(&owned.owner, key, path)?;
        observers.resolved(key, started.elapsed());

        Ok(self.container.cache(key.clone(), instance))
    }

    /// Resolves every registration of exactly `service` along the chain.
    pub(crate) fn resolve_all(&self, service: &ServiceType) -> DiResult<Vec<Instance>> {
        let mut seen: Vec<ServiceKey> = Vec::new();
        let mut instances = Vec::new();
        for container in self.container.stack() {
            container.assert_not_disposed()?;
            for registration in container.registrations_of(service) {
                let key = registration.key().clone();
                if seen.contains(&key) {
                    continue;
                }
                instances.push(self.resolve(&key, &ResolutionPath::new())?);
                seen.push(key);
            }
        }
        Ok(instances)
    }

    /// Finds the registration for `key`, nearest container first.
    ///
    /// Falls back to dictionary synthesis for named-instance requests and
    /// to an implicit self-registration owned by the requesting container.
    fn owned_registration(&self, key: &ServiceKey) -> DiResult<OwnedRegistration> {
        let stack = self.container.stack();
        for container in &stack {
            container.assert_not_disposed()?;
            if let Some(registration) = container.registration(key) {
                return Ok(OwnedRegistration {
                    owner: container.clone(),
                    registration,
                });
            }
        }

        if !key.is_named() {
            if let Some(shape) = key.service_type().dictionary_shape() {
                match shape.key_kind {
                    KeyKind::Enum => {
                        // Enum-keyed dictionaries are served by the text-keyed registration.
                        let text_key = ServiceKey::unnamed((shape.text_keyed)());
                        let owned = self.owned_registration(&text_key)?;
                        return Ok(owned);
                    }
                    KeyKind::Text => {
                        if let Some(root) = stack.last() {
                            return Ok(OwnedRegistration {
                                owner: root.clone(),
                                registration: Rc::new(NamedInstanceDictionaryRegistration::new(key.clone())),
                            });
                        }
                    }
                    KeyKind::Other => {
                        return Err(DiError::UnsupportedDictionaryKey(shape.key_type.to_string()));
                    }
                }
            }
        }

        Ok(OwnedRegistration {
            owner: self.container.clone(),
            registration: Rc::new(TypeRegistration::new(key.clone(), key.service_type().clone())),
        })
    }

    /// Constructs `implementation` for `key` using its selected constructor.
    pub(crate) fn construct(
        &self,
        implementation: &ServiceType,
        key: &ServiceKey,
        path: &ResolutionPath,
    ) -> DiResult<(Instance, Option<Disposer>)> {
        ensure_acyclic(key, implementation, path)?;

        let activator = implementation.activator().ok_or_else(|| DiError::InterfaceCannotBeResolved {
            key: key.to_string(),
            path: path.type_names(),
        })?;
        let constructor = match activator.selection() {
            Selection::Selected(constructor) => constructor,
            Selection::Ambiguous => {
                return Err(DiError::AmbiguousConstructor {
                    type_name: activator.type_name().to_string(),
                    path: path.type_names(),
                })
            }
            Selection::Missing => {
                return Err(DiError::NoConstructor {
                    type_name: activator.type_name().to_string(),
                    path: path.type_names(),
                })
            }
        };

        let path = path.with_frame(key.clone(), Some(implementation.clone()));
        let arguments = self.resolve_arguments(&constructor.parameters, key, &path)?;
        trace!(key = %key, implementation = %implementation, "constructing");
        let instance = (constructor.build)(&arguments)?;

        self.container.observers().object_created(key, implementation);
        Ok((instance, activator.disposer()))
    }

    /// Invokes a factory for `key` with resolved arguments.
    pub(crate) fn invoke_factory(
        &self,
        parameters: &[Parameter],
        build: &dyn Fn(&Arguments) -> DiResult<Instance>,
        key: &ServiceKey,
        path: &ResolutionPath,
    ) -> DiResult<Instance> {
        ensure_acyclic(key, key.service_type(), path)?;
        let path = path.with_frame(key.clone(), None);
        let arguments = self.resolve_arguments(parameters, key, &path)?;
        trace!(key = %key, "invoking factory");
        build(&arguments)
    }

    /// Collects the named registrations of `service` along the chain and resolves each.
    ///
    /// A child's registration shadows a parent registration with the same name.
    pub(crate) fn resolve_named_instances(
        &self,
        service: &ServiceType,
        path: &ResolutionPath,
    ) -> DiResult<Vec<(String, Instance)>> {
        let mut seen: Vec<ServiceKey> = Vec::new();
        let mut entries = Vec::new();
        for container in self.container.stack() {
            for registration in container.registrations_of(service) {
                let key = registration.key().clone();
                let Some(name) = key.name().map(str::to_string) else {
                    continue;
                };
                if seen.contains(&key) {
                    continue;
                }
                entries.push((name, self.resolve(&key, path)?));
                seen.push(key);
            }
        }
        Ok(entries)
    }

    fn resolve_arguments(
        &self,
        parameters: &[Parameter],
        key: &ServiceKey,
        path: &ResolutionPath,
    ) -> DiResult<Arguments> {
        let mut values = SmallVec::with_capacity(parameters.len());
        for parameter in parameters {
            let value = match parameter {
                Parameter::Service(describe) => {
                    Argument::Service(self.resolve(&ServiceKey::unnamed(describe()), path)?)
                }
                Parameter::RegisteredName => Argument::RegisteredName(key.name().map(str::to_string)),
                Parameter::Container => Argument::Container(self.container.clone()),
            };
            values.push(value);
        }
        Ok(Arguments::new(values))
    }
}

fn ensure_acyclic(key: &ServiceKey, target: &ServiceType, path: &ResolutionPath) -> DiResult<()> {
    if path.contains_key(key) {
        let mut chain = path.type_names();
        chain.push(target.to_string());
        return Err(DiError::CircularDependency {
            service: target.to_string(),
            path: chain,
        });
    }
    Ok(())
}
