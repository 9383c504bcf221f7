//! Registrations and the per-container registry.
//!
//! A registration knows how to produce the object for its key. Four kinds
//! exist: type mappings, pre-built instances, factories, and the
//! named-instance dictionaries that are synthesized alongside named
//! registrations.

mod factory;
mod instance;
mod named_instances;
mod registry;
mod type_registration;

use std::fmt;

use crate::container::Container;
use crate::descriptors::Instance;
use crate::internal::ResolutionPath;
use crate::key::ServiceKey;
use crate::DiResult;

pub(crate) use factory::FactoryRegistration;
pub(crate) use instance::InstanceRegistration;
pub(crate) use named_instances::NamedInstanceDictionaryRegistration;
pub(crate) use registry::Registry;
pub(crate) use type_registration::TypeRegistration;

/// A recipe for producing the object registered under a key.
///
/// `resolve` runs in the context of the container that owns the
/// registration. `key_to_resolve` is the key that was actually requested,
/// which differs from [`key`](Registration::key) for open generic
/// registrations and redirected dictionary requests.
pub(crate) trait Registration: fmt::Display {
    fn key(&self) -> &ServiceKey;

    fn resolve(&self, container: &Container, key_to_resolve: &ServiceKey, path: &ResolutionPath) -> DiResult<Instance>;

    /// Registrations synthesized by the container are left out of its textual dump.
    fn is_synthesized(&self) -> bool {
        false
    }
}
