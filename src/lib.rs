//! # bodi
//!
//! Hierarchical, auto-wiring dependency injection for Rust.
//!
//! ## Features
//!
//! - **Auto-wiring**: components declare their constructors once and the container
//!   resolves their parameters recursively
//! - **At-most-once resolution**: a key resolved from a container always yields the same object
//! - **Shared pooling**: every interface mapped to one implementation shares one instance
//! - **Container hierarchy**: child containers override parent registrations and share
//!   the parent's objects
//! - **Named instances**: named registrations, collectable into a [`NamedInstances`] dictionary
//! - **Open generics**: one open registration serves every closed request
//! - **Cycle detection**: circular dependencies fail with the full resolution path
//! - **Scoped disposal**: a container disposes the objects it constructed, exactly once
//!
//! ## Quick Start
//!
//! ```rust
//! use bodi::{Arguments, Component, ComponentBuilder, Constructor, Container, Parameter};
//! use std::sync::Arc;
//!
//! pub trait Store: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//! bodi::interface!(dyn Store);
//!
//! struct Postgres;
//! impl Store for Postgres {
//!     fn url(&self) -> &str { "postgres://localhost" }
//! }
//! impl Component for Postgres {
//!     fn describe(c: &mut ComponentBuilder<Self>) {
//!         c.constructor(Constructor::new([], |_| Ok(Postgres)))
//!             .implements::<dyn Store>(|store| store);
//!     }
//! }
//!
//! struct UserService {
//!     store: Arc<dyn Store>,
//! }
//! impl Component for UserService {
//!     fn describe(c: &mut ComponentBuilder<Self>) {
//!         c.constructor(Constructor::new([Parameter::service::<dyn Store>()], |args: &Arguments| {
//!             Ok(UserService { store: args.service::<dyn Store>(0)? })
//!         }));
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_type_as::<Postgres, dyn Store>(None).unwrap();
//!
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.store.url(), "postgres://localhost");
//! ```
//!
//! ## Container hierarchy
//!
//! ```rust
//! use bodi::{Component, ComponentBuilder, Constructor, Container};
//! use std::sync::Arc;
//!
//! struct Settings;
//! impl Component for Settings {
//!     fn describe(c: &mut ComponentBuilder<Self>) {
//!         c.constructor(Constructor::new([], |_| Ok(Settings)));
//!     }
//! }
//!
//! let root = Container::new();
//! let shared = root.resolve::<Settings>().unwrap();
//!
//! let child = root.create_child();
//! child.register_instance(Arc::new(Settings)).unwrap();
//! assert!(!Arc::ptr_eq(&shared, &child.resolve::<Settings>().unwrap()));
//! ```
//!
//! ## Feature flags
//!
//! - `config`: JSON and YAML registration sections (`serde`, `serde_json`, `serde_yaml`)
//! - `ahash`: faster hashing for key maps
//! - `performance`: enables `ahash`

pub mod component;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod named;
pub mod observer;
pub mod traits;

mod container;
mod internal;
mod registration;

pub use component::{Arguments, Component, ComponentBuilder, Constructor, Factory, Parameter, Visibility};
pub use config::{
    RegistrationEntry, RegistrationProvider, RegistrationSection, SectionRegistrationProvider, TypeCatalog,
    TypeMapping,
};
pub use container::Container;
pub use descriptors::{
    GenericCloser, GenericDefinition, GenericShape, Instance, Service, ServiceType, TypeIdentity, TypeKind,
};
pub use error::{DiError, DiResult};
pub use internal::ResolutionPath;
pub use key::{KeyMap, ServiceKey};
pub use named::{KeyKind, NamedInstances, NamedKey, NAMED_INSTANCES};
pub use observer::{ContainerObserver, LoggingObserver};
pub use traits::Dispose;
