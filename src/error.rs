//! Error types for the dependency injection container.

use thiserror::Error;

/// Dependency injection errors
///
/// Every failure raised while registering into, resolving from, or
/// disposing a [`Container`](crate::Container) is reported through this
/// type. Variants raised mid-resolution carry the resolution path that was
/// active when the failure happened; their `Display` output ends with
/// `(resolution path: A->B)` whenever that path is non-empty.
///
/// # Examples
///
/// ```rust
/// use bodi::DiError;
///
/// let err = DiError::InterfaceCannotBeResolved {
///     key: "dyn app::Clock".to_string(),
///     path: vec!["app::Scheduler".to_string()],
/// };
/// assert_eq!(
///     err.to_string(),
///     "Interface cannot be resolved: dyn app::Clock (resolution path: app::Scheduler)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// A type is being constructed while it is already under construction.
    ///
    /// `path` lists the constructed types from the outermost request up to
    /// the repeated type, which appears last.
    #[error("Circular dependency found! {service}{}", render_path(.path))]
    CircularDependency { service: String, path: Vec<String> },

    /// More than one constructor shares the maximal parameter count.
    #[error(
        "Multiple public constructors with same maximum parameter count are not supported! {type_name}{}",
        render_path(.path)
    )]
    AmbiguousConstructor { type_name: String, path: Vec<String> },

    /// A concrete component declared no constructor at all.
    #[error("Class must have a constructor! {type_name}{}", render_path(.path))]
    NoConstructor { type_name: String, path: Vec<String> },

    /// The requested service is abstract and nothing maps it to an implementation.
    #[error("Interface cannot be resolved: {key}{}", render_path(.path))]
    InterfaceCannotBeResolved { key: String, path: Vec<String> },

    /// Primitive values and strings are never auto-constructed.
    #[error("Primitive types or structs cannot be resolved: {type_name}{}", render_path(.path))]
    PrimitiveTypeNotResolvable { type_name: String, path: Vec<String> },

    /// A registration was attempted for a key whose object has already been handed out.
    #[error("An object has been resolved for this interface already. {0}")]
    AlreadyResolved(String),

    /// The implementation does not satisfy the service it is registered as.
    #[error("type mapping is not valid: {implementation} is not assignable to {service}")]
    InvalidTypeMapping { implementation: String, service: String },

    /// The container (or one of its ancestors) has been disposed.
    #[error("Object container disposed")]
    ContainerDisposed,

    /// A resolved instance could not be viewed as the requested representation.
    #[error("Type mismatch for: {0}")]
    TypeMismatch(String),

    /// Named-instance dictionaries must be keyed by text or a registered-name enum.
    #[error("Named instance dictionaries only support text or enum keys: {0}")]
    UnsupportedDictionaryKey(String),

    /// A configured registration named a type the catalog does not know.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A registration source could not be read or parsed.
    #[error("Invalid registration configuration: {0}")]
    Configuration(String),
}

impl DiError {
    /// Returns the resolution path captured with this error, if any.
    pub fn resolution_path(&self) -> &[String] {
        match self {
            DiError::CircularDependency { path, .. }
            | DiError::AmbiguousConstructor { path, .. }
            | DiError::NoConstructor { path, .. }
            | DiError::InterfaceCannotBeResolved { path, .. }
            | DiError::PrimitiveTypeNotResolvable { path, .. } => path,
            _ => &[],
        }
    }
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" (resolution path: {})", path.join("->"))
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
