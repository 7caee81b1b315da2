//! Error types for the service container.

use thiserror::Error;

/// Service container errors
///
/// Represents the failure conditions of registration, resolution and
/// validation. Every error is fatal to the call that produced it and
/// propagates unchanged through nested dependency resolution.
///
/// # Examples
///
/// ```rust
/// use roster_di::{Container, DiError};
///
/// let container = Container::new();
/// match container.resolve("doesNotExist") {
///     Err(DiError::NotRegistered(name)) => assert_eq!(name, "doesNotExist"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use roster_di::DiError;
///
/// let circular = DiError::Circular(vec!["a".into(), "b".into(), "a".into()]);
/// assert_eq!(circular.to_string(), "Circular dependency: a -> b -> a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// No service descriptor exists under this name
    #[error("Service not registered: {0}")]
    NotRegistered(String),
    /// No factory descriptor exists under this name
    #[error("Factory not registered: {0}")]
    FactoryNotRegistered(String),
    /// Registration refused because the name is taken
    #[error("Service already registered: {0}")]
    AlreadyRegistered(String),
    /// Circular dependency detected (includes path, first and last entries match)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A resolved dependency could not be downcast to the requested type
    #[error("Type mismatch for {service}: expected {expected}")]
    TypeMismatch {
        service: String,
        expected: &'static str,
    },
    /// A constructor asked for a positional argument it did not declare
    #[error("{service} has no dependency at position {index} ({len} declared)")]
    MissingArgument {
        service: String,
        index: usize,
        len: usize,
    },
    /// A transient service or factory tried to register a disposal hook
    #[error("Only singletons can register disposers: {0}")]
    TransientDisposer(String),
    /// A constructor or factory reported a failure
    #[error("Failed to construct {service}: {message}")]
    Construction { service: String, message: String },
    /// Static validation of the registered graph failed
    #[error("Container validation failed: {0}")]
    ValidationFailed(String),
}

impl DiError {
    /// Name of the service this error is about, when there is exactly one.
    pub fn service_name(&self) -> Option<&str> {
        match self {
            DiError::NotRegistered(name)
            | DiError::FactoryNotRegistered(name)
            | DiError::AlreadyRegistered(name)
            | DiError::TransientDisposer(name) => Some(name),
            DiError::TypeMismatch { service, .. }
            | DiError::MissingArgument { service, .. }
            | DiError::Construction { service, .. } => Some(service),
            DiError::Circular(_) | DiError::DepthExceeded(_) | DiError::ValidationFailed(_) => None,
        }
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
