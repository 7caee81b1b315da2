//! Typed resolution on top of the type-erased container API.

use std::any::type_name;
use std::sync::Arc;

use crate::descriptors::AnyArc;
use crate::error::{DiError, DiResult};

/// High-level resolver interface with generic methods for type-safe
/// resolution.
///
/// Implementors only provide the two type-erased lookups; the typed methods
/// downcast the shared instance and report a [`DiError::TypeMismatch`] when
/// the registered type differs from the requested one.
///
/// # Examples
///
/// ```
/// use roster_di::{Container, DiError, Resolver};
///
/// let container = Container::new();
/// container.add_value("greeting", "hello".to_string()).unwrap();
///
/// let greeting = container.get::<String>("greeting").unwrap();
/// assert_eq!(*greeting, "hello");
///
/// assert!(matches!(container.get::<u64>("greeting"), Err(DiError::TypeMismatch { .. })));
/// ```
pub trait Resolver {
    /// Resolves a service by name as a type-erased instance.
    fn resolve_any(&self, name: &str) -> DiResult<AnyArc>;

    /// Runs a registered factory by name, returning a type-erased instance.
    fn resolve_factory_any(&self, name: &str) -> DiResult<AnyArc>;

    /// Resolves a service and downcasts it to `T`.
    fn get<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        downcast(name, self.resolve_any(name)?)
    }

    /// Resolves a service, panicking if resolution fails.
    ///
    /// Meant for bootstrap code where a missing registration is a
    /// programming error.
    ///
    /// # Panics
    ///
    /// Panics with the error message if the service cannot be resolved or
    /// has a different type.
    fn get_required<T: Send + Sync + 'static>(&self, name: &str) -> Arc<T> {
        match self.get::<T>(name) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Runs a factory and downcasts its product to `T`.
    fn get_factory<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        downcast(name, self.resolve_factory_any(name)?)
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(service: &str, value: AnyArc) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        service: service.to_string(),
        expected: type_name::<T>(),
    })
}
