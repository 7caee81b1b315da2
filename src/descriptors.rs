//! Service descriptors: how a named service is built, plus read-only
//! introspection records.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::dependencies::Dependencies;
use crate::error::DiResult;
use crate::lifetime::Lifetime;
use crate::traits::Dispose;

/// Type-erased shared instance, as stored in the singleton cache and handed
/// to callers.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Type-erased constructor: receives the resolved dependencies positionally
/// and produces a new instance.
pub type Constructor = Arc<dyn Fn(&Dependencies<'_>) -> DiResult<AnyArc> + Send + Sync>;

/// How a service instance is obtained.
///
/// A pre-built [`Value`](Implementation::Value) is returned verbatim and its
/// declared dependencies are never resolved. A
/// [`Constructor`](Implementation::Constructor) is invoked with its
/// dependencies resolved in declaration order.
///
/// # Examples
///
/// ```rust
/// use roster_di::{Container, Implementation, RegisterOptions, Resolver};
///
/// struct Config { env: &'static str }
/// struct Logger { env: &'static str }
///
/// let container = Container::new();
/// container.register_singleton("config", Implementation::value(Config { env: "test" }), &[]).unwrap();
/// container.register_singleton(
///     "logger",
///     Implementation::constructor(|deps| {
///         let config = deps.get::<Config>(0)?;
///         Ok(Logger { env: config.env })
///     }),
///     &["config"],
/// ).unwrap();
///
/// assert_eq!(container.get::<Logger>("logger").unwrap().env, "test");
/// ```
#[derive(Clone)]
pub enum Implementation {
    /// A pre-built instance returned unchanged
    Value(AnyArc),
    /// A constructor invoked with the resolved dependencies
    Constructor(Constructor),
}

impl Implementation {
    /// Wraps a pre-built value.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Implementation::Value(Arc::new(value))
    }

    /// Wraps an already shared value; resolution hands out this exact `Arc`.
    pub fn shared<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Implementation::Value(value)
    }

    /// Wraps a typed constructor.
    pub fn constructor<T, F>(ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Implementation::Constructor(erase(ctor))
    }

    /// Wraps a typed constructor whose product is registered for disposal.
    /// Reached through
    /// [`Container::add_disposable_singleton`](crate::Container::add_disposable_singleton).
    pub(crate) fn disposable<T, F>(ctor: F) -> Self
    where
        T: Dispose,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Implementation::Constructor(Arc::new(move |deps: &Dependencies<'_>| -> DiResult<AnyArc> {
            let instance = Arc::new(ctor(deps)?);
            deps.register_disposer(instance.clone())?;
            Ok(instance)
        }))
    }

    /// Which variant this is, for introspection.
    pub fn kind(&self) -> ImplementationKind {
        match self {
            Implementation::Value(_) => ImplementationKind::Value,
            Implementation::Constructor(_) => ImplementationKind::Constructor,
        }
    }
}

/// Erases a typed constructor into a [`Constructor`].
pub(crate) fn erase<T, F>(ctor: F) -> Constructor
where
    T: Send + Sync + 'static,
    F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
{
    Arc::new(move |deps: &Dependencies<'_>| -> DiResult<AnyArc> { Ok(Arc::new(ctor(deps)?)) })
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Value(_) => f.write_str("Value(..)"),
            Implementation::Constructor(_) => f.write_str("Constructor(..)"),
        }
    }
}

/// Stored record of how to build a named service.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub implementation: Implementation,
    /// Names resolved and passed positionally, in this order
    pub dependencies: Vec<String>,
    pub lifetime: Lifetime,
}

/// Stored record of a factory: always transient, reachable only through
/// [`Container::resolve_factory`](crate::Container::resolve_factory).
#[derive(Clone)]
pub struct FactoryDescriptor {
    pub name: String,
    pub factory: Constructor,
    pub dependencies: Vec<String>,
}

impl fmt::Debug for FactoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Which table a registration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ServiceKind {
    Service,
    Factory,
}

/// Implementation variant of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ImplementationKind {
    Value,
    Constructor,
}

/// Read-only snapshot of a registration for diagnostics
///
/// # Examples
///
/// ```rust
/// use roster_di::{Container, ImplementationKind, Lifetime, ServiceKind};
///
/// let container = Container::new();
/// container.add_value("config", 42u32).unwrap();
/// container.add_transient("report", &["config"], |deps| Ok(*deps.get::<u32>(0)? * 2)).unwrap();
///
/// let info = container.descriptor("report").unwrap();
/// assert_eq!(info.kind, ServiceKind::Service);
/// assert_eq!(info.implementation, ImplementationKind::Constructor);
/// assert_eq!(info.lifetime, Lifetime::Transient);
/// assert_eq!(info.dependencies, vec!["config".to_string()]);
/// assert!(!info.cached);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub kind: ServiceKind,
    pub implementation: ImplementationKind,
    pub lifetime: Lifetime,
    pub dependencies: Vec<String>,
    /// Whether a singleton instance is currently cached
    pub cached: bool,
}

impl ServiceInfo {
    pub(crate) fn of_service(descriptor: &ServiceDescriptor, cached: bool) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: ServiceKind::Service,
            implementation: descriptor.implementation.kind(),
            lifetime: descriptor.lifetime,
            dependencies: descriptor.dependencies.clone(),
            cached,
        }
    }

    pub(crate) fn of_factory(descriptor: &FactoryDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: ServiceKind::Factory,
            implementation: ImplementationKind::Constructor,
            lifetime: Lifetime::Transient,
            dependencies: descriptor.dependencies.clone(),
            cached: false,
        }
    }

    /// Check if this is a factory registration
    pub fn is_factory(&self) -> bool {
        self.kind == ServiceKind::Factory
    }
}
