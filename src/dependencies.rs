//! Positional constructor arguments.
//!
//! This module contains the `Dependencies` type handed to constructors and
//! factories: the resolved values of their declared dependencies, in
//! declaration order.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::descriptors::AnyArc;
use crate::error::{DiError, DiResult};
use crate::internal::DisposeBag;
use crate::lifetime::Lifetime;
use crate::traits::resolver::downcast;
use crate::traits::Dispose;

/// Resolved dependencies passed to a constructor.
///
/// Position `i` holds the instance resolved for the `i`-th declared
/// dependency name.
///
/// # Examples
///
/// ```
/// use roster_di::{Container, Resolver};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Logger;
/// struct StudentRepository { config: Arc<Config>, logger: Arc<Logger> }
///
/// let container = Container::new();
/// container.add_value("config", Config { url: "postgres://localhost/school".into() }).unwrap();
/// container.add_singleton("logger", &[], |_| Ok(Logger)).unwrap();
/// container.add_singleton("students", &["config", "logger"], |deps| {
///     Ok(StudentRepository {
///         config: deps.get(0)?,
///         logger: deps.named("logger")?,
///     })
/// }).unwrap();
///
/// let repo = container.get::<StudentRepository>("students").unwrap();
/// assert_eq!(repo.config.url, "postgres://localhost/school");
/// ```
pub struct Dependencies<'a> {
    service: &'a str,
    lifetime: Lifetime,
    names: &'a [String],
    values: &'a [AnyArc],
    disposers: &'a Mutex<DisposeBag>,
}

impl<'a> Dependencies<'a> {
    pub(crate) fn new(
        service: &'a str,
        lifetime: Lifetime,
        names: &'a [String],
        values: &'a [AnyArc],
        disposers: &'a Mutex<DisposeBag>,
    ) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { service, lifetime, names, values, disposers }
    }

    /// Name of the service being constructed.
    pub fn service(&self) -> &str {
        self.service
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared name of the dependency at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Type-erased instance at `index`.
    pub fn get_any(&self, index: usize) -> DiResult<&AnyArc> {
        self.values.get(index).ok_or_else(|| DiError::MissingArgument {
            service: self.service.to_string(),
            index,
            len: self.values.len(),
        })
    }

    /// Instance at `index`, downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self.get_any(index)?.clone();
        downcast(&self.names[index], value)
    }

    /// Instance of the first dependency declared as `name`, downcast to `T`.
    pub fn named<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        match self.names.iter().position(|n| n == name) {
            Some(index) => self.get(index),
            None => Err(self.error(format!("no declared dependency named {}", name))),
        }
    }

    /// Iterates `(name, instance)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnyArc)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Builds a construction error attributed to the service being built.
    pub fn error(&self, message: impl Into<String>) -> DiError {
        DiError::Construction {
            service: self.service.to_string(),
            message: message.into(),
        }
    }

    /// Registers `instance` to be disposed by
    /// [`Container::dispose_all`](crate::Container::dispose_all).
    ///
    /// Only singleton constructors may do this. The container keeps every
    /// hook until `dispose_all`, so a hook per transient instance or factory
    /// product would hold each of them alive and grow without bound.
    ///
    /// # Errors
    ///
    /// [`DiError::TransientDisposer`] when the service being built is not a
    /// singleton.
    pub fn register_disposer<T: Dispose>(&self, instance: Arc<T>) -> DiResult<()> {
        if !self.lifetime.is_singleton() {
            return Err(DiError::TransientDisposer(self.service.to_string()));
        }
        self.disposers.lock().push(self.service, Box::new(move || instance.dispose()));
        Ok(())
    }
}
