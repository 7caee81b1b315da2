//! Registration options and the descriptor store.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptors::{FactoryDescriptor, ServiceDescriptor};
use crate::lifetime::Lifetime;

/// Options accepted by [`Container::register`](crate::Container::register).
///
/// Defaults to a transient service with no dependencies.
///
/// # Examples
///
/// ```
/// use roster_di::{Lifetime, RegisterOptions};
///
/// let options = RegisterOptions::new()
///     .singleton(true)
///     .depends_on(["config", "logger"]);
///
/// assert_eq!(options.lifetime(), Lifetime::Singleton);
/// assert_eq!(options.dependencies(), ["config", "logger"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    lifetime: Lifetime,
    dependencies: Vec<String>,
    factory: bool,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `RegisterOptions::new().singleton(true)`.
    pub fn singleton_service() -> Self {
        Self::new().singleton(true)
    }

    /// Cache the first constructed instance for the container's lifetime.
    pub fn singleton(mut self, singleton: bool) -> Self {
        self.lifetime = Lifetime::from(singleton);
        self
    }

    /// Sets the lifetime directly, for callers that already hold a [`Lifetime`].
    pub fn lifetime_of(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Names to resolve and pass positionally, in this order.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }

    /// Accepted for compatibility and otherwise ignored; factories are
    /// registered through
    /// [`Container::register_factory`](crate::Container::register_factory).
    pub fn factory(mut self, factory: bool) -> Self {
        self.factory = factory;
        self
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_factory(&self) -> bool {
        self.factory
    }

    pub(crate) fn into_parts(self) -> (Lifetime, Vec<String>) {
        (self.lifetime, self.dependencies)
    }
}

/// Converts a borrowed name list into owned dependency names.
pub(crate) fn owned_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Service and factory descriptors, keyed by name.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) services: HashMap<String, Arc<ServiceDescriptor>>,
    pub(crate) factories: HashMap<String, Arc<FactoryDescriptor>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a service, returning the descriptor it replaced.
    pub(crate) fn insert_service(&mut self, descriptor: ServiceDescriptor) -> Option<Arc<ServiceDescriptor>> {
        self.services.insert(descriptor.name.clone(), Arc::new(descriptor))
    }

    /// Inserts a factory, returning the descriptor it replaced.
    pub(crate) fn insert_factory(&mut self, descriptor: FactoryDescriptor) -> Option<Arc<FactoryDescriptor>> {
        self.factories.insert(descriptor.name.clone(), Arc::new(descriptor))
    }

    #[inline]
    pub(crate) fn service(&self, name: &str) -> Option<Arc<ServiceDescriptor>> {
        self.services.get(name).cloned()
    }

    #[inline]
    pub(crate) fn factory(&self, name: &str) -> Option<Arc<FactoryDescriptor>> {
        self.factories.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name) || self.factories.contains_key(name)
    }

    pub(crate) fn service_names(&self) -> Vec<String> {
        sorted(self.services.keys())
    }

    pub(crate) fn factory_names(&self) -> Vec<String> {
        sorted(self.factories.keys())
    }

    pub(crate) fn clear(&mut self) {
        self.services.clear();
        self.factories.clear();
    }
}

fn sorted<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut names: Vec<String> = names.cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{erase, Implementation};

    fn service(name: &str, value: u32) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            implementation: Implementation::value(value),
            dependencies: Vec::new(),
            lifetime: Lifetime::Singleton,
        }
    }

    #[test]
    fn last_insert_wins() {
        let mut registry = Registry::new();
        assert!(registry.insert_service(service("config", 1)).is_none());
        let previous = registry.insert_service(service("config", 2));
        assert!(previous.is_some());
        assert_eq!(registry.service_names(), vec!["config".to_string()]);
    }

    #[test]
    fn names_are_sorted_and_tables_separate() {
        let mut registry = Registry::new();
        registry.insert_service(service("logger", 1));
        registry.insert_service(service("config", 1));
        registry.insert_factory(FactoryDescriptor {
            name: "mailer".to_string(),
            factory: erase(|_| Ok(())),
            dependencies: Vec::new(),
        });

        assert_eq!(registry.service_names(), vec!["config".to_string(), "logger".to_string()]);
        assert_eq!(registry.factory_names(), vec!["mailer".to_string()]);
        assert!(registry.contains("mailer"));
        assert!(registry.service("mailer").is_none());

        registry.clear();
        assert!(!registry.contains("config"));
        assert!(!registry.contains("mailer"));
    }

    #[test]
    fn options_defaults() {
        let options = RegisterOptions::new().factory(true);
        assert_eq!(options.lifetime(), Lifetime::Transient);
        assert!(options.dependencies().is_empty());
        assert!(options.is_factory());
        assert_eq!(RegisterOptions::singleton_service().lifetime(), Lifetime::Singleton);
    }

    #[test]
    fn lifetime_of_overrides_flag() {
        let options = RegisterOptions::singleton_service().lifetime_of(Lifetime::Transient);
        assert_eq!(options.lifetime(), Lifetime::Transient);

        let options = RegisterOptions::new().singleton(false).lifetime_of(Lifetime::Singleton);
        assert_eq!(options, RegisterOptions::singleton_service());
    }
}
