//! The service container.
//!
//! Registration stores descriptors by name; resolution walks the declared
//! dependency graph depth-first, constructs what is missing and caches
//! singletons.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::cache::{SingletonCache, Slot};
use crate::config::{ContainerConfig, DuplicatePolicy};
use crate::dependencies::Dependencies;
use crate::descriptors::{erase, AnyArc, FactoryDescriptor, Implementation, ServiceDescriptor, ServiceInfo};
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{owned_names, RegisterOptions, Registry};
use crate::traits::{Dispose, Resolver};

/// Named-service container with constructor injection and singleton caching.
///
/// Registration may happen in any order; dependency names are only checked
/// when something is resolved (or when [`validate`](Container::validate) is
/// called). Resolution resolves every declared dependency first, in
/// declaration order, and passes the results positionally to the
/// constructor.
///
/// # Thread Safety
///
/// All operations take `&self` and the container is `Send + Sync`, so it can
/// be shared behind an `Arc`. The first resolution of a singleton runs its
/// constructor at most once even when several threads race on it.
///
/// Constructors must not resolve from the container themselves; declare
/// what they need as dependencies instead.
///
/// # Examples
///
/// ```
/// use roster_di::{Container, Resolver};
/// use std::sync::Arc;
///
/// struct Config { env: &'static str }
/// struct Logger { config: Arc<Config> }
/// struct StudentService { logger: Arc<Logger> }
///
/// let container = Container::new();
/// container
///     .add_value("config", Config { env: "test" }).unwrap()
///     .add_singleton("logger", &["config"], |deps| Ok(Logger { config: deps.get(0)? })).unwrap()
///     .add_singleton("service", &["logger"], |deps| Ok(StudentService { logger: deps.get(0)? })).unwrap();
///
/// let first = container.get::<StudentService>("service").unwrap();
/// let second = container.get::<StudentService>("service").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
///
/// let logger = container.get::<Logger>("logger").unwrap();
/// assert!(Arc::ptr_eq(&first.logger, &logger));
/// assert_eq!(logger.config.env, "test");
/// ```
pub struct Container {
    registry: RwLock<Registry>,
    singletons: SingletonCache,
    disposers: Mutex<DisposeBag>,
    observers: RwLock<Observers>,
    config: ContainerConfig,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with default settings.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            singletons: SingletonCache::new(),
            disposers: Mutex::new(DisposeBag::default()),
            observers: RwLock::new(Observers::default()),
            config,
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Adds an observer notified of every later resolution.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) -> &Self {
        self.observers.write().add(observer);
        self
    }

    // ----- Registration -----

    /// Stores a service descriptor under `name`.
    ///
    /// With the default [`DuplicatePolicy::Replace`] an existing registration
    /// is overwritten (and its cached singleton dropped) and this never
    /// fails. With [`DuplicatePolicy::Reject`] a taken name fails with
    /// [`DiError::AlreadyRegistered`].
    ///
    /// Dependency names are not checked here.
    pub fn register(
        &self,
        name: impl Into<String>,
        implementation: Implementation,
        options: RegisterOptions,
    ) -> DiResult<()> {
        let (lifetime, dependencies) = options.into_parts();
        self.insert_service(
            ServiceDescriptor { name: name.into(), implementation, dependencies, lifetime },
            self.config.duplicates,
        )
    }

    /// Like [`register`](Self::register) with the singleton flag forced on.
    pub fn register_singleton(
        &self,
        name: impl Into<String>,
        implementation: Implementation,
        dependencies: &[&str],
    ) -> DiResult<()> {
        self.register(
            name,
            implementation,
            RegisterOptions::singleton_service().depends_on(dependencies.iter().copied()),
        )
    }

    /// Stores a factory in the separate factory table.
    ///
    /// Factories are only reachable through
    /// [`resolve_factory`](Self::resolve_factory), never through `resolve`
    /// or another service's dependencies, and are never cached.
    pub fn register_factory<T, F>(&self, name: impl Into<String>, factory: F, dependencies: &[&str]) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let descriptor = FactoryDescriptor {
            name: name.into(),
            factory: erase(factory),
            dependencies: owned_names(dependencies),
        };

        let mut registry = self.registry.write();
        if self.config.duplicates == DuplicatePolicy::Reject && registry.factories.contains_key(&descriptor.name) {
            return Err(DiError::AlreadyRegistered(descriptor.name));
        }
        registry.insert_factory(descriptor);
        Ok(())
    }

    /// Overwrites (or creates) a service registration regardless of the
    /// duplicate policy. Intended for test-time overrides.
    pub fn replace_service(&self, name: impl Into<String>, implementation: Implementation, options: RegisterOptions) {
        let (lifetime, dependencies) = options.into_parts();
        let descriptor = ServiceDescriptor { name: name.into(), implementation, dependencies, lifetime };
        // Replace policy cannot fail
        let _ = self.insert_service(descriptor, DuplicatePolicy::Replace);
    }

    /// Registers only if `name` is not yet a service. Returns whether the
    /// registration happened.
    pub fn try_register(&self, name: impl Into<String>, implementation: Implementation, options: RegisterOptions) -> bool {
        let (lifetime, dependencies) = options.into_parts();
        let descriptor = ServiceDescriptor { name: name.into(), implementation, dependencies, lifetime };
        self.insert_service(descriptor, DuplicatePolicy::Reject).is_ok()
    }

    fn insert_service(&self, descriptor: ServiceDescriptor, policy: DuplicatePolicy) -> DiResult<()> {
        let mut registry = self.registry.write();
        if policy == DuplicatePolicy::Reject && registry.services.contains_key(&descriptor.name) {
            return Err(DiError::AlreadyRegistered(descriptor.name));
        }
        self.singletons.evict(&descriptor.name);
        registry.insert_service(descriptor);
        Ok(())
    }

    // ----- Typed conveniences -----

    /// Registers a pre-built singleton value.
    pub fn add_value<T: Send + Sync + 'static>(&self, name: impl Into<String>, value: T) -> DiResult<&Self> {
        self.register(name, Implementation::value(value), RegisterOptions::singleton_service())?;
        Ok(self)
    }

    /// Registers a singleton built by `ctor` on first resolution.
    pub fn add_singleton<T, F>(&self, name: impl Into<String>, dependencies: &[&str], ctor: F) -> DiResult<&Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_singleton(name, Implementation::constructor(ctor), dependencies)?;
        Ok(self)
    }

    /// Registers a transient service built by `ctor` on every resolution.
    pub fn add_transient<T, F>(&self, name: impl Into<String>, dependencies: &[&str], ctor: F) -> DiResult<&Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(
            name,
            Implementation::constructor(ctor),
            RegisterOptions::new().depends_on(dependencies.iter().copied()),
        )?;
        Ok(self)
    }

    /// Registers a singleton whose instance is disposed by
    /// [`dispose_all`](Self::dispose_all).
    pub fn add_disposable_singleton<T, F>(&self, name: impl Into<String>, dependencies: &[&str], ctor: F) -> DiResult<&Self>
    where
        T: Dispose,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_singleton(name, Implementation::disposable(ctor), dependencies)?;
        Ok(self)
    }

    /// Closure-last form of [`register_factory`](Self::register_factory).
    pub fn add_factory<T, F>(&self, name: impl Into<String>, dependencies: &[&str], factory: F) -> DiResult<&Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_factory(name, factory, dependencies)?;
        Ok(self)
    }

    // ----- Resolution -----

    /// Resolves a service by name.
    ///
    /// A cached singleton is returned as is. Otherwise every declared
    /// dependency is resolved, in order, and the constructor runs with the
    /// results; singleton results are cached before being returned.
    ///
    /// # Errors
    ///
    /// - [`DiError::NotRegistered`] if `name` or any transitive dependency
    ///   has no descriptor
    /// - [`DiError::Circular`] if a name depends on itself, directly or not
    /// - [`DiError::DepthExceeded`] past the configured `max_depth`
    /// - whatever a constructor on the way returns
    pub fn resolve(&self, name: &str) -> DiResult<AnyArc> {
        let observers = self.observers.read().clone();
        let mut path = ResolutionPath::new(self.config.max_depth);
        self.resolve_in(name, &mut path, &observers)
    }

    /// Runs a registered factory with freshly resolved dependencies. The
    /// result is never cached.
    pub fn resolve_factory(&self, name: &str) -> DiResult<AnyArc> {
        let observers = self.observers.read().clone();
        let descriptor = self.registry.read().factory(name);
        let descriptor = match descriptor {
            Some(descriptor) => descriptor,
            None => {
                let err = DiError::FactoryNotRegistered(name.to_string());
                observers.failed(name, &err);
                return Err(err);
            }
        };

        // Factories live in their own namespace and cannot take part in a
        // cycle, so the factory name itself stays off the path.
        let mut path = ResolutionPath::new(self.config.max_depth);
        self.observe(name, Lifetime::Transient, &observers, || {
            let args = self.resolve_all(&descriptor.dependencies, &mut path, &observers)?;
            let deps = Dependencies::new(
                &descriptor.name,
                Lifetime::Transient,
                &descriptor.dependencies,
                &args,
                &self.disposers,
            );
            (descriptor.factory)(&deps)
        })
    }

    fn resolve_in(&self, name: &str, path: &mut ResolutionPath, observers: &Observers) -> DiResult<AnyArc> {
        if let Some(instance) = self.singletons.get(name) {
            observers.cache_hit(name);
            return Ok(instance);
        }

        let descriptor = self.registry.read().service(name);
        let descriptor = match descriptor {
            Some(descriptor) => descriptor,
            None => {
                let err = DiError::NotRegistered(name.to_string());
                observers.failed(name, &err);
                return Err(err);
            }
        };

        // Cycles and depth overruns are raised before `observe` runs, so the
        // name that detected them is reported here.
        let mut entered = false;
        let result = path.within(name, |path| {
            entered = true;
            self.observe(name, descriptor.lifetime, observers, || self.construct(&descriptor, path, observers))
        });
        if let (false, Err(err)) = (entered, &result) {
            observers.failed(name, err);
        }
        result
    }

    fn construct(
        &self,
        descriptor: &Arc<ServiceDescriptor>,
        path: &mut ResolutionPath,
        observers: &Observers,
    ) -> DiResult<AnyArc> {
        match &descriptor.implementation {
            // Pre-built values ignore their declared dependencies
            Implementation::Value(value) => match self.claim_slot(descriptor) {
                Some(slot) => Ok(slot.get_or_init(|| value.clone()).clone()),
                None => Ok(value.clone()),
            },
            Implementation::Constructor(ctor) => {
                // Dependencies are resolved outside the singleton slot so a
                // cycle is reported by the path instead of blocking on it.
                let args = self.resolve_all(&descriptor.dependencies, path, observers)?;
                let deps = Dependencies::new(
                    &descriptor.name,
                    descriptor.lifetime,
                    &descriptor.dependencies,
                    &args,
                    &self.disposers,
                );
                match self.claim_slot(descriptor) {
                    Some(slot) => slot.get_or_try_init(|| ctor(&deps)).cloned(),
                    None => ctor(&deps),
                }
            }
        }
    }

    /// Cache slot for a singleton descriptor, if it is still the registration
    /// under its name. Transients never get one.
    ///
    /// The check and the claim happen under the registry read lock, and
    /// `insert_service` and `clear` evict under the write lock, so a slot in
    /// the cache always belongs to the current registration. A descriptor
    /// replaced or cleared mid-resolution gets no slot; its instance goes to
    /// the caller that asked for it and is never cached.
    fn claim_slot(&self, descriptor: &Arc<ServiceDescriptor>) -> Option<Slot> {
        if !descriptor.lifetime.is_singleton() {
            return None;
        }
        let registry = self.registry.read();
        match registry.services.get(&descriptor.name) {
            Some(current) if Arc::ptr_eq(current, descriptor) => Some(self.singletons.claim(&descriptor.name)),
            _ => None,
        }
    }

    fn resolve_all(
        &self,
        names: &[String],
        path: &mut ResolutionPath,
        observers: &Observers,
    ) -> DiResult<Vec<AnyArc>> {
        names.iter().map(|name| self.resolve_in(name, path, observers)).collect()
    }

    #[inline]
    fn observe<F>(&self, name: &str, lifetime: Lifetime, observers: &Observers, f: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        if !observers.has_observers() {
            return f();
        }

        let start = Instant::now();
        observers.resolving(name);
        let result = f();
        match &result {
            Ok(_) => observers.resolved(name, lifetime, start.elapsed()),
            Err(err) => observers.failed(name, err),
        }
        result
    }

    // ----- Introspection -----

    /// Whether `name` is registered as a service or a factory. Never
    /// constructs anything.
    pub fn has(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    /// Names in the service table, sorted.
    pub fn registered_services(&self) -> Vec<String> {
        self.registry.read().service_names()
    }

    /// Names in the factory table, sorted.
    pub fn registered_factories(&self) -> Vec<String> {
        self.registry.read().factory_names()
    }

    /// Whether a singleton instance for `name` is currently cached.
    pub fn is_cached(&self, name: &str) -> bool {
        self.singletons.contains(name)
    }

    /// Number of cached singleton instances.
    pub fn cached_count(&self) -> usize {
        self.singletons.len()
    }

    /// Snapshot of the registration under `name`; services take precedence
    /// over factories of the same name.
    pub fn descriptor(&self, name: &str) -> Option<ServiceInfo> {
        let registry = self.registry.read();
        if let Some(service) = registry.services.get(name) {
            return Some(ServiceInfo::of_service(service, self.singletons.contains(name)));
        }
        registry.factories.get(name).map(|factory| ServiceInfo::of_factory(factory))
    }

    /// Snapshots of every service and factory, sorted by name.
    pub fn service_descriptors(&self) -> Vec<ServiceInfo> {
        let registry = self.registry.read();
        let mut infos: Vec<ServiceInfo> = registry
            .services
            .values()
            .map(|service| ServiceInfo::of_service(service, self.singletons.contains(&service.name)))
            .chain(registry.factories.values().map(|factory| ServiceInfo::of_factory(factory)))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub(crate) fn registry_snapshot(&self) -> (Vec<Arc<ServiceDescriptor>>, Vec<Arc<FactoryDescriptor>>) {
        let registry = self.registry.read();
        (
            registry.services.values().cloned().collect(),
            registry.factories.values().cloned().collect(),
        )
    }

    // ----- Reset and teardown -----

    /// Empties the service table, the singleton cache and the factory table.
    ///
    /// Pending disposal hooks are dropped without running; call
    /// [`dispose_all`](Self::dispose_all) first if they matter. Observers
    /// stay registered.
    pub fn clear(&self) {
        let mut registry = self.registry.write();
        registry.clear();
        self.singletons.clear();
        self.disposers.lock().discard();
    }

    /// Runs every registered disposal hook once, most recent first.
    pub fn dispose_all(&self) {
        let hooks = self.disposers.lock().drain_reverse();
        for (_, hook) in hooks {
            hook();
        }
    }

    /// Number of disposal hooks waiting for [`dispose_all`](Self::dispose_all).
    pub fn pending_disposals(&self) -> usize {
        self.disposers.lock().len()
    }
}

impl Resolver for Container {
    fn resolve_any(&self, name: &str) -> DiResult<AnyArc> {
        self.resolve(name)
    }

    fn resolve_factory_any(&self, name: &str) -> DiResult<AnyArc> {
        self.resolve_factory(name)
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        let bag = self.disposers.get_mut();
        if !bag.is_empty() {
            tracing::warn!(
                pending = bag.len(),
                services = ?bag.services(),
                "container dropped with undisposed services; call dispose_all() before dropping"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn value_ignores_declared_dependencies() {
        let container = Container::new();
        container
            .register_singleton("config", Implementation::value(7u8), &["never-registered"])
            .unwrap();
        assert_eq!(*container.get::<u8>("config").unwrap(), 7);
    }

    #[test]
    fn transient_value_is_returned_verbatim() {
        let container = Container::new();
        let shared = Arc::new(String::from("shared"));
        container
            .register("banner", Implementation::shared(shared.clone()), RegisterOptions::new())
            .unwrap();

        let resolved = container.get::<String>("banner").unwrap();
        assert!(Arc::ptr_eq(&resolved, &shared));
        assert!(!container.is_cached("banner"));
    }

    #[test]
    fn failed_singleton_construction_is_retried() {
        let container = Container::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        container
            .add_singleton("flaky", &[], move |deps| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(deps.error("first attempt fails"))
                } else {
                    Ok(42u32)
                }
            })
            .unwrap();

        let err = container.resolve("flaky").unwrap_err();
        assert_eq!(
            err,
            DiError::Construction { service: "flaky".into(), message: "first attempt fails".into() }
        );
        assert!(!container.is_cached("flaky"));

        assert_eq!(*container.get::<u32>("flaky").unwrap(), 42);
        assert!(container.is_cached("flaky"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn replacing_evicts_cached_singleton() {
        let container = Container::new();
        container.add_value("port", 80u16).unwrap();
        assert_eq!(*container.get::<u16>("port").unwrap(), 80);
        assert!(container.is_cached("port"));

        container.replace_service("port", Implementation::value(8080u16), RegisterOptions::singleton_service());
        assert!(!container.is_cached("port"));
        assert_eq!(*container.get::<u16>("port").unwrap(), 8080);
    }

    #[test]
    fn explicit_lifetime_controls_caching() {
        let container = Container::new();
        for (name, lifetime) in [("clock", Lifetime::Transient), ("calendar", Lifetime::Singleton)] {
            container
                .register(
                    name,
                    Implementation::constructor(|_| Ok(String::from("term"))),
                    RegisterOptions::new().lifetime_of(lifetime),
                )
                .unwrap();
        }

        let clocks = (container.get::<String>("clock").unwrap(), container.get::<String>("clock").unwrap());
        assert!(!Arc::ptr_eq(&clocks.0, &clocks.1));
        let calendars = (container.get::<String>("calendar").unwrap(), container.get::<String>("calendar").unwrap());
        assert!(Arc::ptr_eq(&calendars.0, &calendars.1));
        assert_eq!(container.descriptor("calendar").unwrap().lifetime, Lifetime::Singleton);
    }

    #[test]
    fn try_register_keeps_first() {
        let container = Container::new();
        assert!(container.try_register("env", Implementation::value("dev"), RegisterOptions::new()));
        assert!(!container.try_register("env", Implementation::value("prod"), RegisterOptions::new()));
        assert_eq!(*container.get::<&str>("env").unwrap(), "dev");
    }

    #[test]
    fn factory_name_does_not_clash_with_service_path() {
        let container = Container::new();
        container.add_value("report", 3u8).unwrap();
        container
            .add_factory("report", &["report"], |deps| Ok(*deps.get::<u8>(0)? as u32 * 10))
            .unwrap();

        assert_eq!(*container.get_factory::<u32>("report").unwrap(), 30);
        assert_eq!(container.descriptor("report").unwrap().lifetime, Lifetime::Singleton);
    }

    #[test]
    fn factory_duplicate_rejected_under_reject_policy() {
        let container = Container::with_config(ContainerConfig::default().duplicate_policy(DuplicatePolicy::Reject));
        container.add_factory("id", &[], |_| Ok(1u8)).unwrap();
        assert!(matches!(
            container.add_factory("id", &[], |_| Ok(2u8)),
            Err(DiError::AlreadyRegistered(name)) if name == "id"
        ));
    }

    #[test]
    fn depth_limit_from_config() {
        let container = Container::with_config(ContainerConfig::default().max_depth(2));
        container.add_singleton("a", &["b"], |_| Ok(())).unwrap();
        container.add_singleton("b", &["c"], |_| Ok(())).unwrap();
        container.add_singleton("c", &[], |_| Ok(())).unwrap();

        assert_eq!(container.resolve("a").unwrap_err(), DiError::DepthExceeded(2));
        assert!(container.resolve("b").is_ok());
    }
}
