//! Diagnostic observers for resolution events.
//!
//! The container never logs on its own. Register an observer to trace
//! resolutions, measure construction time or count failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::lifetime::Lifetime;

/// Observer trait for resolution events.
///
/// Calls are made synchronously on the resolving thread; keep
/// implementations cheap.
///
/// # Examples
///
/// ```
/// use roster_di::{Container, DiObserver, Lifetime, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     events: Mutex<Vec<String>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, name: &str) {
///         self.events.lock().unwrap().push(format!("start {}", name));
///     }
///
///     fn resolved(&self, name: &str, _lifetime: Lifetime, _duration: Duration) {
///         self.events.lock().unwrap().push(format!("done {}", name));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let container = Container::new();
/// container.add_observer(recorder.clone());
/// container.add_value("config", 1u8).unwrap();
/// container.add_singleton("logger", &["config"], |_| Ok(())).unwrap();
///
/// container.get::<()>("logger").unwrap();
/// assert_eq!(
///     *recorder.events.lock().unwrap(),
///     vec!["start logger", "start config", "done config", "done logger"]
/// );
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a service's dependencies are resolved.
    fn resolving(&self, name: &str);

    /// Called after a service was produced, with the time spent including
    /// its dependencies.
    fn resolved(&self, name: &str, lifetime: Lifetime, duration: Duration);

    /// Called when a singleton is served from the cache.
    fn cache_hit(&self, _name: &str) {}

    /// Called when resolving `name` failed. Nested failures are reported
    /// once per level they pass through.
    fn failed(&self, _name: &str, _error: &DiError) {}
}

/// Registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, name: &str) {
        for observer in &self.observers {
            observer.resolving(name);
        }
    }

    pub(crate) fn resolved(&self, name: &str, lifetime: Lifetime, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(name, lifetime, duration);
        }
    }

    pub(crate) fn cache_hit(&self, name: &str) {
        for observer in &self.observers {
            observer.cache_hit(name);
        }
    }

    pub(crate) fn failed(&self, name: &str, error: &DiError) {
        for observer in &self.observers {
            observer.failed(name, error);
        }
    }
}

/// Built-in observer that emits `tracing` events.
///
/// Resolutions are logged at `DEBUG`, cache hits at `TRACE`, failures at
/// `WARN`. Every event carries a `service` field and the configured
/// `container` label.
///
/// # Examples
///
/// ```
/// use roster_di::{Container, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(LoggingObserver::with_label("student-records")));
/// ```
pub struct LoggingObserver {
    label: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::with_label("roster-di")
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, name: &str) {
        tracing::debug!(container = %self.label, service = name, "resolving");
    }

    fn resolved(&self, name: &str, lifetime: Lifetime, duration: Duration) {
        tracing::debug!(
            container = %self.label,
            service = name,
            lifetime = lifetime.as_str(),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn cache_hit(&self, name: &str) {
        tracing::trace!(container = %self.label, service = name, "singleton cache hit");
    }

    fn failed(&self, name: &str, error: &DiError) {
        tracing::warn!(container = %self.label, service = name, error = %error, "resolution failed");
    }
}

/// Observer collecting resolution counters.
#[derive(Default)]
pub struct MetricsObserver {
    resolutions: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Services produced by construction or by returning a stored value.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn cache_hit_count(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / count))
    }

    pub fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _name: &str) {}

    fn resolved(&self, _name: &str, _lifetime: Lifetime, duration: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn cache_hit(&self, _name: &str) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn failed(&self, _name: &str, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}
