//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (closing a
/// connection pool, flushing a mail queue). Hooks run in LIFO order when
/// [`Container::dispose_all`](crate::Container::dispose_all) is called, so a
/// service is disposed before the dependencies it was built from.
///
/// # Examples
///
/// ```
/// use roster_di::{Container, Dispose, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct ConnectionPool {
///     closed: AtomicBool,
/// }
///
/// impl Dispose for ConnectionPool {
///     fn dispose(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let container = Container::new();
/// container
///     .add_disposable_singleton("pool", &[], |_| Ok(ConnectionPool { closed: AtomicBool::new(false) }))
///     .unwrap();
///
/// let pool = container.get::<ConnectionPool>("pool").unwrap();
/// container.dispose_all();
/// assert!(pool.closed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
