//! Process-wide container.

use once_cell::sync::Lazy;

use crate::config::ContainerConfig;
use crate::container::Container;

// Created on first access; configured from the environment.
static GLOBAL: Lazy<Container> = Lazy::new(|| match ContainerConfig::from_env() {
    Ok(config) => Container::with_config(config),
    Err(err) => {
        tracing::warn!(error = %err, "ignoring invalid container settings; using defaults");
        Container::new()
    }
});

/// Returns the shared process-wide container.
///
/// The instance is created on first access with settings from
/// [`ContainerConfig::from_env`]. It lives for the rest of the process, so
/// disposal hooks on it only run through an explicit
/// [`Container::dispose_all`].
///
/// # Examples
///
/// ```
/// use roster_di::{global, Resolver};
///
/// global().add_value("app-name", "roster").unwrap();
/// assert_eq!(*global().get::<&str>("app-name").unwrap(), "roster");
/// ```
pub fn global() -> &'static Container {
    &GLOBAL
}
