//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use roster_di::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct RequestId(u32);
///
/// let container = Container::new();
/// container.add_singleton("clock", &[], |_| Ok(Clock)).unwrap();
/// container.add_transient("request_id", &[], |_| Ok(RequestId(7))).unwrap();
///
/// // Singleton: same instance every time
/// let c1 = container.get::<Clock>("clock").unwrap();
/// let c2 = container.get::<Clock>("clock").unwrap();
/// assert!(Arc::ptr_eq(&c1, &c2));
///
/// // Transient: new instance every time
/// let r1 = container.get::<RequestId>("request_id").unwrap();
/// let r2 = container.get::<RequestId>("request_id").unwrap();
/// assert!(!Arc::ptr_eq(&r1, &r2));
///
/// assert_eq!(container.descriptor("clock").unwrap().lifetime, Lifetime::Singleton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// Single instance per container, created on first resolution
    ///
    /// The first successful construction is cached and every later
    /// resolution returns the same `Arc`, until the container is cleared
    /// or the service is replaced.
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// Dependencies are resolved again for every construction; only the
    /// singleton ones among them are shared.
    #[default]
    Transient,
}

impl Lifetime {
    /// Returns `true` for [`Lifetime::Singleton`].
    pub fn is_singleton(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
        }
    }
}

impl From<bool> for Lifetime {
    fn from(singleton: bool) -> Self {
        if singleton {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }
}
