//! Core traits for the service container.

mod dispose;
pub(crate) mod resolver;

pub use dispose::Dispose;
pub use resolver::Resolver;
