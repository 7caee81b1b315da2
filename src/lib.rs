//! # roster-di
//!
//! Named-service dependency injection for the student-records service.
//!
//! ## Features
//!
//! - **Named services**: every service is registered and resolved by a string name
//! - **Constructor injection**: declared dependencies are resolved in order and passed positionally
//! - **Singleton caching**: a singleton is constructed at most once, even under concurrent first use
//! - **Circular dependency detection**: cycles fail with the full resolution path
//! - **Factories**: transient constructors in a separate namespace, never cached
//! - **Diagnostics**: validation, dependency graph export and resolution observers
//!
//! Optional cargo features: `global` (a process-wide container), `serde`
//! and `graph-export` (JSON output of the dependency graph).
//!
//! ## Quick Start
//!
//! ```rust
//! use roster_di::{Container, Resolver};
//! use std::sync::Arc;
//!
//! struct Config { database_url: String }
//! struct StudentRepository { config: Arc<Config> }
//! struct StudentService { repository: Arc<StudentRepository> }
//!
//! let container = Container::new();
//! container.add_value("config", Config { database_url: "postgres://localhost/roster".into() }).unwrap();
//! container
//!     .add_singleton("studentRepository", &["config"], |deps| {
//!         Ok(StudentRepository { config: deps.get(0)? })
//!     })
//!     .unwrap();
//! container
//!     .add_singleton("studentService", &["studentRepository"], |deps| {
//!         Ok(StudentService { repository: deps.get(0)? })
//!     })
//!     .unwrap();
//!
//! let service = container.get::<StudentService>("studentService").unwrap();
//! assert_eq!(service.repository.config.database_url, "postgres://localhost/roster");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: created on first resolution and shared for the container's lifetime
//! - **Transient**: a constructor runs on every resolution
//!
//! ## Factories
//!
//! ```rust
//! use roster_di::{Container, Resolver};
//!
//! struct Clock;
//! struct Report { title: String }
//!
//! let container = Container::new();
//! container.add_value("clock", Clock).unwrap();
//! container
//!     .add_factory("report", &["clock"], |_deps| Ok(Report { title: "enrolment".into() }))
//!     .unwrap();
//!
//! let report = container.get_factory::<Report>("report").unwrap();
//! assert_eq!(report.title, "enrolment");
//! assert!(container.get::<Report>("report").is_err());
//! ```

pub mod config;
pub mod container;
pub mod dependencies;
pub mod descriptors;
pub mod error;
pub mod graph_export;
pub mod lifetime;
pub mod observer;
pub mod registration;
pub mod traits;
pub mod validation;

#[cfg(feature = "global")]
pub mod global;

// Internal modules
mod cache;
mod internal;

pub use config::{ConfigError, ContainerConfig, DuplicatePolicy};
pub use container::Container;
pub use dependencies::Dependencies;
pub use descriptors::{
    AnyArc, Constructor, FactoryDescriptor, Implementation, ImplementationKind, ServiceDescriptor, ServiceInfo,
    ServiceKind,
};
pub use error::{DiError, DiResult};
pub use graph_export::{DependencyGraph, GraphEdge, GraphNode};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver, MetricsObserver};
pub use registration::RegisterOptions;
pub use traits::{Dispose, Resolver};
pub use validation::{ValidationError, ValidationReport};

#[cfg(feature = "global")]
pub use global::global;
