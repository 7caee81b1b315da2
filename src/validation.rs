//! Static validation of the registered dependency graph.
//!
//! Resolution only discovers a missing or circular registration when it
//! walks into it. Validation walks the declared names up front, without
//! constructing anything, so bootstrap code can fail at startup.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::container::Container;
use crate::descriptors::{Implementation, ServiceDescriptor};
use crate::error::{DiError, DiResult};

/// A problem found in the registered graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `service` declares `dependency`, which is not a registered service
    #[error("{service} depends on unregistered service {dependency}")]
    MissingDependency { service: String, dependency: String },
    /// Services that depend on each other in a cycle; first and last match
    #[error("circular dependency {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },
}

/// Outcome of [`Container::validate`].
///
/// # Examples
///
/// ```
/// use roster_di::{Container, ValidationError};
///
/// let container = Container::new();
/// container.add_singleton("courses", &["students", "catalog"], |_| Ok(())).unwrap();
/// container.add_singleton("students", &["courses"], |_| Ok(())).unwrap();
///
/// let report = container.validate();
/// assert!(!report.is_valid());
/// assert!(report.errors().contains(&ValidationError::MissingDependency {
///     service: "courses".into(),
///     dependency: "catalog".into(),
/// }));
/// assert!(report.errors().contains(&ValidationError::CircularDependency {
///     path: vec!["courses".into(), "students".into(), "courses".into()],
/// }));
/// assert!(report.ensure_valid().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
    checked: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of registrations (services and factories) inspected.
    pub fn checked(&self) -> usize {
        self.checked
    }

    /// Turns a failed report into [`DiError::ValidationFailed`].
    pub fn ensure_valid(self) -> DiResult<()> {
        if self.is_valid() {
            return Ok(());
        }
        let summary: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        Err(DiError::ValidationFailed(summary.join("; ")))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "{} registrations OK", self.checked);
        }
        writeln!(f, "{} problems in {} registrations:", self.errors.len(), self.checked)?;
        for error in &self.errors {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Edges that resolution actually follows; pre-built values ignore theirs.
pub(crate) fn resolved_edges(descriptor: &ServiceDescriptor) -> &[String] {
    match descriptor.implementation {
        Implementation::Value(_) => &[],
        Implementation::Constructor(_) => &descriptor.dependencies,
    }
}

impl Container {
    /// Checks every declared dependency name without constructing anything.
    ///
    /// Reports names that are not registered as services and every cycle
    /// among services. Factory dependencies are checked for existence.
    pub fn validate(&self) -> ValidationReport {
        let (services, factories) = self.registry_snapshot();
        let graph: BTreeMap<&str, &[String]> = services
            .iter()
            .map(|service| (service.name.as_str(), resolved_edges(service)))
            .collect();

        let mut errors = Vec::new();
        for (name, dependencies) in &graph {
            missing(name, dependencies, &graph, &mut errors);
        }
        let mut factories: Vec<_> = factories.iter().collect();
        factories.sort_by(|a, b| a.name.cmp(&b.name));
        for factory in factories.iter() {
            missing(&factory.name, &factory.dependencies, &graph, &mut errors);
        }

        let mut state = HashMap::new();
        let mut stack = Vec::new();
        for &name in graph.keys() {
            if !state.contains_key(name) {
                visit(name, &graph, &mut state, &mut stack, &mut errors);
            }
        }

        ValidationReport { errors, checked: services.len() + factories.len() }
    }
}

fn missing(name: &str, dependencies: &[String], graph: &BTreeMap<&str, &[String]>, errors: &mut Vec<ValidationError>) {
    for dependency in dependencies {
        if !graph.contains_key(dependency.as_str()) {
            errors.push(ValidationError::MissingDependency {
                service: name.to_string(),
                dependency: dependency.clone(),
            });
        }
    }
}

fn visit<'a>(
    name: &'a str,
    graph: &BTreeMap<&'a str, &'a [String]>,
    state: &mut HashMap<&'a str, Visit>,
    stack: &mut Vec<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    state.insert(name, Visit::InProgress);
    stack.push(name);

    let dependencies: &'a [String] = graph.get(name).copied().unwrap_or(&[]);
    for dependency in dependencies {
        let dependency = dependency.as_str();
        match state.get(dependency) {
            Some(Visit::InProgress) => {
                if let Some(start) = stack.iter().position(|n| *n == dependency) {
                    let mut path: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                    path.push(dependency.to_string());
                    errors.push(ValidationError::CircularDependency { path });
                }
            }
            Some(Visit::Done) => {}
            None => {
                if graph.contains_key(dependency) {
                    visit(dependency, graph, state, stack, errors);
                }
            }
        }
    }

    stack.pop();
    state.insert(name, Visit::Done);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Implementation, RegisterOptions};

    #[test]
    fn empty_container_is_valid() {
        let report = Container::new().validate();
        assert!(report.is_valid());
        assert_eq!(report.checked(), 0);
        assert_eq!(report.to_string(), "0 registrations OK");
    }

    #[test]
    fn value_dependencies_are_not_followed() {
        let container = Container::new();
        container
            .register("config", Implementation::value(()), RegisterOptions::new().depends_on(["ghost"]))
            .unwrap();
        assert!(container.validate().is_valid());
    }

    #[test]
    fn factory_missing_dependency() {
        let container = Container::new();
        container.add_factory("mailer", &["smtp"], |_| Ok(())).unwrap();

        let report = container.validate();
        assert_eq!(
            report.errors(),
            &[ValidationError::MissingDependency { service: "mailer".into(), dependency: "smtp".into() }]
        );
        let err = report.ensure_valid().unwrap_err();
        assert_eq!(
            err,
            DiError::ValidationFailed("mailer depends on unregistered service smtp".into())
        );
    }

    #[test]
    fn self_cycle() {
        let container = Container::new();
        container.add_transient("loop", &["loop"], |_| Ok(())).unwrap();
        assert_eq!(
            container.validate().errors(),
            &[ValidationError::CircularDependency { path: vec!["loop".into(), "loop".into()] }]
        );
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let container = Container::new();
        container.add_value("config", ()).unwrap();
        container.add_singleton("left", &["config"], |_| Ok(())).unwrap();
        container.add_singleton("right", &["config"], |_| Ok(())).unwrap();
        container.add_singleton("top", &["left", "right"], |_| Ok(())).unwrap();

        let report = container.validate();
        assert!(report.is_valid(), "{}", report);
        assert_eq!(report.checked(), 4);
    }
}
