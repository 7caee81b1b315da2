//! Dependency graph export for documentation and debugging.
//!
//! The graph is built from the registered descriptors only; exporting never
//! constructs a service. Graphviz DOT output is always available, JSON
//! needs the `graph-export` feature.

use std::fmt::Write as _;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::descriptors::{ImplementationKind, ServiceKind};
use crate::lifetime::Lifetime;
use crate::validation::resolved_edges;

const FACTORY_PREFIX: &str = "factory:";

/// A registration in the exported graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Unique node id; factories are prefixed with `factory:` because they
    /// live in their own namespace
    pub id: String,
    pub name: String,
    pub kind: ServiceKind,
    pub implementation: ImplementationKind,
    pub lifetime: Lifetime,
    pub cached: bool,
}

/// A declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    /// Id of the depending node
    pub from: String,
    /// Name of the service depended on
    pub to: String,
    /// Argument position in the constructor
    pub position: usize,
    /// Whether `to` is a registered service
    pub resolvable: bool,
}

/// Snapshot of the registered services, factories and their dependencies
///
/// # Examples
///
/// ```
/// use roster_di::Container;
///
/// let container = Container::new();
/// container.add_value("config", ()).unwrap();
/// container.add_singleton("logger", &["config"], |_| Ok(())).unwrap();
/// container.add_factory("report", &["logger", "clock"], |_| Ok(())).unwrap();
///
/// let graph = container.dependency_graph();
/// assert_eq!(graph.nodes.len(), 3);
/// assert_eq!(graph.edges.len(), 3);
/// assert_eq!(graph.dependencies_of("factory:report"), vec!["logger", "clock"]);
/// assert_eq!(graph.dependents_of("logger"), vec!["factory:report"]);
///
/// let dot = graph.to_dot();
/// assert!(dot.contains("\"logger\" -> \"config\""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Dependency names of node `id`, in argument order.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        let mut edges: Vec<&GraphEdge> = self.edges.iter().filter(|edge| edge.from == id).collect();
        edges.sort_by_key(|edge| edge.position);
        edges.into_iter().map(|edge| edge.to.as_str()).collect()
    }

    /// Ids of nodes that declare `name` as a dependency.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.to == name)
            .map(|edge| edge.from.as_str())
            .collect()
    }

    /// Dependency names that are not registered.
    pub fn unresolved(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .edges
            .iter()
            .filter(|edge| !edge.resolvable)
            .map(|edge| edge.to.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph services {\n    rankdir=LR;\n");
        for node in &self.nodes {
            let shape = match node.kind {
                ServiceKind::Service => "box",
                ServiceKind::Factory => "ellipse",
            };
            let detail = match (node.kind, node.implementation) {
                (ServiceKind::Factory, _) => "factory".to_string(),
                (_, ImplementationKind::Value) => format!("{} value", node.lifetime.as_str()),
                (_, ImplementationKind::Constructor) => node.lifetime.as_str().to_string(),
            };
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\\n{}\", shape={}];",
                escape(&node.id),
                escape(&node.name),
                detail,
                shape
            );
        }
        for name in self.unresolved() {
            let _ = writeln!(out, "    \"{}\" [shape=box, style=dashed, color=red];", escape(name));
        }
        for edge in &self.edges {
            let style = if edge.resolvable { "" } else { ", style=dashed, color=red" };
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"{}\"{}];",
                escape(&edge.from),
                escape(&edge.to),
                edge.position,
                style
            );
        }
        out.push_str("}\n");
        out
    }

    /// Renders the graph as pretty-printed JSON.
    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Container {
    /// Builds the dependency graph of everything registered, sorted by id.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let (mut services, mut factories) = self.registry_snapshot();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        factories.sort_by(|a, b| a.name.cmp(&b.name));

        let mut graph = DependencyGraph::default();
        let is_service = |name: &str| services.iter().any(|service| service.name == name);

        for service in &services {
            graph.nodes.push(GraphNode {
                id: service.name.clone(),
                name: service.name.clone(),
                kind: ServiceKind::Service,
                implementation: service.implementation.kind(),
                lifetime: service.lifetime,
                cached: self.is_cached(&service.name),
            });
            for (position, dependency) in resolved_edges(service).iter().enumerate() {
                graph.edges.push(GraphEdge {
                    from: service.name.clone(),
                    to: dependency.clone(),
                    position,
                    resolvable: is_service(dependency),
                });
            }
        }

        for factory in &factories {
            let id = format!("{}{}", FACTORY_PREFIX, factory.name);
            for (position, dependency) in factory.dependencies.iter().enumerate() {
                graph.edges.push(GraphEdge {
                    from: id.clone(),
                    to: dependency.clone(),
                    position,
                    resolvable: is_service(dependency),
                });
            }
            graph.nodes.push(GraphNode {
                id,
                name: factory.name.clone(),
                kind: ServiceKind::Factory,
                implementation: ImplementationKind::Constructor,
                lifetime: Lifetime::Transient,
                cached: false,
            });
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resolver;

    fn sample() -> Container {
        let container = Container::new();
        container.add_value("config", 1u8).unwrap();
        container.add_singleton("logger", &["config"], |_| Ok(())).unwrap();
        container.add_transient("handler", &["logger", "mailer"], |_| Ok(())).unwrap();
        container
    }

    #[test]
    fn marks_unresolvable_edges() {
        let graph = sample().dependency_graph();
        assert_eq!(graph.unresolved(), vec!["mailer"]);
        assert_eq!(graph.dependencies_of("handler"), vec!["logger", "mailer"]);

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph services {"));
        assert!(dot.contains("\"mailer\" [shape=box, style=dashed, color=red];"));
        assert!(dot.contains("\"handler\" -> \"mailer\" [label=\"1\", style=dashed, color=red];"));
        assert!(dot.contains("\"config\" [label=\"config\\nsingleton value\", shape=box];"));
    }

    #[test]
    fn reflects_cache_state() {
        let container = sample();
        assert!(!container.dependency_graph().node("logger").unwrap().cached);
        container.get::<()>("logger").unwrap();
        assert!(container.dependency_graph().node("logger").unwrap().cached);
    }

    #[test]
    fn escapes_quotes() {
        let container = Container::new();
        container.add_value("say \"hi\"", ()).unwrap();
        assert!(container.dependency_graph().to_dot().contains("\"say \\\"hi\\\"\""));
    }

    #[cfg(feature = "graph-export")]
    #[test]
    fn json_round_trips() {
        let graph = sample().dependency_graph();
        let json = graph.to_json().unwrap();
        let parsed: DependencyGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, graph);
    }
}
