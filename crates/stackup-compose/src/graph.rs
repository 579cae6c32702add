//! Service dependency graph backed by `petgraph`.
//!
//! Edges point from a dependency to its dependent. Node and edge indices
//! grow in insertion order (nothing is ever removed), which is what makes
//! the ordering below deterministic.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use stackup_common::error::{Result, StackupError};

use crate::definition::ServiceDefinition;

/// Services of a topology and the dependencies between them.
#[derive(Debug, Clone, Default)]
pub struct ServiceGraph {
    graph: DiGraph<ServiceDefinition, ()>,
    index: HashMap<String, NodeIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Frame {
    node: NodeIndex,
    deps: Vec<NodeIndex>,
    next: usize,
}

impl ServiceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from definitions, adding every service first and then
    /// one edge per `depends_on` entry.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate names or dependencies on unknown services.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ServiceDefinition>,
    ) -> Result<Self> {
        let mut graph = Self::new();
        let mut edges = Vec::new();
        for def in definitions {
            edges.extend(
                def.depends_on
                    .iter()
                    .map(|dep| (def.name.clone(), dep.clone())),
            );
            graph.add_service(def)?;
        }
        for (dependent, dependency) in &edges {
            graph.add_dependency(dependent, dependency)?;
        }
        Ok(graph)
    }

    /// Inserts a service node.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::DuplicateService`] if the name is taken.
    pub fn add_service(&mut self, definition: ServiceDefinition) -> Result<()> {
        if self.index.contains_key(&definition.name) {
            return Err(StackupError::DuplicateService {
                name: definition.name,
            });
        }
        let name = definition.name.clone();
        let idx = self.graph.add_node(definition);
        let _ = self.index.insert(name, idx);
        Ok(())
    }

    /// Records that `dependent` depends on `dependency`.
    ///
    /// Adding the same edge twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::UnknownService`] if either endpoint is absent.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        let to = self.node(dependent)?;
        let from = self.node(dependency)?;
        if self.graph.find_edge(from, to).is_none() {
            let _ = self.graph.add_edge(from, to, ());
        }
        Ok(())
    }

    /// Returns service names in an order where every dependency precedes
    /// its dependents.
    ///
    /// Roots are taken in insertion order and each node's dependencies in
    /// the order they were added, so independent services keep their
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::CyclicDependency`] naming a member of a cycle.
    /// No partial order is produced in that case.
    pub fn topological_order(&self) -> Result<TopologicalOrder<'_>> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut stack: Vec<Frame> = Vec::new();

        for root in self.graph.node_indices() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::InProgress;
            stack.push(self.frame(root));

            while let Some(frame) = stack.last_mut() {
                let Some(&dep) = frame.deps.get(frame.next) else {
                    marks[frame.node.index()] = Mark::Done;
                    order.push(frame.node);
                    let _ = stack.pop();
                    continue;
                };
                frame.next += 1;

                match marks[dep.index()] {
                    Mark::Unvisited => {
                        marks[dep.index()] = Mark::InProgress;
                        stack.push(self.frame(dep));
                    }
                    Mark::InProgress => {
                        let member = self.graph[dep].name.clone();
                        tracing::debug!(member = %member, "dependency cycle found");
                        return Err(StackupError::CyclicDependency { member });
                    }
                    Mark::Done => {}
                }
            }
        }

        Ok(TopologicalOrder {
            graph: self,
            order,
            position: 0,
        })
    }

    /// Direct dependencies of `name`, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::UnknownService`] if `name` is absent.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&str>> {
        let node = self.node(name)?;
        Ok(self
            .neighbours(node, Direction::Incoming)
            .into_iter()
            .map(|idx| self.graph[idx].name.as_str())
            .collect())
    }

    /// Services that directly depend on `name`, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::UnknownService`] if `name` is absent.
    pub fn dependents_of(&self, name: &str) -> Result<Vec<&str>> {
        let node = self.node(name)?;
        Ok(self
            .neighbours(node, Direction::Outgoing)
            .into_iter()
            .map(|idx| self.graph[idx].name.as_str())
            .collect())
    }

    /// All services `name` depends on, directly or transitively.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::UnknownService`] if `name` is absent.
    pub fn transitive_dependencies(&self, name: &str) -> Result<BTreeSet<&str>> {
        let start = self.node(name)?;
        let mut seen = BTreeSet::new();
        let mut pending = vec![start];
        while let Some(node) = pending.pop() {
            for dep in self.neighbours(node, Direction::Incoming) {
                if seen.insert(self.graph[dep].name.as_str()) {
                    pending.push(dep);
                }
            }
        }
        Ok(seen)
    }

    /// Looks up a service definition.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    /// Iterates over definitions in insertion order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Whether a service with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph holds no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn node(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| StackupError::UnknownService {
                name: name.to_string(),
            })
    }

    fn frame(&self, node: NodeIndex) -> Frame {
        Frame {
            node,
            deps: self.neighbours(node, Direction::Incoming),
            next: 0,
        }
    }

    /// Neighbours along `direction`, sorted by edge insertion order.
    /// (`petgraph` walks adjacency lists newest first.)
    fn neighbours(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (edge.id(), other)
            })
            .collect();
        edges.sort_unstable_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, other)| other).collect()
    }
}

/// A computed topological order over a [`ServiceGraph`].
///
/// Yields service names; [`restart`](Self::restart) or `clone` gives a
/// fresh pass over the same order.
#[derive(Debug, Clone)]
pub struct TopologicalOrder<'g> {
    graph: &'g ServiceGraph,
    order: Vec<NodeIndex>,
    position: usize,
}

impl<'g> TopologicalOrder<'g> {
    /// Rewinds to the first service.
    pub const fn restart(&mut self) {
        self.position = 0;
    }

    /// Iterates over the definitions in order, from the start.
    pub fn definitions(&self) -> impl Iterator<Item = &'g ServiceDefinition> + '_ {
        let graph = self.graph;
        self.order.iter().map(move |&idx| &graph.graph[idx])
    }

    /// Collects the names into owned strings.
    #[must_use]
    pub fn to_names(&self) -> Vec<String> {
        self.definitions().map(|def| def.name.clone()).collect()
    }
}

impl<'g> Iterator for TopologicalOrder<'g> {
    type Item = &'g str;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;
        let idx = *self.order.get(self.position)?;
        self.position += 1;
        Some(graph.graph[idx].name.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TopologicalOrder<'_> {}
