//! Module graph builder using petgraph.
//!
//! This module builds directed graphs from module declarations. Only
//! dependencies that name another node become edges; everything else is an
//! external artifact and is reported back to the caller rather than failing.

use crate::{Error, ModuleNodeData, Result};
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A node in the module graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Name of the module.
    pub name: String,
    /// The module data.
    pub module: T,
}

/// Outcome of wiring dependency edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeReport {
    /// Number of distinct edges added.
    pub added: usize,
    /// `(module, identifier)` pairs whose identifier matched no node.
    pub external: Vec<(String, String)>,
}

/// Module graph for dependency ordering and structural queries.
///
/// This is a generic graph that can hold any module type implementing
/// [`ModuleNodeData`]. Edges run from a module to each module it depends on.
pub struct ModuleGraph<T: ModuleNodeData> {
    /// The directed graph of modules.
    graph: DiGraph<GraphNode<T>, ()>,
    /// Map from module names to node indices.
    name_to_node: HashMap<String, NodeIndex>,
}

impl<T: ModuleNodeData> ModuleGraph<T> {
    /// Create a new empty module graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_node: HashMap::new(),
        }
    }

    /// Add a single module to the graph.
    ///
    /// If a module with the same name already exists, returns the existing node index.
    pub fn add_module(&mut self, name: &str, module: T) -> NodeIndex {
        if let Some(&node) = self.name_to_node.get(name) {
            return node;
        }

        let node_index = self.graph.add_node(GraphNode {
            name: name.to_string(),
            module,
        });
        self.name_to_node.insert(name.to_string(), node_index);
        debug!("Added module node '{}'", name);

        node_index
    }

    /// Add dependency edges after all modules have been added.
    ///
    /// Repeated declarations collapse into a single edge and self references
    /// are ignored.
    pub fn add_dependency_edges(&mut self) -> EdgeReport {
        let mut report = EdgeReport::default();
        let mut edges_to_add = Vec::new();

        for (node_index, node) in self.graph.node_references() {
            for dep_name in node.module.dependency_names() {
                match self.name_to_node.get(dep_name) {
                    Some(&dep_index) if dep_index == node_index => {
                        debug!("Ignoring self dependency of '{}'", node.name);
                    }
                    Some(&dep_index) => edges_to_add.push((node_index, dep_index)),
                    None => report
                        .external
                        .push((node.name.clone(), dep_name.to_string())),
                }
            }
        }

        for (from, to) in edges_to_add {
            if self.graph.find_edge(from, to).is_none() {
                self.graph.add_edge(from, to, ());
                report.added += 1;
            }
        }

        debug!(
            added = report.added,
            external = report.external.len(),
            "Wired module dependency edges"
        );
        report
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Get the number of modules in the graph.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of dependency edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a module exists in the graph.
    #[must_use]
    pub fn contains_module(&self, name: &str) -> bool {
        self.name_to_node.contains_key(name)
    }

    /// Get the node index for a module by name.
    #[must_use]
    pub fn get_node_index(&self, name: &str) -> Option<NodeIndex> {
        self.name_to_node.get(name).copied()
    }

    /// All module names, sorted.
    #[must_use]
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.name_to_node.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of the modules `name` directly depends on, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] if `name` is not in the graph.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<String>> {
        let index = self.require(name)?;
        Ok(self.sorted_neighbors(index, Direction::Outgoing))
    }

    /// Names of the modules that directly depend on `name`, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] if `name` is not in the graph.
    pub fn dependents_of(&self, name: &str) -> Result<Vec<String>> {
        let index = self.require(name)?;
        Ok(self.sorted_neighbors(index, Direction::Incoming))
    }

    /// Every module reachable from `name` by following dependency edges.
    ///
    /// The starting module itself is not included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] if `name` is not in the graph.
    pub fn transitive_dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let start = self.require(name)?;
        let mut seen = HashSet::from([start]);
        let mut frontier = vec![start];
        let mut all = BTreeSet::new();

        while let Some(current) = frontier.pop() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if seen.insert(next) {
                    all.insert(self.graph[next].name.clone());
                    frontier.push(next);
                }
            }
        }

        Ok(all)
    }

    /// Modules nothing else in the graph depends on, sorted by name.
    ///
    /// These are the usage roots from a caller's perspective.
    #[must_use]
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].name.clone())
            .collect();
        roots.sort();
        roots
    }

    pub(crate) fn inner(&self) -> &DiGraph<GraphNode<T>, ()> {
        &self.graph
    }

    pub(crate) fn require(&self, name: &str) -> Result<NodeIndex> {
        self.get_node_index(name)
            .ok_or_else(|| Error::UnknownModule {
                name: name.to_string(),
                available: self.module_names(),
            })
    }

    pub(crate) fn sorted_neighbors(&self, index: NodeIndex, direction: Direction) -> Vec<String> {
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|idx| self.graph[idx].name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl<T: ModuleNodeData> Default for ModuleGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
