//! Nested dependency trees rooted at usage roots.

use crate::{ModuleGraph, ModuleNodeData, Result};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashSet;

/// A module and, recursively, the modules it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Module name.
    pub name: String,
    /// Direct dependencies, sorted by name.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a leaf node.
    #[must_use]
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Depth of the tree, where a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .dependencies
            .iter()
            .map(Self::depth)
            .max()
            .unwrap_or(0)
    }

    /// Find a node anywhere in this tree by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.dependencies.iter().find_map(|child| child.find(name))
    }
}

impl<T: ModuleNodeData> ModuleGraph<T> {
    /// Tree of everything `name` depends on.
    ///
    /// Expansion stops at a module that is already on the current path, so
    /// cyclic graphs still produce finite trees.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownModule`] if `name` is not in the graph.
    pub fn dependency_tree(&self, name: &str) -> Result<TreeNode> {
        let index = self.require(name)?;
        let mut path = HashSet::new();
        Ok(self.expand(index, &mut path))
    }

    /// One tree per usage root (modules nothing depends on), sorted by name.
    #[must_use]
    pub fn forest(&self) -> Vec<TreeNode> {
        self.roots()
            .iter()
            .filter_map(|root| self.get_node_index(root))
            .map(|index| {
                let mut path = HashSet::new();
                self.expand(index, &mut path)
            })
            .collect()
    }

    fn expand(&self, index: NodeIndex, path: &mut HashSet<NodeIndex>) -> TreeNode {
        let graph = self.inner();
        path.insert(index);

        let mut children: Vec<NodeIndex> = graph
            .neighbors_directed(index, Direction::Outgoing)
            .filter(|child| !path.contains(child))
            .collect();
        children.sort_by(|a, b| graph[*a].name.cmp(&graph[*b].name));

        let dependencies = children
            .into_iter()
            .map(|child| self.expand(child, path))
            .collect();

        path.remove(&index);
        TreeNode {
            name: graph[index].name.clone(),
            dependencies,
        }
    }
}
