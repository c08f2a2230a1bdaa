//! Module dependency graph algorithms for modmap.
//!
//! This crate provides a directed graph over named modules, built on petgraph,
//! together with the structural queries the rest of modmap needs: topological
//! layering, cycle detection and nested dependency trees.
//!
//! Edges point from a module to the modules it depends on, so `app -> lib`
//! reads "app depends on lib".
//!
//! # Key Types
//!
//! - [`ModuleGraph`]: The graph structure for building and querying module dependencies
//! - [`ModuleNodeData`]: Trait that module types implement to be stored in the graph
//! - [`Layering`]: Layers of independent modules plus any detected cycles
//! - [`TreeNode`]: A module and, recursively, what it depends on
//!
//! # Example
//!
//! ```ignore
//! use modmap_graph::{ModuleGraph, ModuleNodeData};
//!
//! struct Node {
//!     deps: Vec<String>,
//! }
//!
//! impl ModuleNodeData for Node {
//!     fn dependency_names(&self) -> impl Iterator<Item = &str> {
//!         self.deps.iter().map(String::as_str)
//!     }
//! }
//!
//! let mut graph = ModuleGraph::new();
//! graph.add_module("lib", Node { deps: vec![] });
//! graph.add_module("app", Node { deps: vec!["lib".to_string()] });
//! graph.add_dependency_edges();
//!
//! let layering = graph.layers();
//! assert_eq!(layering.layers, vec![vec!["lib".to_string()], vec!["app".to_string()]]);
//! ```

mod error;
mod graph;
mod traversal;
mod tree;

pub use error::{Error, Result};
pub use graph::{EdgeReport, GraphNode, ModuleGraph};
pub use traversal::Layering;
pub use tree::TreeNode;

/// Trait for module data that can be stored in the module graph.
///
/// Dependency names that do not match another node in the graph are treated
/// as external and never become edges.
pub trait ModuleNodeData: Clone {
    /// Returns the identifiers this module declares as dependencies.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;
}
