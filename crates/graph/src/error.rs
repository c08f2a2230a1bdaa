//! Error types for module graph operations.

use thiserror::Error;

/// Result type for module graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during module graph queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A query named a module that is not a node of the graph.
    #[error("Module '{name}' is not part of the graph (known: {})", available.join(", "))]
    UnknownModule {
        /// The requested module name.
        name: String,
        /// Every module name present in the graph, sorted.
        available: Vec<String>,
    },
}
