//! Read-only queries over a loaded registry.
//!
//! Every query takes the registry (and, where needed, the enrichment
//! snapshot) explicitly; nothing here touches the filesystem.

mod describe;
mod graph;
mod list;
mod resolve;

pub use describe::{ModuleView, describe};
pub use graph::{DependencyTree, GraphResult, build_graph};
pub use list::{ListFilter, list};
pub use resolve::{
    CommandSource, DEFAULT_MODULE_NAME, Resolution, TechnologyCommand, resolve,
};
