//! modmap - module discovery and dependency graphs for polyglot projects
//!
//! A repository may mix several build technologies, sometimes in the same
//! directory. modmap asks one [`DiscoveryProvider`] per technology what it
//! sees, reconciles the answers into a registry of uniquely named modules,
//! persists that registry, and answers questions about it:
//!
//! - [`Project::list`] - module names, optionally filtered
//! - [`Project::graph`] - dependency tree, topological layers and cycles
//! - [`Project::resolve`] - the executable(s) behind a canonical command
//! - [`Project::describe`] - one module merged with its enrichment entry
//!
//! # Example
//!
//! ```no_run
//! use modmap::Project;
//!
//! fn main() -> modmap::Result<()> {
//!     let project = Project::open(".")?;
//!     project.discover()?;
//!
//!     for executable in project.resolve("verify", Some("web"))?.executables() {
//!         println!("{executable}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Queries read the persisted registry, so they fail with a "run discovery
//! first" diagnostic until [`Project::discover`] has run once.

pub mod error;
pub mod project;
pub mod tracing;

pub use error::{Error, Result};
pub use project::{Project, ProjectBuilder};

pub use modmap_core::query::{
    CommandSource, DependencyTree, GraphResult, ListFilter, ModuleView, Resolution,
    TechnologyCommand,
};
pub use modmap_core::{
    CommandValue, EngineConfig, EnrichmentSnapshot, Module, PackagingKind, Registry, Technology,
    commands,
};
pub use modmap_discovery::{DiscoveryProvider, ProviderRegistry};
