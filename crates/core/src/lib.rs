//! Module registry, aggregation and queries for modmap.
//!
//! Discovery providers report raw per-technology records; this crate turns
//! them into a canonical set of named modules and answers questions about
//! them.
//!
//! # Architecture
//!
//! - [`aggregate`] - Pure reconciliation of raw records into [`Module`]s,
//!   splitting directories claimed by several technologies into sibling
//!   virtual modules
//! - [`Registry`] - Immutable snapshot of a project's modules plus the
//!   project-wide [`DefaultModule`]
//! - [`RegistryStore`] - Atomic JSON persistence of the registry
//! - [`EnrichmentSnapshot`] - Read-only, independently stored annotations
//! - [`query`] - `list`, `build_graph`, `resolve` and `describe`
//!
//! ## Virtual modules
//!
//! A directory containing both `pom.xml` and `package.json` is reported by
//! two providers. Aggregation emits one module per technology, named
//! `{base}-{technology}`, each carrying [`VirtualModuleInfo`] that lists its
//! siblings. Commands stay scoped to the technology that reported them.
//!
//! ## Usage examples
//!
//! ```rust,ignore
//! use modmap_core::{RegistryStore, query};
//!
//! let registry = RegistryStore::new(".modmap/registry.json").load()?;
//! let resolution = query::resolve(&registry, "verify", Some("ui"))?;
//! for executable in resolution.executables() {
//!     println!("{executable}");
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod model;
pub mod paths;
pub mod query;
pub mod registry;
pub mod store;

pub use aggregate::{AggregateOptions, aggregate};
pub use config::EngineConfig;
pub use enrichment::{EnrichmentSnapshot, LEAF_PURPOSES, ModuleEnrichment};
pub use error::{AggregationError, Error, Result};
pub use model::{
    CommandValue, Dependency, Module, PackagingKind, RawModuleRecord, Technology,
    TechnologyOrder, VirtualModuleInfo, commands,
};
pub use registry::{DefaultModule, ProjectInfo, Registry, SCHEMA_VERSION};
pub use store::RegistryStore;
