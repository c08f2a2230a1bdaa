//! Build-technology discovery for modmap.
//!
//! Each [`DiscoveryProvider`] inspects a project root for one build
//! technology and reports what it sees as raw per-technology records. The
//! providers know nothing about one another; reconciling their output into
//! named modules happens in `modmap-core`.
//!
//! # Built-in providers
//!
//! - [`CargoProvider`] - `Cargo.toml` packages and `[workspace]` members
//! - [`NpmProvider`] - `package.json` packages and `workspaces` members
//!
//! ## Discovery Behavior for Edge Cases
//!
//! - **Missing or malformed member manifests**: skipped with a warning. Only
//!   valid, named members are reported.
//! - **Malformed root manifest**: an error, since nothing sensible can be
//!   reported for the project.
//! - **Heavy directories**: `node_modules`, `.git`, `target` and `dist` are
//!   never descended into while resolving member globs.
//!
//! ## Usage examples
//!
//! ```rust,ignore
//! use modmap_discovery::ProviderRegistry;
//! use std::path::Path;
//!
//! let output = ProviderRegistry::builtin().discover_all(Path::new("."))?;
//! for record in &output.records {
//!     println!("{} ({})", record.physical_path.display(), record.technology);
//! }
//! ```

pub mod discovery;
pub mod error;
pub mod provider;

pub use discovery::{CargoProvider, NpmProvider};
pub use error::{Error, Result};
pub use provider::{DiscoveryOutput, DiscoveryProvider, ProviderRegistry};
