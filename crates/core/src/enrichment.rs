//! Read-only view of the enrichment layer.
//!
//! Enrichment data (descriptions, leaf flags, classifications) is authored
//! and persisted independently of the registry. modmap never writes it; it
//! only reads a snapshot and merges it into responses.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Classifications that keep an aggregator module in the dependency graph.
pub const LEAF_PURPOSES: [&str; 5] = [
    "integration-test",
    "e2e-test",
    "deployment",
    "benchmark",
    "distribution",
];

/// Enrichment attached to one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEnrichment {
    /// Explicitly marks the module as a graph leaf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_leaf: Option<bool>,
    /// Purpose classification, e.g. `integration-test`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Human-authored description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any further fields, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModuleEnrichment {
    /// Whether this enrichment keeps an aggregator in the graph.
    #[must_use]
    pub fn marks_leaf(&self) -> bool {
        self.is_leaf == Some(true)
            || self
                .classification
                .as_deref()
                .is_some_and(|c| LEAF_PURPOSES.contains(&c))
    }
}

/// Immutable snapshot of the enrichment artifact, keyed by module name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSnapshot {
    #[serde(default)]
    modules: BTreeMap<String, ModuleEnrichment>,
}

impl EnrichmentSnapshot {
    /// Create a snapshot from in-memory entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ModuleEnrichment)>) -> Self {
        Self {
            modules: entries.into_iter().collect(),
        }
    }

    /// Load the enrichment artifact; a missing file is an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No enrichment data present");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(e, path, "reading enrichment data")),
        };

        serde_json::from_str(&content).map_err(|source| Error::Json {
            source,
            path: Some(path.to_path_buf()),
        })
    }

    /// Enrichment for a module, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleEnrichment> {
        self.modules.get(name)
    }

    /// Whether the enrichment layer marks `name` as a graph leaf.
    #[must_use]
    pub fn marks_leaf(&self, name: &str) -> bool {
        self.get(name).is_some_and(ModuleEnrichment::marks_leaf)
    }

    /// Number of enriched modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
