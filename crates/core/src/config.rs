//! Engine configuration loaded from `modmap.toml`.

use crate::error::{Error, Result};
use crate::model::{CommandValue, Technology, TechnologyOrder};
use crate::paths;
use crate::store::DEFAULT_REGISTRY_PATH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file name looked up at the project root.
pub const CONFIG_FILE: &str = "modmap.toml";

/// Default enrichment location relative to the project root.
pub const DEFAULT_ENRICHMENT_PATH: &str = ".modmap/enrichment.json";

/// Main configuration structure for modmap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Project name; defaults to the root directory name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Technology priority for base-name selection and ordering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology_priority: Option<Vec<String>>,

    /// Technologies whose providers run; empty means all built-in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_technologies: Vec<String>,

    /// Registry artifact path, relative to the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,

    /// Enrichment artifact path, relative to the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_path: Option<PathBuf>,

    /// Project-wide command overrides for the default module
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_commands: BTreeMap<String, CommandValue>,
}

impl EngineConfig {
    /// Load `modmap.toml` from `root`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the file is not valid TOML for
    /// this structure, [`Error::SharedArtifactPath`] if the registry and
    /// enrichment paths name one file, or [`Error::Io`] if it cannot be read.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(e, &path, "reading configuration")),
        };

        let config: Self = toml::from_str(&content).map_err(|source| Error::InvalidConfig {
            path: path.clone(),
            source,
        })?;

        let registry = config.registry_path(Path::new(""));
        if paths::key(&registry) == paths::key(&config.enrichment_path(Path::new(""))) {
            return Err(Error::SharedArtifactPath {
                path,
                artifact: registry,
            });
        }
        Ok(config)
    }

    /// The configured technology order, or the built-in one.
    #[must_use]
    pub fn technology_order(&self) -> TechnologyOrder {
        self.technology_priority
            .as_ref()
            .map_or_else(TechnologyOrder::default, |tags| {
                TechnologyOrder::new(tags.iter().map(Technology::new).collect())
            })
    }

    /// Enabled technology tags, normalized.
    #[must_use]
    pub fn enabled_technologies(&self) -> Vec<Technology> {
        self.enabled_technologies
            .iter()
            .map(Technology::new)
            .collect()
    }

    /// Project name for a project rooted at `root`.
    #[must_use]
    pub fn project_name_for(&self, root: &Path) -> String {
        if let Some(name) = self.project_name.as_deref()
            && !name.trim().is_empty()
        {
            return name.trim().to_string();
        }

        root.canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(root)
            .file_name()
            .map_or_else(
                || "project".to_string(),
                |name| name.to_string_lossy().into_owned(),
            )
    }

    /// Absolute registry path for a project rooted at `root`.
    #[must_use]
    pub fn registry_path(&self, root: &Path) -> PathBuf {
        root.join(
            self.registry_path
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_REGISTRY_PATH)),
        )
    }

    /// Absolute enrichment path for a project rooted at `root`.
    #[must_use]
    pub fn enrichment_path(&self, root: &Path) -> PathBuf {
        root.join(
            self.enrichment_path
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_ENRICHMENT_PATH)),
        )
    }
}
