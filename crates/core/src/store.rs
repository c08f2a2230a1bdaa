//! On-disk persistence of the module registry.
//!
//! The registry is written as pretty-printed JSON with sorted keys so that
//! identical discovery results produce byte-identical files. Writes go to a
//! sibling temporary file that is synced and then renamed over the artifact,
//! so concurrent readers see either the old or the new registry, never a
//! partial one.

use crate::error::{Error, Result};
use crate::registry::{Registry, SCHEMA_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default registry location relative to the project root.
pub const DEFAULT_REGISTRY_PATH: &str = ".modmap/registry.json";

/// Reads and atomically replaces the registry artifact.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store for the artifact at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the registry artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a registry has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the registry.
    ///
    /// # Errors
    ///
    /// - [`Error::RegistryNotFound`] if discovery has not run yet
    /// - [`Error::CorruptRegistry`] if the file cannot be parsed
    /// - [`Error::UnsupportedSchemaVersion`] if it was written by a newer schema
    /// - [`Error::Io`] for any other read failure
    pub fn load(&self) -> Result<Registry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RegistryNotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(Error::io(e, &self.path, "reading registry")),
        };

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| self.corrupt(source))?;

        if let Some(found) = value.get("schemaVersion").and_then(serde_json::Value::as_u64)
            && found > u64::from(SCHEMA_VERSION)
        {
            return Err(Error::UnsupportedSchemaVersion {
                path: self.path.clone(),
                found,
                supported: SCHEMA_VERSION,
            });
        }

        let registry: Registry =
            serde_json::from_value(value).map_err(|source| self.corrupt(source))?;
        debug!(
            path = %self.path.display(),
            modules = registry.len(),
            "Loaded module registry"
        );
        Ok(registry)
    }

    /// Atomically replace the registry artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be created or the file
    /// cannot be written, synced or renamed.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
        }

        let mut contents = serde_json::to_string_pretty(registry).map_err(|source| Error::Json {
            source,
            path: Some(self.path.clone()),
        })?;
        contents.push('\n');

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(e) = write_synced(&tmp_path, contents.as_bytes()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            Error::io(e, &self.path, "rename")
        })?;

        info!(
            path = %self.path.display(),
            modules = registry.len(),
            "Saved module registry"
        );
        Ok(())
    }

    fn corrupt(&self, source: serde_json::Error) -> Error {
        Error::CorruptRegistry {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|e| Error::io(e, path, "create"))?;
    file.write_all(data)
        .map_err(|e| Error::io(e, path, "write"))?;
    file.sync_all().map_err(|e| Error::io(e, path, "sync"))?;
    Ok(())
}
