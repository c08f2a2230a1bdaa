//! Error types for registry, aggregation and query operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for modmap-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reconciling raw module records into a registry.
///
/// Every variant is a data-integrity signal: the discovery run that produced
/// the records is aborted and nothing is persisted.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// More than one record at the same path claims to be the aggregator.
    #[error(
        "Conflicting packaging at '{physical_path}': {} all claim to be the aggregator",
        technologies.join(", ")
    )]
    #[diagnostic(
        code(modmap::core::conflicting_packaging),
        help("Only one build descriptor per directory may act as the no-code aggregator")
    )]
    ConflictingPackaging {
        /// The shared physical path.
        physical_path: String,
        /// Technologies whose records claim aggregator packaging.
        technologies: Vec<String>,
    },

    /// Two records would produce modules with the same name.
    #[error("Module name '{name}' is claimed by both '{first_path}' and '{second_path}'")]
    #[diagnostic(
        code(modmap::core::duplicate_name),
        help("Module names must be unique; rename one of the modules in its build descriptor")
    )]
    DuplicateName {
        /// The clashing module name.
        name: String,
        /// Path of the first module with this name.
        first_path: String,
        /// Path of the second module with this name.
        second_path: String,
    },

    /// A record classified as aggregator lists source paths.
    #[error("Aggregator module '{name}' at '{physical_path}' must not own source paths")]
    #[diagnostic(
        code(modmap::core::aggregator_with_sources),
        help("The discovery provider classified a module with sources as a no-code aggregator")
    )]
    AggregatorWithSources {
        /// Name of the offending record.
        name: String,
        /// Its physical path.
        physical_path: String,
    },

    /// One path was reported twice by the same technology.
    #[error("Technology '{technology}' reported '{physical_path}' more than once")]
    #[diagnostic(
        code(modmap::core::duplicate_technology),
        help("A discovery provider must report each directory at most once")
    )]
    DuplicateTechnology {
        /// The shared physical path.
        physical_path: String,
        /// The repeated technology tag.
        technology: String,
    },
}

/// Errors that can occur in modmap-core.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No registry has been written yet.
    #[error("Module registry not found at {}", path.display())]
    #[diagnostic(
        code(modmap::core::registry_not_found),
        help("Run discovery first to build the module registry")
    )]
    RegistryNotFound {
        /// Where the registry was expected.
        path: PathBuf,
    },

    /// The registry exists but cannot be parsed.
    #[error("Module registry at {} is corrupt: {source}", path.display())]
    #[diagnostic(
        code(modmap::core::registry_corrupt),
        help("The registry file is damaged; run discovery again to rebuild it")
    )]
    CorruptRegistry {
        /// Path of the registry file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The registry was written by a newer schema.
    #[error(
        "Module registry at {} uses schema version {found}, but only {supported} is supported",
        path.display()
    )]
    #[diagnostic(
        code(modmap::core::unsupported_schema),
        help("Upgrade modmap or run discovery again with this version")
    )]
    UnsupportedSchemaVersion {
        /// Path of the registry file.
        path: PathBuf,
        /// Version found in the file.
        found: u64,
        /// Highest supported version.
        supported: u32,
    },

    /// Aggregation of discovered records failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Aggregation(#[from] AggregationError),

    /// A query referenced an unknown module.
    #[error("Module '{name}' not found. Available modules: {}", available.join(", "))]
    #[diagnostic(
        code(modmap::core::module_not_found),
        help("Use one of the listed module names, or rerun discovery if the module is new")
    )]
    ModuleNotFound {
        /// The requested module name.
        name: String,
        /// All known module names, sorted.
        available: Vec<String>,
    },

    /// The command is defined neither on the module nor on the defaults.
    #[error(
        "Command '{command}' is not defined for module '{module}'. Available commands: {}",
        available.join(", ")
    )]
    #[diagnostic(
        code(modmap::core::command_not_found),
        help("Use one of the listed canonical command names")
    )]
    CommandNotFound {
        /// The requested canonical command.
        command: String,
        /// The module the lookup ran against.
        module: String,
        /// Command names the module and defaults provide, sorted.
        available: Vec<String>,
    },

    /// Two modules with the same name were handed to the registry.
    #[error("Duplicate module name '{name}' in registry")]
    #[diagnostic(code(modmap::core::duplicate_module))]
    DuplicateModule {
        /// The repeated name.
        name: String,
    },

    /// A list filter pattern is not a valid glob.
    #[error("Invalid module name pattern '{pattern}': {source}")]
    #[diagnostic(
        code(modmap::core::invalid_pattern),
        help("Patterns use glob syntax, e.g. 'service-*'")
    )]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The glob parse error.
        #[source]
        source: glob::PatternError,
    },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration at {}: {source}", path.display())]
    #[diagnostic(
        code(modmap::core::invalid_config),
        help("Check modmap.toml for syntax errors or unknown fields")
    )]
    InvalidConfig {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The registry and enrichment artifacts resolve to one file.
    #[error(
        "Invalid configuration at {}: registryPath and enrichmentPath both point to {}",
        path.display(),
        artifact.display()
    )]
    #[diagnostic(
        code(modmap::core::invalid_config),
        help("The registry is rewritten by discovery and must not share a file with enrichment data")
    )]
    SharedArtifactPath {
        /// Path to the configuration file.
        path: PathBuf,
        /// The artifact path both settings name.
        artifact: PathBuf,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(modmap::core::io_error),
        help("Check that the referenced paths exist and that you have permission to read or write them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON error outside of registry loading (enrichment data, serialization).
    #[error("JSON error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(modmap::core::json_error),
        help("Ensure the file contains valid JSON in the expected shape")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being processed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Whether this error means discovery has never been run.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RegistryNotFound { .. })
    }

    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>, operation: &str) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.to_string(),
        }
    }
}
