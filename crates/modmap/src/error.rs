//! Error types for the modmap facade.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`crate::Project`].
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The project root does not exist or is not a directory.
    #[error("Project root {} does not exist or is not a directory", path.display())]
    #[diagnostic(
        code(modmap::root_not_found),
        help("Point modmap at the directory containing your build descriptors")
    )]
    RootNotFound {
        /// The requested root.
        path: PathBuf,
    },

    /// The tracing filter directive could not be parsed.
    #[error("Failed to create tracing filter: {message}")]
    #[diagnostic(
        code(modmap::tracing_filter),
        help("Use RUST_LOG syntax, e.g. `modmap=debug,modmap_core=info`")
    )]
    TracingFilter {
        /// Parser message.
        message: String,
    },

    /// Registry, configuration or query failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] modmap_core::Error),

    /// A discovery provider failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Discovery(#[from] modmap_discovery::Error),
}

impl From<modmap_core::AggregationError> for Error {
    fn from(error: modmap_core::AggregationError) -> Self {
        Self::Core(error.into())
    }
}

impl Error {
    /// Whether the registry has not been written yet.
    #[must_use]
    pub fn is_registry_missing(&self) -> bool {
        matches!(self, Self::Core(core) if core.is_not_found())
    }
}

/// Result type for the modmap facade.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_missing_is_detected_through_wrapper() {
        let err = Error::from(modmap_core::Error::RegistryNotFound {
            path: PathBuf::from(".modmap/registry.json"),
        });
        assert!(err.is_registry_missing());
        assert!(err.to_string().contains(".modmap/registry.json"));

        let other = Error::RootNotFound {
            path: PathBuf::from("/nope"),
        };
        assert!(!other.is_registry_missing());
    }

    #[test]
    fn test_aggregation_error_keeps_its_diagnostic_code() {
        let err = Error::from(modmap_core::AggregationError::DuplicateName {
            name: "util".to_string(),
            first_path: "a/util".to_string(),
            second_path: "b/util".to_string(),
        });
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("modmap::core::duplicate_name"));
    }
}
