//! Error types for discovery operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering modules.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A provider was asked to discover a root it does not recognise.
    #[error("Manifest file not found at path: {}", path.display())]
    #[diagnostic(
        code(modmap::discovery::manifest_not_found),
        help(
            "Ensure the manifest file exists at the expected location (e.g., 'package.json', 'Cargo.toml')"
        )
    )]
    ManifestNotFound {
        /// The path where the manifest was expected.
        path: PathBuf,
    },

    /// The root manifest is structurally valid but unusable.
    #[error("Invalid manifest at {}: {message}", path.display())]
    #[diagnostic(
        code(modmap::discovery::invalid_manifest),
        help("Check the build descriptor for missing required fields")
    )]
    InvalidManifest {
        /// Path to the manifest.
        path: PathBuf,
        /// Description of what is invalid.
        message: String,
    },

    /// A configured technology has no built-in provider.
    #[error("No discovery provider for technology '{technology}'")]
    #[diagnostic(
        code(modmap::discovery::unknown_technology),
        help("Built-in providers: {}", available.join(", "))
    )]
    UnknownTechnology {
        /// The requested technology tag.
        technology: String,
        /// Tags with a registered provider.
        available: Vec<String>,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(modmap::discovery::io_error),
        help(
            "Check that the referenced paths exist and that you have permission to read or write them"
        )
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

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(modmap::discovery::json_error),
        help("Ensure the JSON has valid syntax and matches the expected manifest schema")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// TOML parsing error.
    #[error("TOML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(modmap::discovery::toml_error),
        help("Ensure the TOML has valid syntax and matches the expected schema for Cargo manifests")
    )]
    Toml {
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Whether the error comes from an unparseable manifest rather than I/O.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Json { .. } | Self::Toml { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_not_found_error() {
        let error = Error::ManifestNotFound {
            path: PathBuf::from("/workspace/Cargo.toml"),
        };

        let message = error.to_string();
        assert!(message.contains("Manifest file not found"));
        assert!(message.contains("Cargo.toml"));
    }

    #[test]
    fn test_unknown_technology_lists_providers() {
        let error = Error::UnknownTechnology {
            technology: "bazel".to_string(),
            available: vec!["cargo".to_string(), "npm".to_string()],
        };

        assert!(error.to_string().contains("bazel"));
        let help = error.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("cargo, npm"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io_error.into();

        assert!(matches!(error, Error::Io { path: None, .. }));
        assert!(!error.is_parse_error());
    }

    #[test]
    fn test_parse_errors_are_classified() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::Json {
            source,
            path: Some(PathBuf::from("package.json")),
        };

        assert!(error.is_parse_error());
        assert!(error.to_string().contains("package.json"));
    }
}
