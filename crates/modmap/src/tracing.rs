//! Tracing configuration for modmap.
//!
//! Library code only emits events; embedding applications decide whether and
//! how they are rendered by calling [`init_tracing`] once at startup.

use crate::error::{Error, Result};
use std::io;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format
    Json,
}

impl std::str::FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown tracing format: {s}")),
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format.
    pub format: TracingFormat,
    /// Level applied to the modmap crates when no filter is given.
    pub level: Level,
    /// Explicit filter directive; overrides `RUST_LOG` and `level`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Pretty,
            level: Level::WARN,
            filter: None,
        }
    }
}

/// Build the filter for `config`: the explicit filter, else `RUST_LOG`, else
/// `level` for every modmap crate.
fn env_filter(config: &TracingConfig) -> Result<EnvFilter> {
    let filter = if let Some(filter) = &config.filter {
        EnvFilter::try_new(filter)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| {
            let level = config.level.as_str().to_ascii_lowercase();
            EnvFilter::try_new(format!(
                "modmap={level},modmap_core={level},modmap_discovery={level},modmap_graph={level}"
            ))
        })
    };
    filter.map_err(|e| Error::TracingFilter {
        message: e.to_string(),
    })
}

/// Initialize tracing with the given configuration.
///
/// Returns `Ok(false)` when a global subscriber was already installed, in
/// which case the existing one stays in place.
///
/// # Errors
///
/// Returns [`Error::TracingFilter`] if the filter directive is invalid.
pub fn init_tracing(config: &TracingConfig) -> Result<bool> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let installed = match config.format {
        TracingFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true);
            registry.with(layer).try_init().is_ok()
        }
        TracingFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false);
            registry.with(layer).try_init().is_ok()
        }
        TracingFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(layer).try_init().is_ok()
        }
    };

    if installed {
        tracing::debug!(
            version = env!("CARGO_PKG_VERSION"),
            format = ?config.format,
            "Tracing initialized"
        );
    }
    Ok(installed)
}
