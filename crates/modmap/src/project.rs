//! The [`Project`] facade: discovery, persistence and queries for one root.

use crate::error::{Error, Result};
use modmap_core::query::{self, GraphResult, ListFilter, ModuleView, Resolution};
use modmap_core::{
    AggregateOptions, DefaultModule, EngineConfig, EnrichmentSnapshot, ProjectInfo, Registry,
    RegistryStore, aggregate,
};
use modmap_discovery::{DiscoveryProvider, ProviderRegistry};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, info_span};

/// A project root together with its configuration and discovery providers.
///
/// Every query reads the persisted registry afresh, so a `Project` never
/// holds stale module data.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: EngineConfig,
    providers: ProviderRegistry,
}

impl Project {
    /// Open `root` with its `modmap.toml` and the built-in providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory, the configuration is
    /// invalid, or it enables an unknown technology.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(root).build()
    }

    /// Create a builder for a project rooted at `root`.
    #[must_use]
    pub fn builder(root: impl Into<PathBuf>) -> ProjectBuilder {
        ProjectBuilder::new(root)
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The providers discovery runs with.
    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Store for this project's registry artifact.
    #[must_use]
    pub fn store(&self) -> RegistryStore {
        RegistryStore::new(self.config.registry_path(&self.root))
    }

    /// Run every detected provider, aggregate the records and persist the
    /// resulting registry.
    ///
    /// The registry is rebuilt wholesale. When discovery or aggregation
    /// fails, the previously persisted registry is left untouched.
    ///
    /// # Errors
    ///
    /// Returns provider, aggregation or persistence errors.
    pub fn discover(&self) -> Result<Registry> {
        let span = info_span!("discover", root = %self.root.display());
        let _guard = span.enter();
        let started = Instant::now();

        let output = self.providers.discover_all(&self.root)?;
        let record_count = output.records.len();

        let order = self.config.technology_order();
        let project_name = self.config.project_name_for(&self.root);
        let modules = aggregate(
            output.records,
            &AggregateOptions {
                order: &order,
                project_name: &project_name,
            },
        )?;

        let defaults =
            DefaultModule::from_technology_defaults(output.defaults, &self.config.default_commands);
        let registry = Registry::from_modules(
            ProjectInfo { name: project_name },
            order,
            defaults,
            modules,
        )?;
        self.store().save(&registry)?;

        info!(
            records = record_count,
            modules = registry.len(),
            duration_ms = started.elapsed().as_millis(),
            "Discovery finished"
        );
        Ok(registry)
    }

    /// Load the persisted registry.
    ///
    /// # Errors
    ///
    /// Returns a registry-not-found error before the first discovery run, or
    /// a corruption error if the artifact cannot be parsed.
    pub fn registry(&self) -> Result<Registry> {
        Ok(self.store().load()?)
    }

    /// Load the enrichment snapshot; empty when none has been authored.
    ///
    /// # Errors
    ///
    /// Returns an error if the enrichment file exists but is unreadable.
    pub fn enrichment(&self) -> Result<EnrichmentSnapshot> {
        Ok(EnrichmentSnapshot::load(
            &self.config.enrichment_path(&self.root),
        )?)
    }

    /// Names of the modules matching `filter`, sorted.
    ///
    /// # Errors
    ///
    /// Returns registry load errors or an invalid-pattern error.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<String>> {
        let _guard = info_span!("list").entered();
        let registry = self.registry()?;
        Ok(query::list(&registry, filter)?)
    }

    /// The module dependency graph.
    ///
    /// # Errors
    ///
    /// Returns registry or enrichment load errors. Cycles are reported in the
    /// result, never as an error.
    pub fn graph(&self, include_aggregators: bool) -> Result<GraphResult> {
        let _guard = info_span!("graph", include_aggregators).entered();
        let registry = self.registry()?;
        let enrichment = self.enrichment()?;
        let result = query::build_graph(&registry, &enrichment, include_aggregators);
        debug!(
            layers = result.layers.len(),
            cycles = result.cycles.len(),
            "Graph built"
        );
        Ok(result)
    }

    /// Resolve `command` for `module`, or for the project when `None`.
    ///
    /// # Errors
    ///
    /// Returns registry load errors, or module/command-not-found errors
    /// listing the valid alternatives.
    pub fn resolve(&self, command: &str, module: Option<&str>) -> Result<Resolution> {
        let _guard = info_span!("resolve", command, module = module.unwrap_or("")).entered();
        let registry = self.registry()?;
        Ok(query::resolve(&registry, command, module)?)
    }

    /// A module merged with its enrichment entry.
    ///
    /// # Errors
    ///
    /// Returns load errors or a module-not-found error.
    pub fn describe(&self, name: &str) -> Result<ModuleView> {
        let registry = self.registry()?;
        let enrichment = self.enrichment()?;
        Ok(query::describe(&registry, &enrichment, name)?)
    }
}

/// Builder for a [`Project`] with custom configuration or providers.
///
/// ```ignore
/// let project = Project::builder(".")
///     .with_provider(my_provider::GoProvider)
///     .build()?;
/// ```
pub struct ProjectBuilder {
    root: PathBuf,
    config: Option<EngineConfig>,
    providers: ProviderRegistry,
}

impl ProjectBuilder {
    /// Create a builder with the built-in providers.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: None,
            providers: ProviderRegistry::builtin(),
        }
    }

    /// Use `config` instead of reading `modmap.toml`.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a provider, replacing any provider for the same technology.
    #[must_use]
    pub fn with_provider<P>(mut self, provider: P) -> Self
    where
        P: DiscoveryProvider + 'static,
    {
        self.providers = self.providers.with_provider(provider);
        self
    }

    /// Replace the provider set entirely.
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// Build the [`Project`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] if the root is not a directory, or a
    /// configuration error from `modmap.toml` or its enabled technologies.
    pub fn build(self) -> Result<Project> {
        if !self.root.is_dir() {
            return Err(Error::RootNotFound { path: self.root });
        }

        let config = match self.config {
            Some(config) => config,
            None => EngineConfig::load(&self.root)?,
        };
        let providers = self
            .providers
            .retain_enabled(&config.enabled_technologies())?;
        debug!(
            root = %self.root.display(),
            providers = ?providers.technologies(),
            "Project opened"
        );

        Ok(Project {
            root: self.root,
            config,
            providers,
        })
    }
}
