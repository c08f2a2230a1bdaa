//! The discovery provider interface and the compile-time provider set.

use crate::discovery::{CargoProvider, NpmProvider};
use crate::error::{Error, Result};
use modmap_core::{RawModuleRecord, Technology};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Reports the modules one build technology sees under a project root.
///
/// Providers only describe; they never decide naming across technologies.
/// That is the aggregator's job.
///
/// # Example
///
/// ```rust,ignore
/// use modmap_discovery::DiscoveryProvider;
///
/// struct GoProvider;
///
/// impl DiscoveryProvider for GoProvider {
///     fn technology(&self) -> Technology { Technology::new(Technology::GO) }
///     fn detect(&self, root: &Path) -> bool { root.join("go.work").exists() }
///     fn discover(&self, root: &Path) -> Result<Vec<RawModuleRecord>> { todo!() }
///     fn default_commands(&self) -> BTreeMap<String, String> { BTreeMap::new() }
/// }
/// ```
pub trait DiscoveryProvider: Send + Sync {
    /// Technology tag stamped on every record this provider returns.
    fn technology(&self) -> Technology;

    /// Whether the technology is present at `root`.
    fn detect(&self, root: &Path) -> bool;

    /// Raw records for every module found under `root`, paths relative to `root`.
    ///
    /// Member manifests that cannot be parsed are skipped; a broken root
    /// manifest or an I/O failure is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the root manifest is missing or invalid, or if the
    /// filesystem cannot be read.
    fn discover(&self, root: &Path) -> Result<Vec<RawModuleRecord>>;

    /// Project-wide fallback commands, keyed by canonical command name.
    fn default_commands(&self) -> BTreeMap<String, String>;
}

/// Records and fallback commands gathered from every detected provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOutput {
    /// Raw records in provider order.
    pub records: Vec<RawModuleRecord>,
    /// Default commands of each detected technology.
    pub defaults: Vec<(Technology, BTreeMap<String, String>)>,
}

/// The set of providers a discovery run consults.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn DiscoveryProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.technology()))
            .finish()
    }
}

impl ProviderRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Every built-in provider.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_provider(CargoProvider)
            .with_provider(NpmProvider)
    }

    /// Add a provider, replacing any existing one for the same technology.
    #[must_use]
    pub fn with_provider(mut self, provider: impl DiscoveryProvider + 'static) -> Self {
        let technology = provider.technology();
        self.providers.retain(|p| p.technology() != technology);
        self.providers.push(Box::new(provider));
        self
    }

    /// Keep only the providers for `enabled`; an empty list keeps all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTechnology`] if a tag has no provider.
    pub fn retain_enabled(mut self, enabled: &[Technology]) -> Result<Self> {
        if enabled.is_empty() {
            return Ok(self);
        }

        if let Some(missing) = enabled.iter().find(|tech| self.get(tech).is_none()) {
            return Err(Error::UnknownTechnology {
                technology: missing.to_string(),
                available: self.technologies().iter().map(ToString::to_string).collect(),
            });
        }

        self.providers
            .retain(|p| enabled.contains(&p.technology()));
        Ok(self)
    }

    /// Provider for `technology`, if registered.
    #[must_use]
    pub fn get(&self, technology: &Technology) -> Option<&dyn DiscoveryProvider> {
        self.providers
            .iter()
            .find(|p| &p.technology() == technology)
            .map(|p| p.as_ref())
    }

    /// Registered technology tags, sorted.
    #[must_use]
    pub fn technologies(&self) -> Vec<Technology> {
        let mut techs: Vec<Technology> = self.providers.iter().map(|p| p.technology()).collect();
        techs.sort();
        techs
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run every provider that detects its technology at `root`.
    ///
    /// # Errors
    ///
    /// Fails on the first provider error; no partial output is returned.
    pub fn discover_all(&self, root: &Path) -> Result<DiscoveryOutput> {
        let mut output = DiscoveryOutput::default();

        for provider in &self.providers {
            let technology = provider.technology();
            if !provider.detect(root) {
                debug!(%technology, root = %root.display(), "Technology not detected");
                continue;
            }

            let records = provider.discover(root)?;
            info!(%technology, modules = records.len(), "Discovered modules");
            output.records.extend(records);
            output
                .defaults
                .push((technology, provider.default_commands()));
        }

        Ok(output)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmap_core::PackagingKind;
    use tempfile::TempDir;

    struct FixedProvider {
        tag: &'static str,
        present: bool,
    }

    impl DiscoveryProvider for FixedProvider {
        fn technology(&self) -> Technology {
            Technology::new(self.tag)
        }

        fn detect(&self, _root: &Path) -> bool {
            self.present
        }

        fn discover(&self, _root: &Path) -> Result<Vec<RawModuleRecord>> {
            Ok(vec![RawModuleRecord::new(
                ".",
                self.tag,
                "fixed",
                PackagingKind::Library,
            )])
        }

        fn default_commands(&self) -> BTreeMap<String, String> {
            BTreeMap::from([("build".to_string(), format!("{} build", self.tag))])
        }
    }

    #[test]
    fn test_builtin_providers() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(
            registry.technologies(),
            vec![Technology::new("cargo"), Technology::new("npm")]
        );
        assert!(registry.get(&Technology::new("cargo")).is_some());
        assert!(registry.get(&Technology::new("maven")).is_none());
    }

    #[test]
    fn test_retain_enabled_filters_and_validates() {
        let registry = ProviderRegistry::builtin()
            .retain_enabled(&[Technology::new("npm")])
            .unwrap();
        assert_eq!(registry.technologies(), vec![Technology::new("npm")]);

        let err = ProviderRegistry::builtin()
            .retain_enabled(&[Technology::new("bazel")])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTechnology { technology, .. } if technology == "bazel"));

        assert_eq!(ProviderRegistry::builtin().retain_enabled(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_discover_all_skips_undetected_providers() {
        let temp = TempDir::new().unwrap();
        let registry = ProviderRegistry::new()
            .with_provider(FixedProvider {
                tag: "maven",
                present: true,
            })
            .with_provider(FixedProvider {
                tag: "gradle",
                present: false,
            });

        let output = registry.discover_all(temp.path()).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].technology, Technology::new("maven"));
        assert_eq!(output.defaults.len(), 1);
        assert_eq!(output.defaults[0].1["build"], "maven build");
    }

    #[test]
    fn test_with_provider_replaces_same_technology() {
        let registry = ProviderRegistry::new()
            .with_provider(FixedProvider {
                tag: "maven",
                present: false,
            })
            .with_provider(FixedProvider {
                tag: "maven",
                present: true,
            });

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&Technology::new("maven")).unwrap().detect(Path::new(".")));
    }
}
