use crate::error::{Error, Result};
use crate::model::{Module, PackagingKind, Technology};
use crate::registry::Registry;
use glob::Pattern;

/// Conjunctive filter for [`list`]. The default filter matches every module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only modules built with this technology.
    pub technology: Option<Technology>,
    /// Only modules with this packaging kind.
    pub packaging: Option<PackagingKind>,
    /// Glob over module names, e.g. `service-*`.
    pub pattern: Option<String>,
    /// Only virtual (hybrid sibling) modules.
    pub virtual_only: bool,
}

impl ListFilter {
    /// Restrict to a technology.
    #[must_use]
    pub fn technology(mut self, technology: impl Into<Technology>) -> Self {
        self.technology = Some(technology.into());
        self
    }

    /// Restrict to a packaging kind.
    #[must_use]
    pub fn packaging(mut self, packaging: PackagingKind) -> Self {
        self.packaging = Some(packaging);
        self
    }

    /// Restrict to names matching a glob.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Restrict to virtual modules.
    #[must_use]
    pub fn virtual_only(mut self) -> Self {
        self.virtual_only = true;
        self
    }
}

/// Names of modules matching `filter`, sorted.
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] if the name pattern is not a valid glob.
pub fn list(registry: &Registry, filter: &ListFilter) -> Result<Vec<String>> {
    let pattern = filter
        .pattern
        .as_deref()
        .map(|raw| {
            Pattern::new(raw).map_err(|source| Error::InvalidPattern {
                pattern: raw.to_string(),
                source,
            })
        })
        .transpose()?;

    let matches = |module: &Module| {
        filter
            .technology
            .as_ref()
            .is_none_or(|tech| module.build_technologies.contains(tech))
            && filter
                .packaging
                .as_ref()
                .is_none_or(|kind| &module.packaging_kind == kind)
            && pattern.as_ref().is_none_or(|p| p.matches(&module.name))
            && (!filter.virtual_only || module.is_virtual())
    };

    Ok(registry
        .modules()
        .filter(|module| matches(module))
        .map(|module| module.name.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateOptions, aggregate};
    use crate::model::{RawModuleRecord, TechnologyOrder};
    use crate::registry::{DefaultModule, ProjectInfo};

    fn registry() -> Registry {
        let order = TechnologyOrder::default();
        let modules = aggregate(
            vec![
                RawModuleRecord::new(".", "maven", "parent", PackagingKind::Aggregator),
                RawModuleRecord::new("service-a", "maven", "service-a", PackagingKind::Executable),
                RawModuleRecord::new("service-b", "npm", "service-b", PackagingKind::Executable),
                RawModuleRecord::new("ui", "maven", "ui", PackagingKind::Library),
                RawModuleRecord::new("ui", "npm", "ui", PackagingKind::Library),
            ],
            &AggregateOptions {
                order: &order,
                project_name: "acme",
            },
        )
        .unwrap();
        Registry::from_modules(
            ProjectInfo {
                name: "acme".to_string(),
            },
            order,
            DefaultModule::default(),
            modules,
        )
        .unwrap()
    }

    #[test]
    fn test_no_filter_lists_everything_sorted() {
        let names = list(&registry(), &ListFilter::default()).unwrap();
        assert_eq!(
            names,
            vec!["parent", "service-a", "service-b", "ui-maven", "ui-npm"]
        );
    }

    #[test]
    fn test_filters_combine() {
        let registry = registry();

        assert_eq!(
            list(&registry, &ListFilter::default().technology("npm")).unwrap(),
            vec!["service-b", "ui-npm"]
        );
        assert_eq!(
            list(
                &registry,
                &ListFilter::default()
                    .pattern("service-*")
                    .packaging(PackagingKind::Executable)
                    .technology("maven")
            )
            .unwrap(),
            vec!["service-a"]
        );
        assert_eq!(
            list(&registry, &ListFilter::default().virtual_only()).unwrap(),
            vec!["ui-maven", "ui-npm"]
        );
        assert!(
            list(&registry, &ListFilter::default().pattern("nothing*"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let result = list(&registry(), &ListFilter::default().pattern("[oops"));
        assert!(matches!(result, Err(Error::InvalidPattern { pattern, .. }) if pattern == "[oops"));
    }
}
