//! Dependency graph construction over the registry.

use crate::enrichment::EnrichmentSnapshot;
use crate::model::Module;
use crate::registry::Registry;
use modmap_graph::{ModuleGraph, ModuleNodeData, TreeNode};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

impl ModuleNodeData for &Module {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependency_identifiers()
    }
}

/// Rendered dependency structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DependencyTree {
    /// Exactly one module was included; its name alone.
    Single(String),
    /// One nested tree per usage root.
    Forest(Vec<TreeNode>),
}

/// Result of [`build_graph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResult {
    /// The nested dependency view.
    pub tree: DependencyTree,
    /// Topological layers; layer 0 has no internal dependencies.
    pub layers: Vec<Vec<String>>,
    /// Sorted names of every module on a cycle.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub circular_dependencies: Vec<String>,
    /// Each cycle as its sorted member list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<Vec<String>>,
    /// Aggregators filtered out of the graph, sorted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
}

impl GraphResult {
    /// Whether any cycle was found.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Whether `module` takes part in the graph.
fn is_included(module: &Module, enrichment: &EnrichmentSnapshot, include_aggregators: bool) -> bool {
    include_aggregators
        || !module.packaging_kind.is_aggregator()
        || enrichment.marks_leaf(&module.name)
}

/// Build the module dependency graph.
///
/// Aggregators are left out unless `include_aggregators` is set or the
/// enrichment layer marks them as leaves. Cycles never fail the query; they
/// are reported alongside whatever could be layered.
#[must_use]
pub fn build_graph(
    registry: &Registry,
    enrichment: &EnrichmentSnapshot,
    include_aggregators: bool,
) -> GraphResult {
    let mut graph: ModuleGraph<&Module> = ModuleGraph::new();
    let mut excluded = Vec::new();

    for module in registry.modules() {
        if is_included(module, enrichment, include_aggregators) {
            graph.add_module(&module.name, module);
        } else {
            debug!(module = %module.name, "Excluding aggregator from graph");
            excluded.push(module.name.clone());
        }
    }

    let report = graph.add_dependency_edges();
    for (module, identifier) in &report.external {
        debug!(module = %module, dependency = %identifier, "Dropping external dependency");
    }

    let layering = graph.layers();
    let tree = if graph.module_count() == 1 {
        DependencyTree::Single(graph.module_names().into_iter().next().unwrap_or_default())
    } else {
        DependencyTree::Forest(render_forest(&graph, &layering.cycles))
    };

    GraphResult {
        tree,
        circular_dependencies: layering.circular_dependencies(),
        layers: layering.layers,
        cycles: layering.cycles,
        excluded,
    }
}

/// Trees for every usage root, plus one per cycle that no root reaches.
fn render_forest(graph: &ModuleGraph<&Module>, cycles: &[Vec<String>]) -> Vec<TreeNode> {
    let mut forest = graph.forest();

    let mut reached: BTreeSet<String> = BTreeSet::new();
    for tree in &forest {
        collect_names(tree, &mut reached);
    }

    for cycle in cycles {
        if cycle.iter().any(|name| reached.contains(name)) {
            continue;
        }
        if let Some(entry) = cycle.first()
            && let Ok(tree) = graph.dependency_tree(entry)
        {
            collect_names(&tree, &mut reached);
            forest.push(tree);
        }
    }

    forest
}

fn collect_names(tree: &TreeNode, names: &mut BTreeSet<String>) {
    names.insert(tree.name.clone());
    for child in &tree.dependencies {
        collect_names(child, names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateOptions, aggregate};
    use crate::enrichment::ModuleEnrichment;
    use crate::model::{PackagingKind, RawModuleRecord, TechnologyOrder};
    use crate::registry::{DefaultModule, ProjectInfo};

    fn registry(records: Vec<RawModuleRecord>) -> Registry {
        let order = TechnologyOrder::default();
        let modules = aggregate(
            records,
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

    fn app_and_lib() -> Registry {
        registry(vec![
            RawModuleRecord::new("app", "maven", "app", PackagingKind::Aggregator)
                .with_dependency("lib", "compile"),
            RawModuleRecord::new("lib", "maven", "lib", PackagingKind::Library),
        ])
    }

    #[test]
    fn test_aggregators_are_excluded_by_default() {
        let result = build_graph(&app_and_lib(), &EnrichmentSnapshot::default(), false);

        assert_eq!(result.tree, DependencyTree::Single("lib".to_string()));
        assert_eq!(result.excluded, vec!["app"]);
        assert_eq!(result.layers, vec![vec!["lib".to_string()]]);
    }

    #[test]
    fn test_include_aggregators_nests_dependencies() {
        let result = build_graph(&app_and_lib(), &EnrichmentSnapshot::default(), true);

        let DependencyTree::Forest(forest) = &result.tree else {
            panic!("expected a forest, got {:?}", result.tree);
        };
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "app");
        assert_eq!(forest[0].dependencies, vec![TreeNode::leaf("lib")]);
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn test_enrichment_keeps_leaf_aggregators() {
        let enrichment = EnrichmentSnapshot::from_entries([(
            "app".to_string(),
            ModuleEnrichment {
                classification: Some("distribution".to_string()),
                ..ModuleEnrichment::default()
            },
        )]);

        let result = build_graph(&app_and_lib(), &enrichment, false);
        assert!(result.excluded.is_empty());
        assert_eq!(
            result.layers,
            vec![vec!["lib".to_string()], vec!["app".to_string()]]
        );
    }

    #[test]
    fn test_external_and_duplicate_dependencies() {
        let result = build_graph(
            &registry(vec![
                RawModuleRecord::new("api", "cargo", "api", PackagingKind::Executable)
                    .with_dependency("model", "compile")
                    .with_dependency("model", "test")
                    .with_dependency("serde", "compile")
                    .with_dependency("api", "compile"),
                RawModuleRecord::new("model", "cargo", "model", PackagingKind::Library),
            ]),
            &EnrichmentSnapshot::default(),
            false,
        );

        assert_eq!(
            result.tree,
            DependencyTree::Forest(vec![TreeNode {
                name: "api".to_string(),
                dependencies: vec![TreeNode::leaf("model")],
            }])
        );
        assert!(!result.has_cycles());
    }

    #[test]
    fn test_cycle_is_reported_not_fatal() {
        let result = build_graph(
            &registry(vec![
                RawModuleRecord::new("a", "cargo", "a", PackagingKind::Library)
                    .with_dependency("b", "compile"),
                RawModuleRecord::new("b", "cargo", "b", PackagingKind::Library)
                    .with_dependency("a", "compile"),
                RawModuleRecord::new("c", "cargo", "c", PackagingKind::Library),
            ]),
            &EnrichmentSnapshot::default(),
            false,
        );

        assert_eq!(result.circular_dependencies, vec!["a", "b"]);
        assert_eq!(result.cycles, vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(result.layers, vec![vec!["c".to_string()]]);

        let DependencyTree::Forest(forest) = &result.tree else {
            panic!("expected a forest");
        };
        let names: Vec<&str> = forest.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
        assert_eq!(forest[1].dependencies, vec![TreeNode::leaf("b")]);
    }

    #[test]
    fn test_empty_registry_yields_empty_forest() {
        let result = build_graph(&registry(vec![]), &EnrichmentSnapshot::default(), false);
        assert_eq!(result.tree, DependencyTree::Forest(Vec::new()));
        assert!(result.layers.is_empty());
    }
}
